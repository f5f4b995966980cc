// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use object::write::{Object as ElfWriter, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn bmrt(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bmrt"))
        .args(args)
        .output()
        .expect("Failed to execute bmrt")
}

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bmrt-cli-{}-{}", test, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn due_layout_yaml() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/layouts/arduino-due.yaml")
}

fn write_elf(path: &Path, symbols: &[(&str, u64)]) {
    let mut obj = ElfWriter::new(BinaryFormat::Elf, Architecture::Arm, Endianness::Little);
    for (name, value) in symbols {
        obj.add_symbol(Symbol {
            name: name.as_bytes().to_vec(),
            value: *value,
            size: 0,
            kind: SymbolKind::Data,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Absolute,
            flags: SymbolFlags::None,
        });
    }
    std::fs::write(path, obj.write().unwrap()).unwrap();
}

fn due_symbols(data_load: u64) -> Vec<(&'static str, u64)> {
    vec![
        ("_sfixed", 0x0008_0000),
        ("__etext", data_load),
        ("__data_start__", 0x2007_0000),
        ("__data_end__", 0x2007_0040),
        ("__bss_start__", 0x2007_0040),
        ("__bss_end__", 0x2007_0100),
        ("__end__", 0x2007_0100),
        ("__HeapLimit", 0x2008_6000),
        ("_sbrk", 0x0008_0400),
        ("_exit", 0x0008_0480),
    ]
}

#[test]
fn test_linker_script_to_stdout() {
    let output = bmrt(&["linker-script", "--layout", due_layout_yaml().to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("_estack = 0x20088000;"), "{}", stdout);
    assert!(stdout.contains("__HeapLimit = 0x20086000;"));
    assert!(stdout.contains(".data : AT (__etext)"));
}

#[test]
fn test_linker_script_to_file() {
    let dir = scratch_dir("ldscript");
    let out = dir.join("link.x");
    let output = bmrt(&[
        "linker-script",
        "--layout",
        due_layout_yaml().to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let script = std::fs::read_to_string(&out).unwrap();
    assert!(script.contains("ASSERT(__end__ <= __HeapLimit"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_linker_script_missing_layout_is_config_error() {
    let output = bmrt(&["linker-script", "--layout", "/nonexistent/layout.yaml"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_check_valid_firmware() {
    let dir = scratch_dir("check-ok");
    let elf = dir.join("firmware.elf");
    write_elf(&elf, &due_symbols(0x0008_1200));

    let output = bmrt(&["check", "--firmware", elf.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Layout: OK"), "{}", stdout);
    assert!(stdout.contains("Code size: 0x1200, initialised data size: 0x40, BSS size: 0xC0."));
    assert!(stdout.contains("Stubs: _sbrk, _exit"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_check_json_report() {
    let dir = scratch_dir("check-json");
    let elf = dir.join("firmware.elf");
    write_elf(&elf, &due_symbols(0x0008_1200));

    let output = bmrt(&["check", "--firmware", elf.to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(stdout.trim()).expect("Failed to parse JSON");
    assert_eq!(json["valid"], true);
    assert_eq!(json["sizes"]["code"], 0x1200);
    assert_eq!(json["heap_bytes"], 0x2008_6000u64 - 0x2007_0100);
    assert_eq!(json["stubs"][0], "_sbrk");
    assert!(json.get("error").is_none());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_check_invalid_layout_exits_one() {
    let dir = scratch_dir("check-bad");
    let elf = dir.join("firmware.elf");
    // Data stored at its own run address.
    write_elf(&elf, &due_symbols(0x2007_0000));

    let output = bmrt(&["check", "--firmware", elf.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Layout: INVALID"), "{}", stdout);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_check_missing_firmware_is_config_error() {
    let output = bmrt(&["check", "--firmware", "/nonexistent/firmware.elf"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_sizes() {
    let dir = scratch_dir("sizes");
    let elf = dir.join("firmware.elf");
    write_elf(&elf, &due_symbols(0x0008_1200));

    let output = bmrt(&["--trace", "sizes", "--firmware", elf.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "Code size: 0x1200, initialised data size: 0x40, BSS size: 0xC0."
    );
    std::fs::remove_dir_all(&dir).ok();
}
