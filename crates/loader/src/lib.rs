// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{anyhow, Context, Result};
use bmrt_core::{LinkLayout, MemoryRegion};
use object::{Object, ObjectSymbol};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Boundary symbols every bmrt linker script defines.
pub const LAYOUT_SYMBOLS: [&str; 8] = [
    "_sfixed",
    "__etext",
    "__data_start__",
    "__data_end__",
    "__bss_start__",
    "__bss_end__",
    "__end__",
    "__HeapLimit",
];

/// C library hooks bmrt-core can export, newlib spelling first. `_exit` and
/// the assertion hooks are spelled the same for both libraries; plain `exit`
/// belongs to libc itself.
pub const STUB_SYMBOLS: &[(&str, &str)] = &[
    ("_sbrk", "sbrk"),
    ("_exit", "_exit"),
    ("_kill", "kill"),
    ("_getpid", "getpid"),
    ("_write", "write"),
    ("_read", "read"),
    ("_close", "close"),
    ("_fstat", "fstat"),
    ("_isatty", "isatty"),
    ("_lseek", "lseek"),
    ("__assert_func", "__assert_func"),
    (
        "__assert_func_only_file_and_line",
        "__assert_func_only_file_and_line",
    ),
    (
        "__assert_func_generic_err_msg",
        "__assert_func_generic_err_msg",
    ),
];

pub fn load_link_layout(path: &Path) -> Result<LinkLayout> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    load_link_layout_bytes(&buffer)
}

pub fn load_link_layout_bytes(buffer: &[u8]) -> Result<LinkLayout> {
    let symbols = symbol_map(buffer)?;

    let addr = |name: &str| -> Result<usize> {
        let value = symbols
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Symbol `{}` not found; was the image linked with a bmrt script?", name))?;
        usize::try_from(value).with_context(|| format!("Symbol `{}` at {:#x} is out of range", name, value))
    };

    let etext = addr("__etext")?;
    let layout = LinkLayout {
        code: MemoryRegion::new(addr("_sfixed")?, etext),
        data_load: etext,
        data: MemoryRegion::new(addr("__data_start__")?, addr("__data_end__")?),
        bss: MemoryRegion::new(addr("__bss_start__")?, addr("__bss_end__")?),
        heap: MemoryRegion::new(addr("__end__")?, addr("__HeapLimit")?),
    };

    debug!(
        "Resolved layout: code {}, data {} (stored at {:#x}), bss {}, heap {}",
        layout.code, layout.data, layout.data_load, layout.bss, layout.heap
    );
    Ok(layout)
}

/// Names of the run-time hooks the image defines, in [`STUB_SYMBOLS`] order.
pub fn linked_stubs(buffer: &[u8]) -> Result<Vec<String>> {
    let symbols = symbol_map(buffer)?;
    let mut found = Vec::new();
    for (newlib, posix) in STUB_SYMBOLS {
        if symbols.contains_key(*newlib) {
            found.push(newlib.to_string());
        } else if symbols.contains_key(*posix) {
            found.push(posix.to_string());
        }
    }
    Ok(found)
}

fn symbol_map(buffer: &[u8]) -> Result<HashMap<String, u64>> {
    let file = object::File::parse(buffer).context("Failed to parse ELF binary")?;
    info!("ELF architecture: {:?}", file.architecture());

    let mut symbol_map = HashMap::new();
    for sym in file.symbols() {
        if sym.is_undefined() {
            continue;
        }
        if let Ok(name) = sym.name() {
            if !name.is_empty() {
                symbol_map.insert(name.to_string(), sym.address());
            }
        }
    }
    Ok(symbol_map)
}
