// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use bmrt_core::MemoryRegion;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_stack_size() -> String {
    "4KB".to_string()
}

/// Highest address a 32-bit part can decode.
const ADDRESS_SPACE_END: u64 = 1 << 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[serde(alias = "cortex-m0", alias = "cortex-m3", alias = "cortex-m4", alias = "cortex-m7")]
    Arm,
    #[serde(alias = "riscv32", alias = "rv32i", alias = "rv32imac")]
    RiscV,
}

impl Arch {
    fn output_arch(&self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::RiscV => "riscv",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MemoryRange {
    pub base: u64,
    pub size: String, // e.g. "128KB"
}

impl MemoryRange {
    pub fn size_bytes(&self) -> Result<u64> {
        parse_size(&self.size)
    }
}

/// Memory geometry of one board, as written in `configs/layouts/*.yaml`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    pub arch: Arch,
    pub flash: MemoryRange,
    pub ram: MemoryRange,
    /// Reserved at the top of RAM; the heap may not grow into it.
    #[serde(default = "default_stack_size")]
    pub stack_size: String,
    /// Minimum heap the linked image must leave free. Checked at link time.
    #[serde(default)]
    pub heap_size: Option<String>,
}

/// Resolved addresses derived from a [`LayoutManifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryMap {
    pub flash: MemoryRegion,
    pub ram: MemoryRegion,
    /// `[__HeapLimit, _estack)`
    pub stack: MemoryRegion,
    pub min_heap: Option<u64>,
}

impl MemoryMap {
    pub fn stack_top(&self) -> usize {
        self.stack.end
    }

    pub fn heap_limit(&self) -> usize {
        self.stack.start
    }
}

impl LayoutManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to open layout manifest at {:?}", path.as_ref()))?;
        let manifest = Self::from_yaml(&content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse Layout Manifest YAML")
    }

    pub fn validate(&self) -> Result<()> {
        self.memory_map().map(|_| ())
    }

    /// Checks the geometry and resolves it into addresses.
    pub fn memory_map(&self) -> Result<MemoryMap> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        let flash = resolve_range("flash", &self.flash)?;
        let ram = resolve_range("ram", &self.ram)?;
        if flash.overlaps(&ram) {
            anyhow::bail!("Memory 'flash' ({}) overlaps 'ram' ({})", flash, ram);
        }

        let stack_size = parse_size(&self.stack_size)
            .with_context(|| format!("Invalid stack_size '{}'", self.stack_size))?;
        if stack_size % 8 != 0 {
            anyhow::bail!("stack_size must be a multiple of 8 bytes, got {}", stack_size);
        }
        if stack_size >= ram.len() as u64 {
            anyhow::bail!(
                "stack_size ({} bytes) leaves no RAM for data ({} bytes of RAM)",
                stack_size,
                ram.len()
            );
        }

        let min_heap = match &self.heap_size {
            Some(size) => {
                let bytes =
                    parse_size(size).with_context(|| format!("Invalid heap_size '{}'", size))?;
                if stack_size + bytes > ram.len() as u64 {
                    anyhow::bail!(
                        "heap_size ({} bytes) plus stack_size ({} bytes) exceed RAM ({} bytes)",
                        bytes,
                        stack_size,
                        ram.len()
                    );
                }
                Some(bytes)
            }
            None => None,
        };

        let heap_limit = ram.end - stack_size as usize;
        Ok(MemoryMap {
            flash,
            ram,
            stack: MemoryRegion::new(heap_limit, ram.end),
            min_heap,
        })
    }

    /// GNU ld script defining the symbols `bmrt_core::LinkLayout` reads.
    pub fn render_linker_script(&self) -> Result<String> {
        let map = self.memory_map()?;
        let mut out = String::new();

        // Writing to a String cannot fail.
        let _ = writeln!(out, "/* Generated by bmrt for layout '{}'. */", self.name);
        let _ = writeln!(out, "OUTPUT_ARCH({})", self.arch.output_arch());
        let _ = writeln!(out, "ENTRY(Reset)");
        let _ = writeln!(out);
        let _ = writeln!(out, "MEMORY");
        let _ = writeln!(out, "{{");
        let _ = writeln!(
            out,
            "  FLASH (rx)  : ORIGIN = {:#010x}, LENGTH = {:#010x}",
            map.flash.start,
            map.flash.len()
        );
        let _ = writeln!(
            out,
            "  RAM   (rwx) : ORIGIN = {:#010x}, LENGTH = {:#010x}",
            map.ram.start,
            map.ram.len()
        );
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);
        let _ = writeln!(out, "_estack = {:#010x};", map.stack_top());
        let _ = writeln!(out, "__HeapLimit = {:#010x};", map.heap_limit());
        let _ = writeln!(out);
        let _ = writeln!(out, "SECTIONS");
        let _ = writeln!(out, "{{");
        let _ = writeln!(out, "  .text :");
        let _ = writeln!(out, "  {{");
        let _ = writeln!(out, "    _sfixed = .;");
        if self.arch == Arch::Arm {
            // Word 0 of the Cortex-M vector table: initial stack pointer.
            let _ = writeln!(out, "    LONG(_estack)");
        }
        let _ = writeln!(out, "    KEEP(*(.vectors .vectors.*))");
        let _ = writeln!(out, "    *(.text .text.*)");
        let _ = writeln!(out, "    *(.rodata .rodata.*)");
        let _ = writeln!(out, "    . = ALIGN(4);");
        let _ = writeln!(out, "    PROVIDE_HIDDEN(__init_array_start = .);");
        let _ = writeln!(out, "    KEEP(*(SORT(.init_array.*)))");
        let _ = writeln!(out, "    KEEP(*(.init_array))");
        let _ = writeln!(out, "    PROVIDE_HIDDEN(__init_array_end = .);");
        let _ = writeln!(out, "    . = ALIGN(4);");
        let _ = writeln!(out, "  }} > FLASH");
        if self.arch == Arch::Arm {
            let _ = writeln!(out);
            let _ = writeln!(out, "  .ARM.exidx :");
            let _ = writeln!(out, "  {{");
            let _ = writeln!(out, "    *(.ARM.exidx* .gnu.linkonce.armexidx.*)");
            let _ = writeln!(out, "    . = ALIGN(4);");
            let _ = writeln!(out, "  }} > FLASH");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "  __etext = .;");
        let _ = writeln!(out);
        let _ = writeln!(out, "  .data : AT (__etext)");
        let _ = writeln!(out, "  {{");
        let _ = writeln!(out, "    __data_start__ = .;");
        let _ = writeln!(out, "    *(.data .data.*)");
        let _ = writeln!(out, "    . = ALIGN(4);");
        let _ = writeln!(out, "    __data_end__ = .;");
        let _ = writeln!(out, "  }} > RAM");
        let _ = writeln!(out);
        let _ = writeln!(out, "  .bss (NOLOAD) :");
        let _ = writeln!(out, "  {{");
        let _ = writeln!(out, "    __bss_start__ = .;");
        let _ = writeln!(out, "    *(.bss .bss.*)");
        let _ = writeln!(out, "    *(COMMON)");
        let _ = writeln!(out, "    . = ALIGN(4);");
        let _ = writeln!(out, "    __bss_end__ = .;");
        let _ = writeln!(out, "  }} > RAM");
        let _ = writeln!(out);
        let _ = writeln!(out, "  . = ALIGN(8);");
        let _ = writeln!(out, "  __end__ = .;");
        let _ = writeln!(out, "  PROVIDE(end = __end__);");
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "ASSERT(__etext + SIZEOF(.data) <= ORIGIN(FLASH) + LENGTH(FLASH), \"code and initialised data do not fit in flash\")"
        );
        let _ = writeln!(
            out,
            "ASSERT(__end__ <= __HeapLimit, \"static data runs into the stack reservation\")"
        );
        if let Some(min_heap) = map.min_heap {
            let _ = writeln!(
                out,
                "ASSERT(__HeapLimit - __end__ >= {:#x}, \"less than the configured heap_size is left for the heap\")",
                min_heap
            );
        }

        tracing::debug!(
            "Rendered linker script for '{}': heap limit {:#x}, stack top {:#x}",
            self.name,
            map.heap_limit(),
            map.stack_top()
        );
        Ok(out)
    }
}

fn resolve_range(name: &str, range: &MemoryRange) -> Result<MemoryRegion> {
    let size = range
        .size_bytes()
        .with_context(|| format!("Invalid size for memory '{}'", name))?;
    if size == 0 {
        anyhow::bail!("Memory '{}' has zero size", name);
    }
    if range.base % 4 != 0 {
        anyhow::bail!("Memory '{}' base {:#x} is not word-aligned", name, range.base);
    }
    let end = range.base + size;
    if end > ADDRESS_SPACE_END {
        anyhow::bail!(
            "Memory '{}' ({:#x} + {:#x}) extends past the 32-bit address space",
            name,
            range.base,
            size
        );
    }
    Ok(MemoryRegion::new(range.base as usize, end as usize))
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
