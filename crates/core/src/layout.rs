// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::fmt;

pub const WORD_SIZE: usize = core::mem::size_of::<u32>();

/// A half-open address range `[start, end)` fixed at link time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryRegion {
    pub start: usize,
    pub end: usize,
}

impl MemoryRegion {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes. An inverted region counts as empty.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn word_count(&self) -> usize {
        self.len() / WORD_SIZE
    }

    pub const fn contains(&self, addr: usize) -> bool {
        addr >= self.start && addr < self.end
    }

    pub const fn overlaps(&self, other: &MemoryRegion) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}..{:#010x}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("region {region} ends before it starts ({start:#x} > {end:#x})")]
    Inverted {
        region: &'static str,
        start: usize,
        end: usize,
    },
    #[error("region {region} is not word-aligned at {addr:#x}")]
    Unaligned { region: &'static str, addr: usize },
    #[error("initialised data is stored at its run address {0:#x}; nothing would be relocated")]
    SameLoadAndRunAddress(usize),
    #[error("stored data image at {load:#x} overlaps the data region {data}")]
    LoadOverlapsData { load: usize, data: MemoryRegion },
    #[error("region {later} starts before region {earlier} ends")]
    Misordered {
        earlier: &'static str,
        later: &'static str,
    },
}

/// The memory map the link step produced.
///
/// Ordering contract: code, then the relocatable data (stored in flash at
/// `data_load`, run from `data`), then zero-initialised data, then the heap
/// up to its hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkLayout {
    pub code: MemoryRegion,
    pub data_load: usize,
    pub data: MemoryRegion,
    pub bss: MemoryRegion,
    pub heap: MemoryRegion,
}

impl LinkLayout {
    /// Reads the boundary symbols the linker script defines.
    #[cfg(target_os = "none")]
    pub fn from_linker_symbols() -> Self {
        extern "C" {
            static _sfixed: u32;
            static __etext: u32;
            static __data_start__: u32;
            static __data_end__: u32;
            static __bss_start__: u32;
            static __bss_end__: u32;
            static __end__: u32;
            static __HeapLimit: u32;
        }

        // Only the addresses are taken; the symbols carry no storage.
        unsafe {
            let etext = core::ptr::addr_of!(__etext) as usize;
            Self {
                code: MemoryRegion::new(core::ptr::addr_of!(_sfixed) as usize, etext),
                data_load: etext,
                data: MemoryRegion::new(
                    core::ptr::addr_of!(__data_start__) as usize,
                    core::ptr::addr_of!(__data_end__) as usize,
                ),
                bss: MemoryRegion::new(
                    core::ptr::addr_of!(__bss_start__) as usize,
                    core::ptr::addr_of!(__bss_end__) as usize,
                ),
                heap: MemoryRegion::new(
                    core::ptr::addr_of!(__end__) as usize,
                    core::ptr::addr_of!(__HeapLimit) as usize,
                ),
            }
        }
    }

    /// Where the stored copy of the initialised data lives.
    pub const fn data_image(&self) -> MemoryRegion {
        MemoryRegion::new(self.data_load, self.data_load + self.data.len())
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let regions = [
            ("code", self.code),
            ("data", self.data),
            ("bss", self.bss),
            ("heap", self.heap),
        ];
        for (name, region) in regions {
            if region.start > region.end {
                return Err(LayoutError::Inverted {
                    region: name,
                    start: region.start,
                    end: region.end,
                });
            }
        }

        let aligned = [
            ("data", self.data.start),
            ("data", self.data.end),
            ("data image", self.data_load),
            ("bss", self.bss.start),
            ("bss", self.bss.end),
        ];
        for (name, addr) in aligned {
            if addr % WORD_SIZE != 0 {
                return Err(LayoutError::Unaligned { region: name, addr });
            }
        }

        if self.data_load == self.data.start {
            return Err(LayoutError::SameLoadAndRunAddress(self.data_load));
        }
        if self.data_image().overlaps(&self.data) {
            return Err(LayoutError::LoadOverlapsData {
                load: self.data_load,
                data: self.data,
            });
        }

        for pair in regions.windows(2) {
            let (earlier, before) = pair[0];
            let (later, after) = pair[1];
            if after.start < before.end {
                return Err(LayoutError::Misordered { earlier, later });
            }
        }

        Ok(())
    }

    pub const fn segment_sizes(&self) -> SegmentSizes {
        SegmentSizes {
            code: self.code.len(),
            initialised_data: self.data.len(),
            bss: self.bss.len(),
        }
    }
}

/// Image footprint as printed on the debug console at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentSizes {
    pub code: usize,
    pub initialised_data: usize,
    pub bss: usize,
}

impl fmt::Display for SegmentSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Code size: 0x{:X}, initialised data size: 0x{:X}, BSS size: 0x{:X}.",
            self.code, self.initialised_data, self.bss
        )
    }
}
