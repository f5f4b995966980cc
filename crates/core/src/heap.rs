// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Monotonic heap growth, the primitive under `malloc` and `GlobalAlloc`.

use crate::global::GlobalCell;
use crate::layout::MemoryRegion;
use crate::macros::{rt_assert, rt_event};

pub const OUT_OF_HEAP_MSG: &str = "Out of heap memory.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    #[error("out of heap memory: requested {requested} bytes, {available} available")]
    Exhausted { requested: usize, available: usize },
}

/// Bump allocator over one region. Memory is never given back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BumpHeap {
    region: MemoryRegion,
    end: usize,
}

impl BumpHeap {
    /// A zero-length heap at the start of `region`.
    pub const fn new(region: MemoryRegion) -> Self {
        Self {
            region,
            end: region.start,
        }
    }

    pub const fn region(&self) -> MemoryRegion {
        self.region
    }

    /// Current end of the heap: the base of the next block handed out.
    pub const fn end(&self) -> usize {
        self.end
    }

    pub const fn available(&self) -> usize {
        self.region.end.saturating_sub(self.end)
    }

    /// Moves the end forward by `delta` bytes and returns the previous end.
    /// On failure nothing changes.
    pub fn grow(&mut self, delta: usize) -> Result<usize, HeapError> {
        let previous = self.end;
        match previous.checked_add(delta) {
            Some(new_end) if new_end <= self.region.end => {
                self.end = new_end;
                Ok(previous)
            }
            _ => Err(HeapError::Exhausted {
                requested: delta,
                available: self.available(),
            }),
        }
    }

    pub const fn stats(&self) -> HeapStats {
        HeapStats {
            base: self.region.start,
            end: self.end,
            limit: self.region.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub base: usize,
    pub end: usize,
    pub limit: usize,
}

impl HeapStats {
    pub const fn used(&self) -> usize {
        self.end - self.base
    }
}

/// The process-wide heap. `None` until the first growth request or until
/// [`configure_heap`] runs.
static HEAP: GlobalCell<Option<BumpHeap>> = GlobalCell::new(None);

/// Resets the process-wide heap to an empty heap at the start of `region`.
pub fn configure_heap(region: MemoryRegion) {
    rt_event!(debug, "Heap configured at {}", region);
    HEAP.set(Some(BumpHeap::new(region)));
}

pub fn heap_stats() -> Option<HeapStats> {
    HEAP.get().map(|heap| heap.stats())
}

/// Grows the process-wide heap by `delta` bytes and returns the base of the
/// new block. `delta == 0` returns the current end without changing it.
///
/// Running out of heap does not return: it goes to the panic sink with
/// "Out of heap memory.". A negative `delta` fails the run-time assertion;
/// shrinking is not supported.
pub fn grow_heap(delta: isize) -> *mut u8 {
    rt_assert!(delta >= 0);

    let mut heap = match HEAP.get() {
        Some(heap) => heap,
        None => BumpHeap::new(crate::current_layout().heap),
    };

    match heap.grow(delta as usize) {
        Ok(base) => {
            HEAP.set(Some(heap));
            rt_event!(debug, "Heap grown by {} bytes at {:#x}", delta, base);
            base as *mut u8
        }
        Err(_) => crate::panic::panic(OUT_OF_HEAP_MSG),
    }
}
