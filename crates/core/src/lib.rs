// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Run-time support for firmware that boots with no operating system.
//!
//! Boot order: [`initialize`] at reset, board bring-up (which may install a
//! [`PanicReporter`]), then [`start`], which checks the finalization table,
//! runs the application and checks the table again. Anything fatal along the
//! way ends in [`panic()`].
#![cfg_attr(not(feature = "std"), no_std)]

mod global;
mod macros;

pub mod allocator;
pub mod fault;
pub mod fmt;
pub mod guard;
pub mod heap;
pub mod layout;
pub mod panic;
pub mod segments;
pub mod syscalls;

use core::fmt::{Display, Write};

pub use allocator::HeapGrowthAllocator;
pub use fault::hard_fault;
pub use guard::{
    check_finalization_table_empty, AtexitListHead, FinalizationTable, NoFinalizers,
};
pub use heap::{configure_heap, grow_heap, heap_stats, BumpHeap, HeapError, HeapStats};
pub use layout::{LayoutError, LinkLayout, MemoryRegion, SegmentSizes};
pub use panic::{clear_reporter, panic, set_reporter, NoopReporter, PanicReporter};

#[cfg(feature = "std")]
pub use panic::{catch_halt, Halted};

#[cfg(all(target_os = "none", feature = "newlib"))]
pub use guard::NewlibAtexitTable;

use global::GlobalCell;

pub const USER_CODE_RETURNED_MSG: &str = "User code returned.";

/// Room for "Error from user code: " plus the error's own text.
const USER_ERROR_MSG_BUFSIZE: usize = 128;

/// Layout installed by [`initialize_with`].
static LAYOUT: GlobalCell<Option<LinkLayout>> = GlobalCell::new(None);

/// The layout in use: whatever [`initialize_with`] installed, else the
/// linker symbols.
#[cfg(target_os = "none")]
pub fn current_layout() -> LinkLayout {
    LAYOUT.get().unwrap_or_else(LinkLayout::from_linker_symbols)
}

/// The layout in use. Host builds have no linker symbols to fall back on.
#[cfg(not(target_os = "none"))]
pub fn current_layout() -> LinkLayout {
    match LAYOUT.get() {
        Some(layout) => layout,
        None => panic::panic("Link layout not installed."),
    }
}

/// Prepares RAM from the linker-script symbols.
///
/// # Safety
///
/// Call once, first thing at reset, before any static is read. Every static
/// in `.data` and `.bss` is overwritten, including the run-time's own.
#[cfg(target_os = "none")]
pub unsafe fn initialize() {
    let layout = LinkLayout::from_linker_symbols();
    initialize_with(&layout)
}

/// Relocates `.data`, zeroes `.bss`, then installs `layout` and starts the
/// heap at the heap region's start.
///
/// # Safety
///
/// Same contract as [`segments::init_data_segments`].
pub unsafe fn initialize_with(layout: &LinkLayout) {
    segments::init_data_segments(layout);

    // Only now: these statics may live in the regions just written.
    LAYOUT.set(Some(*layout));
    heap::configure_heap(layout.heap);
}

/// The one boundary between the application and the run-time. An error
/// coming back out of `entry` is fatal and goes to the panic sink.
pub fn run_user_code<E, F>(entry: F)
where
    E: Display,
    F: FnOnce() -> Result<(), E>,
{
    if let Err(error) = entry() {
        let mut msg = fmt::FixedBuf::<USER_ERROR_MSG_BUFSIZE>::new();
        let _ = write!(msg, "Error from user code: {}", error);
        panic::panic(msg.as_str());
    }
}

/// Runs the application between the two finalization-table checkpoints.
///
/// The application is not expected to return; if it does, the second check
/// still runs and the core then halts.
pub fn start<E, F>(table: &dyn FinalizationTable, entry: F) -> !
where
    E: Display,
    F: FnOnce() -> Result<(), E>,
{
    guard::check_finalization_table_empty(table);
    run_user_code(entry);
    guard::check_finalization_table_empty(table);
    panic::panic(USER_CODE_RETURNED_MSG)
}
