// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::ffi::c_void;

use crate::macros::rt_event;

pub const UNEXPECTED_ATEXIT_MSG: &str = "Unexpected entries in atexit table.";

/// Read-only view of a run-time library's exit/destructor registry.
pub trait FinalizationTable {
    fn is_empty(&self) -> bool;
}

/// For images that link no C library: nothing can register a finalizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFinalizers;

impl FinalizationTable for NoFinalizers {
    fn is_empty(&self) -> bool {
        true
    }
}

/// An atexit list reached through its head pointer. Registering anything
/// allocates the list head, so a non-null head means at least one entry.
///
/// Use this directly when the C library keeps the head somewhere other than
/// `_global_atexit`, e.g. `_GLOBAL_REENT->_atexit` on newlib builds without
/// `_REENT_GLOBAL_ATEXIT`.
#[derive(Debug, Clone, Copy)]
pub struct AtexitListHead {
    head: *const *const c_void,
}

impl AtexitListHead {
    /// # Safety
    ///
    /// `head` must stay valid for reads for as long as the value is used.
    pub const unsafe fn new(head: *const *const c_void) -> Self {
        Self { head }
    }
}

impl FinalizationTable for AtexitListHead {
    fn is_empty(&self) -> bool {
        unsafe { self.head.read_volatile().is_null() }
    }
}

/// newlib's global atexit list, read through the `_global_atexit` symbol.
///
/// newlib only defines that symbol when built with `_REENT_GLOBAL_ATEXIT`.
/// Other configurations fail to link against this type; build an
/// [`AtexitListHead`] over `_GLOBAL_REENT->_atexit` instead.
#[cfg(all(target_os = "none", feature = "newlib"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct NewlibAtexitTable;

#[cfg(all(target_os = "none", feature = "newlib"))]
impl FinalizationTable for NewlibAtexitTable {
    fn is_empty(&self) -> bool {
        extern "C" {
            static _global_atexit: *const c_void;
        }
        unsafe { AtexitListHead::new(core::ptr::addr_of!(_global_atexit)).is_empty() }
    }
}

/// Halts if anything registered a finalizer.
///
/// Run once after board bring-up, before the application starts, to catch
/// static initialisers that registered destructors; and again if the
/// application ever returns, to catch function-local statics constructed
/// along the way.
pub fn check_finalization_table_empty(table: &dyn FinalizationTable) {
    if !table.is_empty() {
        crate::panic::panic(UNEXPECTED_ATEXIT_MSG);
    }
    rt_event!(info, "Finalization table is empty");
}
