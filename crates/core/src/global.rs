// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::cell::UnsafeCell;

/// Process-wide slot for the run-time's singletons.
///
/// Access is copy-in/copy-out, so no reference into the cell outlives a
/// single `get` or `set`. The firmware has one logical thread of control;
/// an interrupt handler may read a slot but must not write one. Nothing
/// here takes a lock, which keeps every slot reachable from a fault vector.
pub(crate) struct GlobalCell<T: Copy>(UnsafeCell<T>);

// Single logical thread of control (see above).
unsafe impl<T: Copy + Send> Sync for GlobalCell<T> {}

impl<T: Copy> GlobalCell<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    pub(crate) fn get(&self) -> T {
        unsafe { self.0.get().read_volatile() }
    }

    pub(crate) fn set(&self, value: T) {
        unsafe { self.0.get().write_volatile(value) }
    }
}
