// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::alloc::{GlobalAlloc, Layout};

use crate::heap::grow_heap;

/// `GlobalAlloc` for pure-Rust images, built directly on [`grow_heap`].
///
/// Every allocation bumps the heap end; `dealloc` is a no-op. Suited to
/// firmware that allocates its long-lived structures during start-up and
/// then runs without further allocation.
///
/// ```ignore
/// #[global_allocator]
/// static HEAP: bmrt_core::HeapGrowthAllocator = bmrt_core::HeapGrowthAllocator;
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapGrowthAllocator;

unsafe impl GlobalAlloc for HeapGrowthAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let end = grow_heap(0) as usize;
        let padding = end.wrapping_neg() & (layout.align() - 1);

        let Some(total) = padding.checked_add(layout.size()) else {
            return core::ptr::null_mut();
        };
        if total > isize::MAX as usize {
            return core::ptr::null_mut();
        }

        let base = grow_heap(total as isize) as usize;
        (base + padding) as *mut u8
    }

    unsafe fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {}
}
