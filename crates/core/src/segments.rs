// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::layout::LinkLayout;
use crate::macros::{rt_assert, rt_event};

/// Relocates `.data` from its stored image and zero-fills `.bss`.
///
/// Word at a time, with volatile accesses so the loops are not turned into
/// `memcpy`/`memset` calls that might themselves touch uninitialised statics.
///
/// # Safety
///
/// - `layout` must describe real, word-aligned memory: the stored image must
///   be readable and the data and bss regions writable for their full length.
/// - Nothing may read or write a static in those regions while this runs.
pub unsafe fn init_data_segments(layout: &LinkLayout) {
    let mut src = layout.data_load as *const u32;
    let mut dst = layout.data.start as *mut u32;

    // Equal addresses would be normal on a hosted system, never on a flash
    // part: the link script is wrong, and skipping the copy would hide it.
    rt_assert!(src as usize != dst as usize);

    for _ in 0..layout.data.word_count() {
        dst.write_volatile(src.read_volatile());
        src = src.add(1);
        dst = dst.add(1);
    }

    let mut zero = layout.bss.start as *mut u32;
    for _ in 0..layout.bss.word_count() {
        zero.write_volatile(0);
        zero = zero.add(1);
    }

    rt_event!(
        debug,
        "Relocated {} data words from {:#x}, zeroed {} bss words",
        layout.data.word_count(),
        layout.data_load,
        layout.bss.word_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MemoryRegion;
    use crate::panic::{catch_halt, clear_reporter, set_reporter, PanicReporter};
    use serial_test::serial;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    impl PanicReporter for Recorder {
        fn report(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn region_of(words: &mut [u32]) -> MemoryRegion {
        let range = words.as_mut_ptr_range();
        MemoryRegion::new(range.start as usize, range.end as usize)
    }

    #[test]
    fn test_copies_image_and_zeroes_bss() {
        let image: Vec<u32> = (0..16).map(|i| 0xA5A5_0000 | i).collect();
        let mut data = vec![0xDEAD_BEEFu32; 16];
        let mut bss = vec![0xFFFF_FFFFu32; 24];

        let layout = LinkLayout {
            code: MemoryRegion::new(0, 0),
            data_load: image.as_ptr() as usize,
            data: region_of(&mut data),
            bss: region_of(&mut bss),
            heap: MemoryRegion::new(0, 0),
        };
        unsafe { init_data_segments(&layout) };

        assert_eq!(data, image);
        assert!(bss.iter().all(|&w| w == 0));
    }

    #[test]
    fn test_empty_regions_touch_nothing() {
        let image = [1u32, 2];
        let mut guard = [7u32; 2];
        let start = guard.as_mut_ptr() as usize;

        let layout = LinkLayout {
            code: MemoryRegion::new(0, 0),
            data_load: image.as_ptr() as usize,
            data: MemoryRegion::new(start, start),
            bss: MemoryRegion::new(start, start),
            heap: MemoryRegion::new(0, 0),
        };
        unsafe { init_data_segments(&layout) };

        assert_eq!(guard, [7, 7]);
    }

    #[test]
    #[serial]
    fn test_image_at_run_address_is_a_configuration_error() {
        let mut data = vec![0x1234_5678u32; 4];
        let region = region_of(&mut data);
        let layout = LinkLayout {
            code: MemoryRegion::new(0, 0),
            data_load: region.start,
            data: region,
            bss: MemoryRegion::new(0, 0),
            heap: MemoryRegion::new(0, 0),
        };

        static RECORDER: Recorder = Recorder(Mutex::new(Vec::new()));
        set_reporter(&RECORDER);

        let halted = catch_halt(|| unsafe { init_data_segments(&layout) }).unwrap_err();

        assert!(halted.message.starts_with("Assertion \""));
        assert!(halted.message.contains("failed at file"));
        assert_eq!(data, vec![0x1234_5678; 4]);
        // Reported exactly once, before any zeroing happened.
        assert_eq!(*RECORDER.0.lock().unwrap(), vec![halted.message.clone()]);
        clear_reporter();
    }
}
