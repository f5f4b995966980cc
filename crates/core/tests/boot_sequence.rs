// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use bmrt_core::{
    catch_halt, clear_reporter, grow_heap, initialize_with, run_user_code, set_reporter, start,
    FinalizationTable, LinkLayout, MemoryRegion, NoFinalizers, PanicReporter,
};
use serial_test::serial;
use std::cell::Cell;
use std::sync::Mutex;

struct Recorder {
    messages: Mutex<Vec<String>>,
}

impl PanicReporter for Recorder {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

static RECORDER: Recorder = Recorder {
    messages: Mutex::new(Vec::new()),
};

fn reported() -> Vec<String> {
    std::mem::take(&mut *RECORDER.messages.lock().unwrap())
}

/// RAM stand-in: a stored data image, the data and bss regions, and a heap
/// region that is never dereferenced.
struct SimulatedImage {
    flash_image: Vec<u32>,
    data: Vec<u32>,
    bss: Vec<u32>,
    heap: Vec<u8>,
}

impl SimulatedImage {
    fn new(data_words: usize, bss_words: usize, heap_bytes: usize) -> Self {
        Self {
            flash_image: (0..data_words as u32).map(|i| i.wrapping_mul(0x0101_0101)).collect(),
            data: vec![0xCCCC_CCCC; data_words],
            bss: vec![0xEEEE_EEEE; bss_words],
            heap: vec![0; heap_bytes],
        }
    }

    fn layout(&mut self) -> LinkLayout {
        let data = self.data.as_mut_ptr_range();
        let bss = self.bss.as_mut_ptr_range();
        let heap = self.heap.as_mut_ptr_range();
        LinkLayout {
            code: MemoryRegion::new(0x0008_0000, 0x0008_0400),
            data_load: self.flash_image.as_ptr() as usize,
            data: MemoryRegion::new(data.start as usize, data.end as usize),
            bss: MemoryRegion::new(bss.start as usize, bss.end as usize),
            heap: MemoryRegion::new(heap.start as usize, heap.end as usize),
        }
    }
}

fn boot(image: &mut SimulatedImage) -> LinkLayout {
    let layout = image.layout();
    unsafe { initialize_with(&layout) };
    layout
}

#[test]
#[serial]
fn test_initialize_restores_statics() {
    let mut image = SimulatedImage::new(12, 20, 64);
    boot(&mut image);

    assert_eq!(image.data, image.flash_image);
    assert!(image.bss.iter().all(|&w| w == 0));
}

#[test]
#[serial]
fn test_heap_starts_at_region_start_after_initialize() {
    let mut image = SimulatedImage::new(4, 4, 256);
    let layout = boot(&mut image);

    assert_eq!(grow_heap(0) as usize, layout.heap.start);
    assert_eq!(grow_heap(64) as usize, layout.heap.start);
    assert_eq!(grow_heap(64) as usize, layout.heap.start + 64);
    assert_eq!(grow_heap(64) as usize, layout.heap.start + 128);
    assert_eq!(grow_heap(0) as usize, layout.heap.start + 192);
}

#[test]
#[serial]
fn test_oversized_first_request_panics_once() {
    let mut image = SimulatedImage::new(4, 4, 256);
    let layout = boot(&mut image);
    set_reporter(&RECORDER);
    reported();

    let halted = catch_halt(|| grow_heap(layout.heap.len() as isize + 1)).unwrap_err();

    assert_eq!(halted.message, "Out of heap memory.");
    assert_eq!(reported(), vec!["Out of heap memory.".to_string()]);
    assert_eq!(grow_heap(0) as usize, layout.heap.start);
    clear_reporter();
}

#[test]
#[serial]
fn test_reboot_resets_heap() {
    let mut image = SimulatedImage::new(4, 4, 128);
    let layout = boot(&mut image);
    grow_heap(100);

    unsafe { initialize_with(&layout) };

    assert_eq!(grow_heap(0) as usize, layout.heap.start);
}

struct CountingTable {
    entries: Cell<usize>,
    checks: Cell<usize>,
}

impl FinalizationTable for CountingTable {
    fn is_empty(&self) -> bool {
        self.checks.set(self.checks.get() + 1);
        self.entries.get() == 0
    }
}

#[test]
#[serial]
fn test_start_checks_twice_then_halts() {
    let table = CountingTable {
        entries: Cell::new(0),
        checks: Cell::new(0),
    };
    let ran = Cell::new(false);

    let halted = catch_halt(|| {
        start(&table, || {
            ran.set(true);
            Ok::<(), &str>(())
        })
    })
    .unwrap_err();

    assert!(ran.get());
    assert_eq!(table.checks.get(), 2);
    assert_eq!(halted.message, "User code returned.");
}

#[test]
#[serial]
fn test_start_catches_destructor_registered_by_application() {
    let table = CountingTable {
        entries: Cell::new(0),
        checks: Cell::new(0),
    };

    let halted = catch_halt(|| {
        start(&table, || {
            // A function-local static with a destructor.
            table.entries.set(1);
            Ok::<(), &str>(())
        })
    })
    .unwrap_err();

    assert_eq!(halted.message, "Unexpected entries in atexit table.");
}

#[test]
#[serial]
fn test_start_refuses_dirty_table_before_running_application() {
    let table = CountingTable {
        entries: Cell::new(3),
        checks: Cell::new(0),
    };
    let ran = Cell::new(false);

    let halted = catch_halt(|| {
        start(&table, || {
            ran.set(true);
            Ok::<(), &str>(())
        })
    })
    .unwrap_err();

    assert!(!ran.get());
    assert_eq!(halted.message, "Unexpected entries in atexit table.");
}

#[test]
#[serial]
fn test_user_error_is_converted_at_the_boundary() {
    set_reporter(&RECORDER);
    reported();

    let halted = catch_halt(|| run_user_code(|| Err("sensor init failed"))).unwrap_err();

    assert_eq!(halted.message, "Error from user code: sensor init failed");
    assert_eq!(reported().len(), 1);
    clear_reporter();
}

#[test]
#[serial]
fn test_successful_user_code_returns() {
    let result = catch_halt(|| run_user_code(|| Ok::<(), String>(())));
    assert_eq!(result, Ok(()));
}

#[test]
#[serial]
fn test_no_finalizers_start_reaches_application() {
    let halted = catch_halt(|| start(&NoFinalizers, || Err::<(), _>("stop"))).unwrap_err();
    assert_eq!(halted.message, "Error from user code: stop");
}
