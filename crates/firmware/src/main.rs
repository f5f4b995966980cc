// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.
#![no_std]
#![no_main]

extern crate alloc;

mod board;

use alloc::vec::Vec;
use bmrt_core::{HeapGrowthAllocator, NoFinalizers};
use board::{SerialReporter, Uart};
use core::fmt::{self, Write};

#[global_allocator]
static ALLOCATOR: HeapGrowthAllocator = HeapGrowthAllocator;

static REPORTER: SerialReporter = SerialReporter;

/// Cortex-M vector table entry after the initial stack pointer, which the
/// linker script places at `_sfixed`.
pub union Vector {
    handler: unsafe extern "C" fn() -> !,
    reserved: usize,
}

#[link_section = ".vectors"]
#[no_mangle]
#[used]
pub static EXCEPTIONS: [Vector; 15] = [
    Vector { handler: Reset },
    Vector { handler: DefaultHandler }, // NMI
    Vector { handler: HardFault },
    Vector { handler: DefaultHandler }, // MemManage
    Vector { handler: DefaultHandler }, // BusFault
    Vector { handler: DefaultHandler }, // UsageFault
    Vector { reserved: 0 },
    Vector { reserved: 0 },
    Vector { reserved: 0 },
    Vector { reserved: 0 },
    Vector { handler: DefaultHandler }, // SVCall
    Vector { handler: DefaultHandler }, // DebugMonitor
    Vector { reserved: 0 },
    Vector { handler: DefaultHandler }, // PendSV
    Vector { handler: DefaultHandler }, // SysTick
];

#[no_mangle]
pub unsafe extern "C" fn Reset() -> ! {
    // First instruction path after reset: no static has been read yet.
    bmrt_core::initialize();

    board::disable_watchdog();
    board::init_uart();
    Uart.write_str("\r\nbmrt on Arduino Due\r\n");
    bmrt_core::set_reporter(&REPORTER);

    bmrt_core::start(&NoFinalizers, app)
}

#[no_mangle]
pub unsafe extern "C" fn HardFault() -> ! {
    bmrt_core::hard_fault()
}

#[no_mangle]
pub unsafe extern "C" fn DefaultHandler() -> ! {
    bmrt_core::panic("Unhandled exception.")
}

fn app() -> Result<(), fmt::Error> {
    let mut out = Uart;
    write!(out, "{}\r\n", bmrt_core::current_layout().segment_sizes())?;

    let squares: Vec<u32> = (0..32u32).map(|i| i * i).collect();
    let sum: u32 = squares.iter().sum();
    let used = bmrt_core::heap_stats().map_or(0, |stats| stats.used());
    write!(
        out,
        "Heap check: {} values, sum {}, {} heap bytes in use.\r\n",
        squares.len(),
        sum,
        used
    )?;

    loop {
        cortex_m::asm::wfi();
    }
}
