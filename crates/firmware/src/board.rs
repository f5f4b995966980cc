// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! SAM3X8E bring-up: watchdog, the debug UART on PA8/PA9, and the panic
//! reporter that writes to it.

use bmrt_core::PanicReporter;
use core::fmt;
use core::ptr::{read_volatile, write_volatile};

const WDT_MR: *mut u32 = 0x400E_1A54 as *mut u32;
const WDT_MR_WDDIS: u32 = 1 << 15;

const PMC_PCER0: *mut u32 = 0x400E_0610 as *mut u32;
const ID_UART: u32 = 8;

const PIOA_BASE: usize = 0x400E_0E00;
const PIO_PDR: *mut u32 = (PIOA_BASE + 0x04) as *mut u32;
const PIO_PUER: *mut u32 = (PIOA_BASE + 0x64) as *mut u32;
const PIO_ABSR: *mut u32 = (PIOA_BASE + 0x70) as *mut u32;
const PINS_UART: u32 = (1 << 8) | (1 << 9); // URXD, UTXD

const UART_BASE: usize = 0x400E_0800;
const UART_CR: *mut u32 = UART_BASE as *mut u32;
const UART_MR: *mut u32 = (UART_BASE + 0x04) as *mut u32;
const UART_SR: *const u32 = (UART_BASE + 0x14) as *const u32;
const UART_THR: *mut u32 = (UART_BASE + 0x1C) as *mut u32;
const UART_BRGR: *mut u32 = (UART_BASE + 0x20) as *mut u32;

const UART_CR_RSTRX: u32 = 1 << 2;
const UART_CR_RSTTX: u32 = 1 << 3;
const UART_CR_RXEN: u32 = 1 << 4;
const UART_CR_RXDIS: u32 = 1 << 5;
const UART_CR_TXEN: u32 = 1 << 6;
const UART_CR_TXDIS: u32 = 1 << 7;
const UART_MR_PAR_NO: u32 = 0x4 << 9;
const UART_SR_TXRDY: u32 = 1 << 1;

// Master clock straight out of reset: the 4 MHz internal RC oscillator.
const MCK_HZ: u32 = 4_000_000;
const BAUD_RATE: u32 = 9_600;

pub fn disable_watchdog() {
    // WDT_MR is write-once after reset.
    unsafe { write_volatile(WDT_MR, WDT_MR_WDDIS) };
}

pub fn init_uart() {
    unsafe {
        write_volatile(PMC_PCER0, 1 << ID_UART);

        write_volatile(PIO_PDR, PINS_UART);
        let absr = read_volatile(PIO_ABSR);
        write_volatile(PIO_ABSR, absr & !PINS_UART); // peripheral A
        write_volatile(PIO_PUER, PINS_UART);

        write_volatile(
            UART_CR,
            UART_CR_RSTRX | UART_CR_RSTTX | UART_CR_RXDIS | UART_CR_TXDIS,
        );
        write_volatile(UART_MR, UART_MR_PAR_NO);
        write_volatile(UART_BRGR, MCK_HZ / (16 * BAUD_RATE));
        write_volatile(UART_CR, UART_CR_RXEN | UART_CR_TXEN);
    }
}

fn write_byte(byte: u8) {
    unsafe {
        while read_volatile(UART_SR) & UART_SR_TXRDY == 0 {}
        write_volatile(UART_THR, byte as u32);
    }
}

/// Blocking writer for the debug UART.
pub struct Uart;

impl Uart {
    pub fn write_str(&self, s: &str) {
        for byte in s.bytes() {
            write_byte(byte);
        }
    }
}

impl fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Uart::write_str(self, s);
        Ok(())
    }
}

/// Prints panic messages on the debug UART. Polls the transmitter, so it
/// works from fault handlers too.
pub struct SerialReporter;

impl PanicReporter for SerialReporter {
    fn report(&self, message: &str) {
        Uart.write_str("\r\nPANIC: ");
        Uart.write_str(message);
        Uart.write_str("\r\n");
    }
}
