// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The single terminal failure sink.
//!
//! Heap exhaustion, unsupported C run-time hooks, failed assertions, a
//! non-empty atexit table, hardware faults and Rust panics all end up in
//! [`panic`]. There is no supervisor to hand a faulted task to, so the sink
//! reports once and then stops the core for good.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::global::GlobalCell;
use crate::macros::rt_event;

/// Strategy for getting a panic message out of the device.
///
/// Called with interrupts in an unknown state, possibly from a fault
/// handler: implementations should write synchronously to a simple
/// peripheral and must not allocate.
pub trait PanicReporter: Sync {
    fn report(&self, message: &str);
}

/// Reporter used until the board installs a real one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl PanicReporter for NoopReporter {
    fn report(&self, _message: &str) {}
}

static REPORTER: GlobalCell<&'static dyn PanicReporter> = GlobalCell::new(&NoopReporter);

/// Set while a reporter call is in flight, so a reporter that faults does
/// not recurse back into itself.
///
/// Kept in `.data`: the start-up assertion can panic before `.bss` is zeroed.
#[cfg_attr(target_os = "none", link_section = ".data")]
static REPORTING: AtomicBool = AtomicBool::new(false);

/// Installs the reporter used by every later [`panic`]. Last call wins.
pub fn set_reporter(reporter: &'static dyn PanicReporter) {
    REPORTER.set(reporter);
}

pub fn clear_reporter() {
    REPORTER.set(&NoopReporter);
}

/// Reports `message` through the installed reporter, then halts. Never
/// returns.
pub fn panic(message: &str) -> ! {
    rt_event!(error, "PANIC: {}", message);

    // Plain load/store: Cortex-M0 has no compare-and-swap, and there is only
    // one thread of control to race against.
    if !REPORTING.load(Ordering::Relaxed) {
        REPORTING.store(true, Ordering::Relaxed);
        REPORTER.get().report(message);
    }

    halt(message)
}

/// Stops the core: interrupts off, spin forever.
#[cfg(not(feature = "std"))]
fn halt(_message: &str) -> ! {
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    cortex_m::interrupt::disable();

    loop {
        core::hint::spin_loop();
    }
}

/// Unwind payload raised in place of the endless halt on host builds.
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halted {
    pub message: String,
}

#[cfg(feature = "std")]
impl std::fmt::Display for Halted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "halted: {}", self.message)
    }
}

/// Host builds cannot spin forever without hanging the test run, so the halt
/// unwinds with a [`Halted`] payload instead. The caller still never sees a
/// normal return.
#[cfg(feature = "std")]
fn halt(message: &str) -> ! {
    REPORTING.store(false, Ordering::Relaxed);
    std::panic::panic_any(Halted {
        message: message.to_owned(),
    })
}

/// Runs `f`, turning a halt into `Err` carrying the halt message.
#[cfg(feature = "std")]
pub fn catch_halt<F, R>(f: F) -> Result<R, Halted>
where
    F: FnOnce() -> R,
{
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<Halted>() {
            Ok(halted) => Err(*halted),
            Err(other) => std::panic::resume_unwind(other),
        },
    }
}
