// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::panic::panic;

pub const HARD_FAULT_MSG: &str = "HardFault.";

/// Body for the board's HardFault vector.
///
/// The stack or the heap may be what faulted, so this does no formatting
/// and hands a constant message straight to the sink.
pub fn hard_fault() -> ! {
    panic(HARD_FAULT_MSG)
}

/// Capacity of the buffer a Rust panic message is formatted into.
pub const PANIC_MSG_BUFSIZE: usize = 128;

#[cfg(all(target_os = "none", feature = "panic-handler"))]
#[panic_handler]
fn on_rust_panic(info: &core::panic::PanicInfo) -> ! {
    use core::fmt::Write;

    let mut msg = crate::fmt::FixedBuf::<PANIC_MSG_BUFSIZE>::new();
    match info.location() {
        Some(location) => {
            let _ = write!(
                msg,
                "panicked at {}:{}: {}",
                location.file(),
                location.line(),
                info.message()
            );
        }
        None => {
            let _ = write!(msg, "panicked: {}", info.message());
        }
    }
    panic(msg.as_str())
}
