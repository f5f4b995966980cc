// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Emits a `tracing` event on host builds. Compiles to nothing on bare metal,
/// where there is no subscriber and the arguments must not be formatted.
#[cfg(feature = "std")]
macro_rules! rt_event {
    ($level:ident, $($arg:tt)+) => {
        tracing::$level!($($arg)+)
    };
}

#[cfg(not(feature = "std"))]
macro_rules! rt_event {
    ($level:ident, $($arg:tt)+) => {{
        let _ = format_args!($($arg)+);
    }};
}

/// Run-time assertion that reports through the C library's assertion hook
/// rather than Rust's panic machinery, so the message format matches what
/// linked C code produces.
macro_rules! rt_assert {
    ($cond:expr) => {
        if !$cond {
            $crate::syscalls::assert_failed(
                file!(),
                line!(),
                None,
                Some(stringify!($cond)),
            )
        }
    };
}

pub(crate) use rt_assert;
pub(crate) use rt_event;
