// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Hooks the C library expects an operating system to provide.
//!
//! None of them means anything here. Calling one is the bug, so each hook
//! halts with its own name in the message rather than pretending to work.
//! Heap growth and the assertion hooks are the only ones with real bodies.
//!
//! The functions below are plain Rust. On bare-metal targets the `exports`
//! module wraps them in C-ABI symbols under the names the configured C
//! library links against (newlib's `_sbrk`, picolibc's `sbrk`, ...).

use core::fmt::Write;

use crate::fmt::FixedBuf;
use crate::heap::grow_heap;
use crate::panic::panic;

/// Size of the stack buffer assertion messages are formatted into.
pub const ASSERT_MSG_BUFSIZE: usize = 192;

pub fn sbrk(incr: isize) -> *mut u8 {
    grow_heap(incr)
}

pub fn exit(_status: i32) -> ! {
    panic("_exit() called.")
}

pub fn kill(_pid: i32, _sig: i32) -> ! {
    panic("_kill() called.")
}

pub fn getpid() -> ! {
    panic("_getpid() called.")
}

// printf() and friends end up in these. Console output goes through the
// board's own serial routines instead; pulling stdio in is the bug.

pub fn write(_fd: i32, _buf: *const u8, _len: usize) -> ! {
    panic("_write() called.")
}

pub fn read(_fd: i32, _buf: *mut u8, _len: usize) -> ! {
    panic("_read() called.")
}

pub fn close(_fd: i32) -> ! {
    panic("_close() called.")
}

pub fn fstat(_fd: i32) -> ! {
    panic("_fstat() called.")
}

pub fn isatty(_fd: i32) -> ! {
    panic("_isatty() called.")
}

pub fn lseek(_fd: i32, _offset: isize, _whence: i32) -> ! {
    panic("_lseek() called.")
}

/// Formats a failed assertion and halts with it.
pub fn assert_failed(file: &str, line: u32, function: Option<&str>, expr: Option<&str>) -> ! {
    let mut msg = FixedBuf::<ASSERT_MSG_BUFSIZE>::new();
    let _ = write!(
        msg,
        "Assertion \"{}\" failed at file {}, line {}",
        expr.unwrap_or("<expr unavail>"),
        file,
        line
    );
    if let Some(function) = function {
        let _ = write!(msg, ", function: {}", function);
    }
    let _ = msg.write_str(".");
    panic(msg.as_str())
}

/// Variant for builds that strip the expression text to save flash.
pub fn assert_failed_at(file: &str, line: u32) -> ! {
    let mut msg = FixedBuf::<ASSERT_MSG_BUFSIZE>::new();
    let _ = write!(msg, "Assertion failed at file {}, line {}.", file, line);
    panic(msg.as_str())
}

/// Variant for builds that strip even the location.
pub fn assert_failed_generic() -> ! {
    panic("Assertion failed.")
}

#[cfg(target_os = "none")]
mod exports {
    use core::ffi::{c_char, c_int, c_void, CStr};

    // newlib prefixes the OS hooks with an underscore; picolibc uses the
    // POSIX names. `_exit` is spelled the same in both.

    #[cfg_attr(not(feature = "picolibc"), export_name = "_sbrk")]
    #[cfg_attr(feature = "picolibc", export_name = "sbrk")]
    extern "C" fn c_sbrk(incr: isize) -> *mut c_void {
        super::sbrk(incr).cast()
    }

    #[export_name = "_exit"]
    extern "C" fn c_exit(status: c_int) -> ! {
        super::exit(status)
    }

    #[cfg_attr(not(feature = "picolibc"), export_name = "_kill")]
    #[cfg_attr(feature = "picolibc", export_name = "kill")]
    extern "C" fn c_kill(pid: c_int, sig: c_int) -> c_int {
        super::kill(pid, sig)
    }

    #[cfg_attr(not(feature = "picolibc"), export_name = "_getpid")]
    #[cfg_attr(feature = "picolibc", export_name = "getpid")]
    extern "C" fn c_getpid() -> c_int {
        super::getpid()
    }

    #[cfg_attr(not(feature = "picolibc"), export_name = "_write")]
    #[cfg_attr(feature = "picolibc", export_name = "write")]
    extern "C" fn c_write(fd: c_int, buf: *const c_char, len: usize) -> isize {
        super::write(fd, buf.cast(), len)
    }

    #[cfg_attr(not(feature = "picolibc"), export_name = "_read")]
    #[cfg_attr(feature = "picolibc", export_name = "read")]
    extern "C" fn c_read(fd: c_int, buf: *mut c_char, len: usize) -> isize {
        super::read(fd, buf.cast(), len)
    }

    #[cfg_attr(not(feature = "picolibc"), export_name = "_close")]
    #[cfg_attr(feature = "picolibc", export_name = "close")]
    extern "C" fn c_close(fd: c_int) -> c_int {
        super::close(fd)
    }

    #[cfg_attr(not(feature = "picolibc"), export_name = "_fstat")]
    #[cfg_attr(feature = "picolibc", export_name = "fstat")]
    extern "C" fn c_fstat(fd: c_int, _st: *mut c_void) -> c_int {
        super::fstat(fd)
    }

    #[cfg_attr(not(feature = "picolibc"), export_name = "_isatty")]
    #[cfg_attr(feature = "picolibc", export_name = "isatty")]
    extern "C" fn c_isatty(fd: c_int) -> c_int {
        super::isatty(fd)
    }

    #[cfg_attr(not(feature = "picolibc"), export_name = "_lseek")]
    #[cfg_attr(feature = "picolibc", export_name = "lseek")]
    extern "C" fn c_lseek(fd: c_int, offset: isize, whence: c_int) -> isize {
        super::lseek(fd, offset, whence)
    }

    unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
        if ptr.is_null() {
            None
        } else {
            Some(CStr::from_ptr(ptr).to_str().unwrap_or("<invalid utf-8>"))
        }
    }

    #[export_name = "__assert_func"]
    unsafe extern "C" fn c_assert_func(
        filename: *const c_char,
        line: c_int,
        funcname: *const c_char,
        failedexpr: *const c_char,
    ) -> ! {
        super::assert_failed(
            c_str(filename).unwrap_or("<unknown>"),
            line as u32,
            c_str(funcname),
            c_str(failedexpr),
        )
    }

    #[export_name = "__assert_func_only_file_and_line"]
    unsafe extern "C" fn c_assert_func_only_file_and_line(
        filename: *const c_char,
        line: c_int,
    ) -> ! {
        super::assert_failed_at(c_str(filename).unwrap_or("<unknown>"), line as u32)
    }

    #[export_name = "__assert_func_generic_err_msg"]
    extern "C" fn c_assert_func_generic_err_msg() -> ! {
        super::assert_failed_generic()
    }
}
