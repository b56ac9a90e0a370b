// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! `wasi_snapshot_preview1` error numbers.
//!
//! Syscalls report failures by returning one of these values; only memory
//! faults while marshalling arguments trap.

/// A WASI error number
pub type Errno = u16;

/// No error occurred
pub const SUCCESS: Errno = 0;
/// Bad file descriptor
pub const BADF: Errno = 8;
/// Bad address
pub const FAULT: Errno = 21;
/// Invalid argument
pub const INVAL: Errno = 28;
/// I/O error
pub const IO: Errno = 29;
/// Function not supported
pub const NOSYS: Errno = 52;
/// Not supported
pub const NOTSUP: Errno = 58;
/// Value too large to be stored in data type
pub const OVERFLOW: Errno = 61;
/// Invalid seek
pub const SPIPE: Errno = 70;

/// Symbolic name, for logging
#[must_use]
pub const fn name(errno: Errno) -> &'static str {
    match errno {
        SUCCESS => "success",
        BADF => "badf",
        FAULT => "fault",
        INVAL => "inval",
        IO => "io",
        NOSYS => "nosys",
        NOTSUP => "notsup",
        OVERFLOW => "overflow",
        SPIPE => "spipe",
        _ => "unknown",
    }
}
