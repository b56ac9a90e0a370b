// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! `wasi_snapshot_preview1` system calls.
//!
//! Every syscall takes and returns plain `i32`/`i64` values; pointers are
//! offsets into the caller's linear memory. Failures are reported as an
//! errno result. Only a memory fault while reading arguments or writing
//! results traps, as does `proc_exit` by design of the ABI.

pub mod cli;
pub mod clocks;
pub mod io;

use crate::prelude::*;

/// Import namespace of the preview 1 ABI
pub const WASI_MODULE: &str = "wasi_snapshot_preview1";

/// A syscall implementation
pub type Syscall = fn(&WasiCtx, &mut dyn HostContext, &[Value]) -> Result<Vec<Value>, Trap>;

const I32: ValueType = ValueType::I32;
const I64: ValueType = ValueType::I64;

/// Name, parameters, results and implementation of every supported syscall
const SYSCALLS: &[(&str, &[ValueType], &[ValueType], Syscall)] = &[
    ("args_get", &[I32, I32], &[I32], cli::args_get),
    ("args_sizes_get", &[I32, I32], &[I32], cli::args_sizes_get),
    ("environ_get", &[I32, I32], &[I32], cli::environ_get),
    ("environ_sizes_get", &[I32, I32], &[I32], cli::environ_sizes_get),
    ("proc_exit", &[I32], &[], cli::proc_exit),
    ("sched_yield", &[], &[I32], cli::sched_yield),
    ("clock_res_get", &[I32, I32], &[I32], clocks::clock_res_get),
    ("clock_time_get", &[I32, I64, I32], &[I32], clocks::clock_time_get),
    ("fd_write", &[I32, I32, I32, I32], &[I32], io::fd_write),
    ("fd_read", &[I32, I32, I32, I32], &[I32], io::fd_read),
    ("fd_close", &[I32], &[I32], io::fd_close),
    ("fd_fdstat_get", &[I32, I32], &[I32], io::fd_fdstat_get),
    ("fd_seek", &[I32, I64, I32, I32], &[I32], io::fd_seek),
    ("fd_prestat_get", &[I32, I32], &[I32], io::fd_prestat_get),
    ("fd_prestat_dir_name", &[I32, I32, I32], &[I32], io::fd_prestat_dir_name),
];

/// Register every syscall, bound to `ctx`, under [`WASI_MODULE`]
#[must_use]
pub fn registry(ctx: Arc<WasiCtx>) -> CallbackRegistry {
    let mut registry = CallbackRegistry::new();
    for &(name, params, results, syscall) in SYSCALLS {
        let ctx = Arc::clone(&ctx);
        let ty = FuncType::new(params.iter().copied(), results.iter().copied());
        registry.register_host_function(
            WASI_MODULE,
            name,
            HostFunc::new(ty, move |caller, args| syscall(&ctx, caller, args)),
        );
    }
    registry
}

/// The caller's memory
pub(crate) fn memory(caller: &mut dyn HostContext) -> Result<&dyn MemoryAccessor, Trap> {
    caller.memory().ok_or(Trap::Host(Error::MISSING_MEMORY))
}

/// Argument `idx` as an unsigned 32-bit value
pub(crate) fn arg_u32(args: &[Value], idx: usize) -> Result<u32, Trap> {
    args.get(idx)
        .and_then(|arg| arg.as_i32())
        .map(|v| v as u32)
        .ok_or(Trap::Host(Error::type_error("Expected i32 syscall argument")))
}

/// Argument `idx` as a 64-bit value
pub(crate) fn arg_i64(args: &[Value], idx: usize) -> Result<i64, Trap> {
    args.get(idx)
        .and_then(|arg| arg.as_i64())
        .ok_or(Trap::Host(Error::type_error("Expected i64 syscall argument")))
}

/// Errno result of a syscall
pub(crate) fn errno_result(code: Errno) -> Result<Vec<Value>, Trap> {
    if code != errno::SUCCESS {
        trace!(errno = errno::name(code), "syscall failed");
    }
    Ok(vec![Value::I32(i32::from(code))])
}

/// `base + idx * stride`, trapping on overflow
pub(crate) fn element_addr(base: u32, idx: u32, stride: u32) -> Result<u32, Trap> {
    idx.checked_mul(stride).and_then(|off| base.checked_add(off)).ok_or(Trap::OutOfBounds)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;

    use super::*;

    /// A flat memory for calling syscalls without an engine
    pub struct TestMemory(pub RefCell<Vec<u8>>);

    impl TestMemory {
        pub fn new(size: usize) -> Self {
            Self(RefCell::new(vec![0; size]))
        }
    }

    impl MemoryAccessor for TestMemory {
        fn read_bytes(&self, offset: u32, buf: &mut [u8]) -> Result<(), Trap> {
            let data = self.0.borrow();
            let start = offset as usize;
            let src = data.get(start..start + buf.len()).ok_or(Trap::OutOfBounds)?;
            buf.copy_from_slice(src);
            Ok(())
        }

        fn write_bytes(&self, offset: u32, bytes: &[u8]) -> Result<(), Trap> {
            let mut data = self.0.borrow_mut();
            let start = offset as usize;
            let dst = data.get_mut(start..start + bytes.len()).ok_or(Trap::OutOfBounds)?;
            dst.copy_from_slice(bytes);
            Ok(())
        }

        fn size(&self) -> usize {
            self.0.borrow().len()
        }
    }

    /// Caller context exposing a [`TestMemory`]
    pub struct TestCaller(pub TestMemory);

    impl HostContext for TestCaller {
        fn memory(&self) -> Option<&dyn MemoryAccessor> {
            Some(&self.0)
        }
    }

    pub fn caller() -> TestCaller {
        TestCaller(TestMemory::new(1024))
    }

    pub fn i32s(values: &[i32]) -> Vec<Value> {
        values.iter().map(|&v| Value::I32(v)).collect()
    }

    pub fn errno_of(result: Result<Vec<Value>, Trap>) -> Errno {
        match result.expect("syscall does not trap").as_slice() {
            [Value::I32(errno)] => *errno as Errno,
            other => panic!("unexpected syscall result {other:?}"),
        }
    }
}
