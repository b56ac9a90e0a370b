// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Arguments, environment and process control.

use super::{arg_u32, element_addr, errno_result, memory};
use crate::prelude::*;

/// Total size of `items` as NUL-terminated strings
fn table_size(items: &[String]) -> Option<u32> {
    items.iter().try_fold(0u32, |total, item| {
        u32::try_from(item.len()).ok()?.checked_add(1).and_then(|len| total.checked_add(len))
    })
}

/// Write `items` as NUL-terminated strings at `buf`, storing each start
/// address in the pointer array at `ptrs`
fn write_string_table(
    memory: &dyn MemoryAccessor,
    items: &[String],
    ptrs: u32,
    buf: u32,
) -> Result<(), Trap> {
    let mut cursor = buf;
    for (idx, item) in items.iter().enumerate() {
        memory.write_u32(element_addr(ptrs, idx as u32, 4)?, cursor)?;
        memory.write_bytes(cursor, item.as_bytes())?;
        let end = u32::try_from(item.len())
            .ok()
            .and_then(|len| cursor.checked_add(len))
            .ok_or(Trap::OutOfBounds)?;
        memory.write_bytes(end, &[0])?;
        cursor = end.checked_add(1).ok_or(Trap::OutOfBounds)?;
    }
    Ok(())
}

fn sizes_get(items: &[String], caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let count_ptr = arg_u32(args, 0)?;
    let size_ptr = arg_u32(args, 1)?;
    let (Ok(count), Some(size)) = (u32::try_from(items.len()), table_size(items)) else {
        return errno_result(errno::OVERFLOW);
    };
    let memory = memory(caller)?;
    memory.write_u32(count_ptr, count)?;
    memory.write_u32(size_ptr, size)?;
    errno_result(errno::SUCCESS)
}

/// `args_get(argv, argv_buf) -> errno`
pub fn args_get(ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let argv = arg_u32(args, 0)?;
    let argv_buf = arg_u32(args, 1)?;
    trace!(argv, argv_buf, "args_get");
    write_string_table(memory(caller)?, ctx.args(), argv, argv_buf)?;
    errno_result(errno::SUCCESS)
}

/// `args_sizes_get(argc_ptr, argv_buf_size_ptr) -> errno`
pub fn args_sizes_get(ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    trace!(argc = ctx.args().len(), "args_sizes_get");
    sizes_get(ctx.args(), caller, args)
}

/// `environ_get(environ, environ_buf) -> errno`
pub fn environ_get(ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let environ = arg_u32(args, 0)?;
    let environ_buf = arg_u32(args, 1)?;
    trace!(environ, environ_buf, "environ_get");
    write_string_table(memory(caller)?, ctx.env(), environ, environ_buf)?;
    errno_result(errno::SUCCESS)
}

/// `environ_sizes_get(count_ptr, buf_size_ptr) -> errno`
pub fn environ_sizes_get(ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    trace!(count = ctx.env().len(), "environ_sizes_get");
    sizes_get(ctx.env(), caller, args)
}

/// `proc_exit(code)`: never returns; unwinds the whole call chain
pub fn proc_exit(_ctx: &WasiCtx, _caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let code = arg_u32(args, 0)? as i32;
    debug!(code, "proc_exit");
    Err(Trap::ProcessExit(code))
}

/// `sched_yield() -> errno`
pub fn sched_yield(_ctx: &WasiCtx, _caller: &mut dyn HostContext, _args: &[Value]) -> Result<Vec<Value>, Trap> {
    trace!("sched_yield");
    std::thread::yield_now();
    errno_result(errno::SUCCESS)
}
