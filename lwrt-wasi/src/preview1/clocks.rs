// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Clocks.
//!
//! The realtime clock reads the host's system time. The monotonic clock and
//! both CPU-time clocks count from the moment the context was built.

use std::time::{SystemTime, UNIX_EPOCH};

use super::{arg_i64, arg_u32, errno_result, memory};
use crate::prelude::*;

// Clock identifiers
const REALTIME: u32 = 0;
const MONOTONIC: u32 = 1;
const PROCESS_CPUTIME: u32 = 2;
const THREAD_CPUTIME: u32 = 3;

/// Reported resolution of every clock, in nanoseconds
const RESOLUTION_NS: u64 = 1_000;

fn now_ns(ctx: &WasiCtx, clock: u32) -> Result<u64, Errno> {
    let elapsed = match clock {
        REALTIME => SystemTime::now().duration_since(UNIX_EPOCH).map_err(|_| errno::IO)?,
        MONOTONIC | PROCESS_CPUTIME | THREAD_CPUTIME => ctx.started().elapsed(),
        _ => return Err(errno::INVAL),
    };
    u64::try_from(elapsed.as_nanos()).map_err(|_| errno::OVERFLOW)
}

/// `clock_res_get(id, resolution_ptr) -> errno`
pub fn clock_res_get(_ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let clock = arg_u32(args, 0)?;
    let res_ptr = arg_u32(args, 1)?;
    trace!(clock, res_ptr, "clock_res_get");
    if clock > THREAD_CPUTIME {
        return errno_result(errno::INVAL);
    }
    memory(caller)?.write_u64(res_ptr, RESOLUTION_NS)?;
    errno_result(errno::SUCCESS)
}

/// `clock_time_get(id, precision, time_ptr) -> errno`
pub fn clock_time_get(ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let clock = arg_u32(args, 0)?;
    let precision = arg_i64(args, 1)?;
    let time_ptr = arg_u32(args, 2)?;
    trace!(clock, precision, time_ptr, "clock_time_get");
    match now_ns(ctx, clock) {
        Ok(now) => {
            memory(caller)?.write_u64(time_ptr, now)?;
            errno_result(errno::SUCCESS)
        },
        Err(code) => errno_result(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview1::test_support::{caller, errno_of, i32s};

    fn read_u64(caller: &crate::preview1::test_support::TestCaller, offset: u32) -> u64 {
        let mut buf = [0u8; 8];
        caller.0.read_bytes(offset, &mut buf).expect("in bounds");
        u64::from_le_bytes(buf)
    }

    #[test]
    fn test_realtime_is_after_2020() {
        let ctx = WasiCtx::builder().build();
        let mut caller = caller();
        let args = [Value::I32(REALTIME as i32), Value::I64(0), Value::I32(8)];
        assert_eq!(errno_of(clock_time_get(&ctx, &mut caller, &args)), errno::SUCCESS);
        assert!(read_u64(&caller, 8) > 1_577_836_800_000_000_000);
    }

    #[test]
    fn test_monotonic_does_not_go_backwards() {
        let ctx = WasiCtx::builder().build();
        let mut caller = caller();
        let args = [Value::I32(MONOTONIC as i32), Value::I64(1), Value::I32(0)];
        assert_eq!(errno_of(clock_time_get(&ctx, &mut caller, &args)), errno::SUCCESS);
        let first = read_u64(&caller, 0);
        assert_eq!(errno_of(clock_time_get(&ctx, &mut caller, &args)), errno::SUCCESS);
        assert!(read_u64(&caller, 0) >= first);
    }

    #[test]
    fn test_unknown_clock() {
        let ctx = WasiCtx::builder().build();
        let mut caller = caller();
        let args = [Value::I32(7), Value::I64(0), Value::I32(0)];
        assert_eq!(errno_of(clock_time_get(&ctx, &mut caller, &args)), errno::INVAL);
        assert_eq!(errno_of(clock_res_get(&ctx, &mut caller, &i32s(&[7, 0]))), errno::INVAL);
        assert_eq!(errno_of(clock_res_get(&ctx, &mut caller, &i32s(&[1, 0]))), errno::SUCCESS);
        assert_eq!(read_u64(&caller, 0), RESOLUTION_NS);
    }
}
