// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Descriptor I/O on the three standard streams.

use std::io;

use super::{arg_i64, arg_u32, element_addr, errno_result, memory};
use crate::{ctx::Descriptor, prelude::*};

/// `filetype::character_device`
const FILETYPE_CHARACTER_DEVICE: u8 = 2;
/// `rights::fd_read`
const RIGHT_FD_READ: u64 = 1 << 1;
/// `rights::fd_write`
const RIGHT_FD_WRITE: u64 = 1 << 6;

/// Read the `(buf, len)` pair at index `idx` of an iovec array
fn iovec(memory: &dyn MemoryAccessor, iovs: u32, idx: u32) -> Result<(u32, u32), Trap> {
    let entry = element_addr(iovs, idx, 8)?;
    let buf = memory.read_u32(entry)?;
    let len = memory.read_u32(entry.checked_add(4).ok_or(Trap::OutOfBounds)?)?;
    Ok((buf, len))
}

/// Trap unless `[buf, buf + len)` lies inside the caller's memory
fn check_range(memory: &dyn MemoryAccessor, buf: u32, len: u32) -> Result<(), Trap> {
    if u64::from(buf) + u64::from(len) > memory.size() as u64 {
        return Err(Trap::OutOfBounds);
    }
    Ok(())
}

/// Bytes copied out of guest memory per write to a host stream
const STAGING_LEN: u32 = 64 * 1024;

/// Copy each `(buf, len)` range to `sink` in chunks of at most
/// [`STAGING_LEN`] bytes and return the number of bytes written.
///
/// The count saturates at `u32::MAX`; bytes past that are not written.
fn write_gathered(
    memory: &dyn MemoryAccessor,
    iovecs: &[(u32, u32)],
    discard: bool,
    mut sink: impl FnMut(&[u8]) -> io::Result<()>,
) -> Result<io::Result<u32>, Trap> {
    let mut written = 0u32;
    let mut staging = Vec::new();
    for &(buf, len) in iovecs {
        let len = len.min(u32::MAX - written);
        if !discard {
            let mut offset = 0;
            while offset < len {
                let chunk = (len - offset).min(STAGING_LEN);
                staging.resize(chunk as usize, 0);
                memory.read_bytes(buf + offset, &mut staging)?;
                if let Err(error) = sink(&staging) {
                    return Ok(Err(error));
                }
                offset += chunk;
            }
        }
        written += len;
    }
    Ok(Ok(written))
}

/// `fd_write(fd, iovs, iovs_len, nwritten_ptr) -> errno`
pub fn fd_write(ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let fd = arg_u32(args, 0)?;
    let iovs = arg_u32(args, 1)?;
    let iovs_len = arg_u32(args, 2)?;
    let nwritten_ptr = arg_u32(args, 3)?;
    trace!(fd, iovs, iovs_len, "fd_write");
    let memory = memory(caller)?;

    // Every range is checked before the first byte reaches the host
    let mut iovecs = Vec::with_capacity(iovs_len.min(64) as usize);
    for idx in 0..iovs_len {
        let (buf, len) = iovec(memory, iovs, idx)?;
        check_range(memory, buf, len)?;
        iovecs.push((buf, len));
    }

    let written = ctx.with_descriptor(fd, |descriptor| match descriptor {
        Descriptor::Output(pipe) => {
            Some(write_gathered(memory, &iovecs, pipe.discards(), |chunk| pipe.write_all(chunk)))
        },
        Descriptor::Input(_) => None,
    });
    match written.flatten() {
        None => errno_result(errno::BADF),
        Some(result) => match result? {
            Err(error) => {
                warn!(fd, %error, "host write failed");
                errno_result(errno::IO)
            },
            Ok(count) => {
                memory.write_u32(nwritten_ptr, count)?;
                errno_result(errno::SUCCESS)
            },
        },
    }
}

/// Fill each `(buf, len)` range from `source` in chunks of at most
/// [`STAGING_LEN`] bytes, stopping at the first short read, and return the
/// number of bytes read.
fn read_scattered(
    memory: &dyn MemoryAccessor,
    iovecs: &[(u32, u32)],
    mut source: impl FnMut(&mut [u8]) -> io::Result<usize>,
) -> Result<io::Result<u32>, Trap> {
    let mut total = 0u32;
    let mut staging = Vec::new();
    for &(buf, len) in iovecs {
        let len = len.min(u32::MAX - total);
        let mut offset = 0;
        while offset < len {
            let want = (len - offset).min(STAGING_LEN);
            staging.resize(want as usize, 0);
            let n = match source(&mut staging) {
                Ok(n) => n.min(staging.len()) as u32,
                Err(error) => return Ok(Err(error)),
            };
            memory.write_bytes(buf + offset, &staging[..n as usize])?;
            offset += n;
            total += n;
            if n < want {
                return Ok(Ok(total));
            }
        }
    }
    Ok(Ok(total))
}

/// `fd_read(fd, iovs, iovs_len, nread_ptr) -> errno`
pub fn fd_read(ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let fd = arg_u32(args, 0)?;
    let iovs = arg_u32(args, 1)?;
    let iovs_len = arg_u32(args, 2)?;
    let nread_ptr = arg_u32(args, 3)?;
    trace!(fd, iovs, iovs_len, "fd_read");
    let memory = memory(caller)?;

    let mut iovecs = Vec::with_capacity(iovs_len.min(64) as usize);
    for idx in 0..iovs_len {
        let (buf, len) = iovec(memory, iovs, idx)?;
        check_range(memory, buf, len)?;
        iovecs.push((buf, len));
    }

    let read = ctx.with_descriptor(fd, |descriptor| match descriptor {
        Descriptor::Input(pipe) => Some(read_scattered(memory, &iovecs, |chunk| pipe.read(chunk))),
        Descriptor::Output(_) => None,
    });
    match read.flatten() {
        None => errno_result(errno::BADF),
        Some(result) => match result? {
            Err(error) => {
                warn!(fd, %error, "host read failed");
                errno_result(errno::IO)
            },
            Ok(total) => {
                memory.write_u32(nread_ptr, total)?;
                errno_result(errno::SUCCESS)
            },
        },
    }
}

/// `fd_close(fd) -> errno`
pub fn fd_close(ctx: &WasiCtx, _caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let fd = arg_u32(args, 0)?;
    trace!(fd, "fd_close");
    errno_result(if ctx.close(fd) { errno::SUCCESS } else { errno::BADF })
}

/// `fd_fdstat_get(fd, stat_ptr) -> errno`
///
/// Writes the 24-byte `fdstat` record: filetype, flags, base and
/// inheriting rights.
pub fn fd_fdstat_get(ctx: &WasiCtx, caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let fd = arg_u32(args, 0)?;
    let stat_ptr = arg_u32(args, 1)?;
    trace!(fd, stat_ptr, "fd_fdstat_get");

    let rights = ctx.with_descriptor(fd, |descriptor| match descriptor {
        Descriptor::Input(_) => RIGHT_FD_READ,
        Descriptor::Output(_) => RIGHT_FD_WRITE,
    });
    let Some(rights) = rights else {
        return errno_result(errno::BADF);
    };

    let mut stat = [0u8; 24];
    stat[0] = FILETYPE_CHARACTER_DEVICE;
    stat[8..16].copy_from_slice(&rights.to_le_bytes());
    memory(caller)?.write_bytes(stat_ptr, &stat)?;
    errno_result(errno::SUCCESS)
}

/// `fd_seek(fd, offset, whence, newoffset_ptr) -> errno`
///
/// Standard streams are not seekable.
pub fn fd_seek(ctx: &WasiCtx, _caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let fd = arg_u32(args, 0)?;
    let offset = arg_i64(args, 1)?;
    let whence = arg_u32(args, 2)?;
    trace!(fd, offset, whence, "fd_seek");
    errno_result(if ctx.is_open(fd) { errno::SPIPE } else { errno::BADF })
}

/// `fd_prestat_get(fd, prestat_ptr) -> errno`
///
/// There are no pre-opened directories.
pub fn fd_prestat_get(_ctx: &WasiCtx, _caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let fd = arg_u32(args, 0)?;
    trace!(fd, "fd_prestat_get");
    errno_result(errno::BADF)
}

/// `fd_prestat_dir_name(fd, path, path_len) -> errno`
pub fn fd_prestat_dir_name(_ctx: &WasiCtx, _caller: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
    let fd = arg_u32(args, 0)?;
    trace!(fd, "fd_prestat_dir_name");
    errno_result(errno::BADF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ctx::{STDERR, STDIN, STDOUT},
        preview1::test_support::{caller, errno_of, i32s, TestCaller, TestMemory},
    };

    /// Lay out iovecs at 0 pointing at the given buffers
    fn set_iovecs(caller: &TestCaller, iovs: &[(u32, u32)]) {
        for (idx, &(buf, len)) in iovs.iter().enumerate() {
            caller.0.write_u32(idx as u32 * 8, buf).expect("in bounds");
            caller.0.write_u32(idx as u32 * 8 + 4, len).expect("in bounds");
        }
    }

    #[test]
    fn test_fd_write_gathers_iovecs() {
        let out = CaptureBuffer::new();
        let ctx = WasiCtx::builder().stdout_capture(&out).build();
        let mut caller = caller();
        caller.0.write_bytes(100, b"Hello, ").expect("in bounds");
        caller.0.write_bytes(200, b"world\n").expect("in bounds");
        set_iovecs(&caller, &[(100, 7), (200, 6)]);

        let args = i32s(&[STDOUT as i32, 0, 2, 300]);
        assert_eq!(errno_of(fd_write(&ctx, &mut caller, &args)), errno::SUCCESS);
        assert_eq!(out.to_string_lossy(), "Hello, world\n");
        assert_eq!(caller.0.read_u32(300), Ok(13));
    }

    #[test]
    fn test_fd_write_bad_descriptors() {
        let ctx = WasiCtx::builder().build();
        let mut caller = caller();
        set_iovecs(&caller, &[(100, 1)]);
        assert_eq!(errno_of(fd_write(&ctx, &mut caller, &i32s(&[9, 0, 1, 300]))), errno::BADF);
        assert_eq!(errno_of(fd_write(&ctx, &mut caller, &i32s(&[STDIN as i32, 0, 1, 300]))), errno::BADF);
    }

    #[test]
    fn test_fd_write_out_of_bounds_traps() {
        let ctx = WasiCtx::builder().build();
        let mut caller = caller();
        set_iovecs(&caller, &[(1000, 100)]);
        assert_eq!(fd_write(&ctx, &mut caller, &i32s(&[STDOUT as i32, 0, 1, 300])), Err(Trap::OutOfBounds));
    }

    #[test]
    fn test_aliased_iovecs_stream_in_bounded_chunks() {
        let memory = TestMemory::new(65_536);
        memory.write_bytes(65_535, &[7]).expect("in bounds");
        let iovecs = vec![(0, 65_536); 1000];

        let mut largest = 0;
        let mut total = 0u64;
        let mut last_byte = 0;
        let written = write_gathered(&memory, &iovecs, false, |chunk| {
            largest = largest.max(chunk.len());
            total += chunk.len() as u64;
            last_byte = chunk[chunk.len() - 1];
            Ok(())
        });
        assert_eq!(written.expect("in bounds").expect("sink accepts"), 65_536_000);
        assert!(largest <= STAGING_LEN as usize);
        assert_eq!(total, 65_536_000);
        assert_eq!(last_byte, 7);
    }

    #[test]
    fn test_fd_write_count_saturates() {
        // 70_000 iovecs naming the same page add up to more than 4 GiB
        let count = 70_000u32;
        let iovs = 65_536u32;
        let nwritten = iovs + count * 8;
        let mut caller = TestCaller(TestMemory::new(nwritten as usize + 4));
        for idx in 0..count {
            caller.0.write_u32(iovs + idx * 8, 0).expect("in bounds");
            caller.0.write_u32(iovs + idx * 8 + 4, 65_536).expect("in bounds");
        }

        let ctx = WasiCtx::builder().build();
        let args = i32s(&[STDOUT as i32, iovs as i32, count as i32, nwritten as i32]);
        assert_eq!(errno_of(fd_write(&ctx, &mut caller, &args)), errno::SUCCESS);
        assert_eq!(caller.0.read_u32(nwritten), Ok(u32::MAX));
    }

    #[test]
    fn test_fd_read_fills_large_buffer() {
        let input: Vec<u8> = (0..150_000u32).map(|i| (i % 251) as u8).collect();
        let ctx = WasiCtx::builder().stdin_bytes(input.clone()).build();
        let mut caller = TestCaller(TestMemory::new(200_016));
        caller.0.write_u32(0, 16).expect("in bounds");
        caller.0.write_u32(4, 200_000).expect("in bounds");

        let args = i32s(&[STDIN as i32, 0, 1, 8]);
        assert_eq!(errno_of(fd_read(&ctx, &mut caller, &args)), errno::SUCCESS);
        assert_eq!(caller.0.read_u32(8), Ok(150_000));
        let mut buf = vec![0u8; 150_000];
        caller.0.read_bytes(16, &mut buf).expect("in bounds");
        assert_eq!(buf, input);
    }

    #[test]
    fn test_fd_read_scatters_and_stops_short() {
        let ctx = WasiCtx::builder().stdin_bytes("abcdef").build();
        let mut caller = caller();
        set_iovecs(&caller, &[(100, 4), (200, 4), (300, 4)]);
        let args = i32s(&[STDIN as i32, 0, 3, 400]);
        assert_eq!(errno_of(fd_read(&ctx, &mut caller, &args)), errno::SUCCESS);
        assert_eq!(caller.0.read_u32(400), Ok(6));
        let mut buf = [0u8; 4];
        caller.0.read_bytes(100, &mut buf).expect("in bounds");
        assert_eq!(&buf, b"abcd");
        caller.0.read_bytes(200, &mut buf).expect("in bounds");
        assert_eq!(&buf[..2], b"ef");

        assert_eq!(errno_of(fd_read(&ctx, &mut caller, &args)), errno::SUCCESS);
        assert_eq!(caller.0.read_u32(400), Ok(0));
    }

    #[test]
    fn test_close_then_write() {
        let ctx = WasiCtx::builder().build();
        let mut caller = caller();
        assert_eq!(errno_of(fd_close(&ctx, &mut caller, &i32s(&[STDERR as i32]))), errno::SUCCESS);
        assert_eq!(errno_of(fd_close(&ctx, &mut caller, &i32s(&[STDERR as i32]))), errno::BADF);
        set_iovecs(&caller, &[(100, 1)]);
        assert_eq!(errno_of(fd_write(&ctx, &mut caller, &i32s(&[STDERR as i32, 0, 1, 300]))), errno::BADF);
    }

    #[test]
    fn test_fdstat() {
        let ctx = WasiCtx::builder().build();
        let mut caller = caller();
        assert_eq!(errno_of(fd_fdstat_get(&ctx, &mut caller, &i32s(&[STDOUT as i32, 64]))), errno::SUCCESS);
        let mut stat = [0u8; 24];
        caller.0.read_bytes(64, &mut stat).expect("in bounds");
        assert_eq!(stat[0], FILETYPE_CHARACTER_DEVICE);
        assert_eq!(u64::from_le_bytes(stat[8..16].try_into().expect("8 bytes")), RIGHT_FD_WRITE);
        assert_eq!(errno_of(fd_fdstat_get(&ctx, &mut caller, &i32s(&[5, 64]))), errno::BADF);
    }

    #[test]
    fn test_seek_and_prestat() {
        let ctx = WasiCtx::builder().build();
        let mut caller = caller();
        let seek = |fd: i32| [Value::I32(fd), Value::I64(0), Value::I32(0), Value::I32(0)];
        assert_eq!(errno_of(fd_seek(&ctx, &mut caller, &seek(1))), errno::SPIPE);
        assert_eq!(errno_of(fd_seek(&ctx, &mut caller, &seek(3))), errno::BADF);
        assert_eq!(errno_of(fd_prestat_get(&ctx, &mut caller, &i32s(&[3, 0]))), errno::BADF);
        assert_eq!(errno_of(fd_prestat_dir_name(&ctx, &mut caller, &i32s(&[3, 0, 0]))), errno::BADF);
    }
}
