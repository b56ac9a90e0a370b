// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host-facing access to a caller's linear memory.

use lwrt_error::Trap;

/// Byte-level access to linear memory.
///
/// Host functions receive the calling instance's memory through this trait
/// rather than the concrete runtime type, so the WASI shim and other host
/// bundles do not depend on the runtime crate. Every access is all or
/// nothing: an out-of-range request fails with [`Trap::OutOfBounds`] and
/// touches no bytes.
pub trait MemoryAccessor {
    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if `[offset, offset + buf.len())` exceeds the
    /// current size.
    fn read_bytes(&self, offset: u32, buf: &mut [u8]) -> Result<(), Trap>;

    /// Copy `bytes` into memory starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if `[offset, offset + bytes.len())` exceeds the
    /// current size.
    fn write_bytes(&self, offset: u32, bytes: &[u8]) -> Result<(), Trap>;

    /// Current size in bytes.
    fn size(&self) -> usize;

    /// Read a little-endian `u32` at `offset`.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] as for [`MemoryAccessor::read_bytes`].
    fn read_u32(&self, offset: u32) -> Result<u32, Trap> {
        let mut buf = [0u8; 4];
        self.read_bytes(offset, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Write a little-endian `u32` at `offset`.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] as for [`MemoryAccessor::write_bytes`].
    fn write_u32(&self, offset: u32, value: u32) -> Result<(), Trap> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Write a little-endian `u64` at `offset`.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] as for [`MemoryAccessor::write_bytes`].
    fn write_u64(&self, offset: u32, value: u64) -> Result<(), Trap> {
        self.write_bytes(offset, &value.to_le_bytes())
    }
}
