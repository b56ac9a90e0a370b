// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT
// Project: LWRT
// Module: lwrt-math::traits

//! Common traits used within the lwrt-math crate.

use crate::prelude::Result;

/// Types with a fixed-width little-endian byte representation, as stored in
/// linear memory.
pub trait LittleEndian: Sized {
    /// Width in bytes
    const SIZE: usize;

    /// Creates an instance from exactly [`Self::SIZE`] little-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` has the wrong length.
    fn from_le_slice(bytes: &[u8]) -> Result<Self>;

    /// Writes the little-endian representation into the first
    /// [`Self::SIZE`] bytes of `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` is shorter than [`Self::SIZE`].
    fn write_le(&self, out: &mut [u8]) -> Result<()>;
}

macro_rules! impl_little_endian {
    ($($ty:ty => $size:expr),* $(,)?) => {$(
        impl LittleEndian for $ty {
            const SIZE: usize = $size;

            fn from_le_slice(bytes: &[u8]) -> Result<Self> {
                let arr: [u8; $size] = bytes
                    .try_into()
                    .map_err(|_| lwrt_error::Error::engine_invariant("Slice width mismatch"))?;
                Ok(<$ty>::from_le_bytes(arr))
            }

            fn write_le(&self, out: &mut [u8]) -> Result<()> {
                let dst = out
                    .get_mut(..$size)
                    .ok_or(lwrt_error::Error::engine_invariant("Output buffer too short"))?;
                dst.copy_from_slice(&self.to_le_bytes());
                Ok(())
            }
        }
    )*};
}

impl_little_endian!(u8 => 1, u16 => 2, u32 => 4, u64 => 8, i8 => 1, i16 => 2, i32 => 4, i64 => 8);
