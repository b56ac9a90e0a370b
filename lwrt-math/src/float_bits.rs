// LWRT - lwrt-math
// Module: Float Bit Patterns
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Wrapper types for f32 and f64 ensuring bit-pattern based equality and
//! hashing.
//!
//! WebAssembly values must survive a round trip through locals, globals and
//! memory with their exact bits (including NaN payloads), so the runtime
//! stores floats as these wrappers and only converts to `f32`/`f64` for
//! arithmetic.

use core::hash::{Hash, Hasher};

use crate::{prelude::Result, traits::LittleEndian};

/// Wrapper for f32 that implements Hash, `PartialEq`, and Eq based on bit
/// patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct FloatBits32(pub u32);

impl FloatBits32 {
    /// Canonical Not-a-Number (`NaN`) for f32.
    pub const NAN: Self = FloatBits32(0x7fc0_0000);

    /// Creates a new `FloatBits32` from an `f32` value.
    #[must_use]
    pub fn from_float(val: f32) -> Self {
        Self(val.to_bits())
    }

    /// Returns the `f32` value represented by this `FloatBits32`.
    #[must_use]
    pub const fn value(self) -> f32 {
        f32::from_bits(self.0)
    }

    /// Returns the underlying `u32` bits of this `FloatBits32`.
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Creates a `FloatBits32` from raw `u32` bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }
}

impl Hash for FloatBits32 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<f32> for FloatBits32 {
    fn from(val: f32) -> Self {
        Self::from_float(val)
    }
}

/// Wrapper for f64 that implements Hash, `PartialEq`, and Eq based on bit
/// patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct FloatBits64(pub u64);

impl FloatBits64 {
    /// Canonical Not-a-Number (`NaN`) for f64.
    pub const NAN: Self = FloatBits64(0x7ff8_0000_0000_0000);

    /// Creates a new `FloatBits64` from an `f64` value.
    #[must_use]
    pub fn from_float(val: f64) -> Self {
        Self(val.to_bits())
    }

    /// Returns the `f64` value represented by this `FloatBits64`.
    #[must_use]
    pub const fn value(self) -> f64 {
        f64::from_bits(self.0)
    }

    /// Returns the underlying `u64` bits of this `FloatBits64`.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Creates a `FloatBits64` from raw `u64` bits.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl Hash for FloatBits64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<f64> for FloatBits64 {
    fn from(val: f64) -> Self {
        Self::from_float(val)
    }
}

impl LittleEndian for FloatBits32 {
    const SIZE: usize = 4;

    fn from_le_slice(bytes: &[u8]) -> Result<Self> {
        u32::from_le_slice(bytes).map(FloatBits32)
    }

    fn write_le(&self, out: &mut [u8]) -> Result<()> {
        self.0.write_le(out)
    }
}

impl LittleEndian for FloatBits64 {
    const SIZE: usize = 8;

    fn from_le_slice(bytes: &[u8]) -> Result<Self> {
        u64::from_le_slice(bytes).map(FloatBits64)
    }

    fn write_le(&self, out: &mut [u8]) -> Result<()> {
        self.0.write_le(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_payload_survives() {
        let bits = FloatBits32::from_bits(0x7fa0_0001);
        assert!(bits.value().is_nan());
        assert_eq!(FloatBits32::from_float(bits.value()).to_bits(), 0x7fa0_0001);
    }

    #[test]
    fn test_signed_zero_is_distinct() {
        assert_ne!(FloatBits64::from_float(0.0), FloatBits64::from_float(-0.0));
    }

    #[test]
    fn test_little_endian_width_is_checked() -> Result<()> {
        let value = FloatBits64::from_le_slice(&1.5f64.to_le_bytes())?;
        assert_eq!(value.value(), 1.5);
        assert!(FloatBits32::from_le_slice(&[0, 0, 0]).is_err());

        let mut out = [0u8; 4];
        FloatBits32::from_float(2.0).write_le(&mut out)?;
        assert_eq!(out, 2.0f32.to_le_bytes());
        Ok(())
    }
}
