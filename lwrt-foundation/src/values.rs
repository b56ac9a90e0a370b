// LWRT - lwrt-foundation
// Module: WebAssembly Values
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Runtime values.

use core::fmt;

use lwrt_math::{FloatBits32, FloatBits64};

use crate::types::ValueType;

/// A WebAssembly value.
///
/// Floats are stored as their bit patterns so that NaN payloads and signed
/// zeros survive unchanged, and so that `Value` can be `Eq` and `Hash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(FloatBits32),
    /// 64-bit float
    F64(FloatBits64),
}

impl Value {
    /// Type of this value
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// Whether this value has type `ty`
    #[must_use]
    pub fn matches_type(&self, ty: ValueType) -> bool {
        self.value_type() == ty
    }

    /// The zero value of `ty`, used to initialise locals
    #[must_use]
    pub const fn default_for_type(ty: ValueType) -> Self {
        match ty {
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F32 => Value::F32(FloatBits32(0)),
            ValueType::F64 => Value::F64(FloatBits64(0)),
        }
    }

    /// Convenience constructor for `f32` values
    #[must_use]
    pub fn f32(value: f32) -> Self {
        Value::F32(FloatBits32::from_float(value))
    }

    /// Convenience constructor for `f64` values
    #[must_use]
    pub fn f64(value: f64) -> Self {
        Value::F64(FloatBits64::from_float(value))
    }

    /// The `i32` payload, if this is an `i32`
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// The `i64` payload, if this is an `i64`
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// The `f32` payload, if this is an `f32`
    #[must_use]
    pub const fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(v.value()),
            _ => None,
        }
    }

    /// The `f64` payload, if this is an `f64`
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(v.value()),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(v) => write!(f, "f32:{}", v.value()),
            Value::F64(v) => write!(f, "f64:{}", v.value()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::f32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::f64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values_are_zero() {
        assert_eq!(Value::default_for_type(ValueType::I64), Value::I64(0));
        assert_eq!(Value::default_for_type(ValueType::F32).as_f32(), Some(0.0));
        assert!(Value::default_for_type(ValueType::F64).matches_type(ValueType::F64));
    }

    #[test]
    fn test_nan_values_compare_by_bits() {
        let a = Value::F32(FloatBits32::from_bits(0x7fc0_0001));
        assert_eq!(a, a);
        assert_ne!(a, Value::F32(FloatBits32::NAN));
    }

    #[test]
    fn test_accessors_reject_other_types() {
        let v: Value = 7i32.into();
        assert_eq!(v.as_i32(), Some(7));
        assert_eq!(v.as_i64(), None);
        assert_eq!(format!("{v:?}"), "i32:7");
    }
}
