// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly global value implementation
//!
//! The current value is kept as raw bits in an atomic so that a global
//! shared between instances can be read and written through `&self`.

use core::sync::atomic::{AtomicU64, Ordering};

use lwrt_foundation::{FloatBits32, FloatBits64};

use crate::prelude::*;

fn to_bits(value: Value) -> u64 {
    match value {
        Value::I32(v) => u64::from(v as u32),
        Value::I64(v) => v as u64,
        Value::F32(v) => u64::from(v.to_bits()),
        Value::F64(v) => v.to_bits(),
    }
}

fn from_bits(ty: ValueType, bits: u64) -> Value {
    match ty {
        ValueType::I32 => Value::I32(bits as u32 as i32),
        ValueType::I64 => Value::I64(bits as i64),
        ValueType::F32 => Value::F32(FloatBits32::from_bits(bits as u32)),
        ValueType::F64 => Value::F64(FloatBits64::from_bits(bits)),
    }
}

/// Represents a WebAssembly global variable in the runtime
#[derive(Debug)]
pub struct Global {
    ty:   GlobalType,
    bits: AtomicU64,
}

impl Global {
    /// Create a global holding `initial_value`.
    ///
    /// # Errors
    ///
    /// A type error if the value does not match `ty`.
    pub fn new(ty: GlobalType, initial_value: Value) -> Result<Self, Error> {
        if !initial_value.matches_type(ty.value_type) {
            return Err(Error::type_error("Global initializer type mismatch"));
        }
        Ok(Self {
            ty,
            bits: AtomicU64::new(to_bits(initial_value)),
        })
    }

    /// Create a global from a validated initializer.
    pub(crate) fn with_value(ty: GlobalType, value: Value) -> Self {
        Self {
            ty,
            bits: AtomicU64::new(to_bits(value)),
        }
    }

    /// Declared type
    #[must_use]
    pub fn ty(&self) -> GlobalType {
        self.ty
    }

    /// Current value
    #[must_use]
    pub fn get(&self) -> Value {
        from_bits(self.ty.value_type, self.bits.load(Ordering::Acquire))
    }

    /// Replace the value.
    ///
    /// # Errors
    ///
    /// A type error if the global is immutable or the value has the wrong
    /// type.
    pub fn set(&self, value: Value) -> Result<(), Error> {
        if !self.ty.mutable {
            return Err(Error::type_error("Cannot modify immutable global"));
        }
        if !value.matches_type(self.ty.value_type) {
            return Err(Error::type_error("Global value type mismatch"));
        }
        self.bits.store(to_bits(value), Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(value_type: ValueType, mutable: bool, value: Value) -> Global {
        Global::new(GlobalType { value_type, mutable }, value).expect("initializer matches")
    }

    #[test]
    fn test_values_survive_bit_storage() {
        for value in [
            Value::I32(-1),
            Value::I64(i64::MIN),
            Value::F32(FloatBits32::from_bits(0x7fc0_0001)),
            Value::f64(-0.0),
        ] {
            assert_eq!(global(value.value_type(), false, value).get(), value);
        }
    }

    #[test]
    fn test_set_rules() {
        let g = global(ValueType::I32, true, Value::I32(1));
        assert!(g.set(Value::I32(2)).is_ok());
        assert_eq!(g.get(), Value::I32(2));
        assert!(g.set(Value::I64(2)).is_err());

        let c = global(ValueType::I32, false, Value::I32(1));
        assert!(c.set(Value::I32(2)).is_err());
        assert_eq!(c.get(), Value::I32(1));
    }

    #[test]
    fn test_initializer_must_match() {
        let ty = GlobalType {
            value_type: ValueType::F32,
            mutable:    false,
        };
        assert!(Global::new(ty, Value::I32(0)).is_err());
    }
}
