// LWRT - lwrt-math
// Module: WebAssembly Numeric Operations
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Numeric operations whose WebAssembly semantics differ from the obvious
//! Rust operator.
//!
//! Plain wrapping arithmetic, shifts and rotates are a single `wrapping_*`
//! call and live in the interpreter. What lives here:
//!
//! - integer division and remainder, which trap on a zero divisor and on
//!   signed overflow
//! - float `min`/`max`, which propagate NaN and order `-0.0` below `+0.0`
//! - float `nearest`, which rounds half to even
//! - float to integer truncation, both the trapping and the saturating form

use lwrt_error::Trap;

/// Result of an operation that may trap.
pub type TrapResult<T> = core::result::Result<T, Trap>;

macro_rules! int_div_ops {
    ($signed:ty, $unsigned:ty, $div_s:ident, $div_u:ident, $rem_s:ident, $rem_u:ident) => {
        /// Signed division, truncating toward zero.
        ///
        /// # Errors
        ///
        /// [`Trap::DivideByZero`] if `rhs` is zero, [`Trap::IntegerOverflow`]
        /// for `MIN / -1`.
        pub fn $div_s(lhs: $signed, rhs: $signed) -> TrapResult<$signed> {
            if rhs == 0 {
                return Err(Trap::DivideByZero);
            }
            if lhs == <$signed>::MIN && rhs == -1 {
                return Err(Trap::IntegerOverflow);
            }
            Ok(lhs.wrapping_div(rhs))
        }

        /// Unsigned division.
        ///
        /// # Errors
        ///
        /// [`Trap::DivideByZero`] if `rhs` is zero.
        pub fn $div_u(lhs: $signed, rhs: $signed) -> TrapResult<$signed> {
            if rhs == 0 {
                return Err(Trap::DivideByZero);
            }
            Ok(((lhs as $unsigned) / (rhs as $unsigned)) as $signed)
        }

        /// Signed remainder; the sign follows the dividend and `MIN % -1` is 0.
        ///
        /// # Errors
        ///
        /// [`Trap::DivideByZero`] if `rhs` is zero.
        pub fn $rem_s(lhs: $signed, rhs: $signed) -> TrapResult<$signed> {
            if rhs == 0 {
                return Err(Trap::DivideByZero);
            }
            Ok(lhs.wrapping_rem(rhs))
        }

        /// Unsigned remainder.
        ///
        /// # Errors
        ///
        /// [`Trap::DivideByZero`] if `rhs` is zero.
        pub fn $rem_u(lhs: $signed, rhs: $signed) -> TrapResult<$signed> {
            if rhs == 0 {
                return Err(Trap::DivideByZero);
            }
            Ok(((lhs as $unsigned) % (rhs as $unsigned)) as $signed)
        }
    };
}

int_div_ops!(i32, u32, i32_div_s, i32_div_u, i32_rem_s, i32_rem_u);
int_div_ops!(i64, u64, i64_div_s, i64_div_u, i64_rem_s, i64_rem_u);

macro_rules! float_ops {
    ($float:ty, $min:ident, $max:ident, $nearest:ident) => {
        /// WebAssembly `min`: NaN if either operand is NaN, `-0.0 < +0.0`.
        #[must_use]
        pub fn $min(lhs: $float, rhs: $float) -> $float {
            if lhs.is_nan() || rhs.is_nan() {
                return <$float>::NAN;
            }
            if lhs == rhs {
                // Only differs for signed zeros
                return if lhs.is_sign_negative() { lhs } else { rhs };
            }
            lhs.min(rhs)
        }

        /// WebAssembly `max`: NaN if either operand is NaN, `+0.0 > -0.0`.
        #[must_use]
        pub fn $max(lhs: $float, rhs: $float) -> $float {
            if lhs.is_nan() || rhs.is_nan() {
                return <$float>::NAN;
            }
            if lhs == rhs {
                return if lhs.is_sign_positive() { lhs } else { rhs };
            }
            lhs.max(rhs)
        }

        /// WebAssembly `nearest`: round to integral, ties to even.
        #[must_use]
        pub fn $nearest(value: $float) -> $float {
            value.round_ties_even()
        }
    };
}

float_ops!(f32, f32_min, f32_max, f32_nearest);
float_ops!(f64, f64_min, f64_max, f64_nearest);

/// Truncates `value` and checks it lies in `[lo, hi)`.
///
/// All bounds used below are powers of two and therefore exact in `f64`,
/// and every `f32` widens to `f64` exactly.
fn checked_trunc(value: f64, lo: f64, hi: f64) -> TrapResult<f64> {
    if value.is_nan() {
        return Err(Trap::InvalidConversion);
    }
    let truncated = value.trunc();
    if truncated < lo || truncated >= hi {
        return Err(Trap::IntegerOverflow);
    }
    Ok(truncated)
}

const TWO_POW_31: f64 = 2_147_483_648.0;
const TWO_POW_32: f64 = 4_294_967_296.0;
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// `i32.trunc_f64_s` (and `_f32_s` after widening).
///
/// # Errors
///
/// [`Trap::InvalidConversion`] for NaN, [`Trap::IntegerOverflow`] when the
/// truncated value does not fit.
pub fn i32_trunc_s(value: f64) -> TrapResult<i32> {
    checked_trunc(value, -TWO_POW_31, TWO_POW_31).map(|t| t as i32)
}

/// `i32.trunc_f64_u` (and `_f32_u` after widening).
///
/// # Errors
///
/// As [`i32_trunc_s`].
pub fn i32_trunc_u(value: f64) -> TrapResult<i32> {
    checked_trunc(value, 0.0, TWO_POW_32).map(|t| t as u32 as i32)
}

/// `i64.trunc_f64_s` (and `_f32_s` after widening).
///
/// # Errors
///
/// As [`i32_trunc_s`].
pub fn i64_trunc_s(value: f64) -> TrapResult<i64> {
    checked_trunc(value, -TWO_POW_63, TWO_POW_63).map(|t| t as i64)
}

/// `i64.trunc_f64_u` (and `_f32_u` after widening).
///
/// # Errors
///
/// As [`i32_trunc_s`].
pub fn i64_trunc_u(value: f64) -> TrapResult<i64> {
    checked_trunc(value, 0.0, TWO_POW_64).map(|t| t as u64 as i64)
}

// Rust `as` casts from float to int saturate and map NaN to 0, which is
// exactly the `trunc_sat` family.

/// `i32.trunc_sat_f64_s`
#[must_use]
pub fn i32_trunc_sat_s(value: f64) -> i32 {
    value as i32
}

/// `i32.trunc_sat_f64_u`
#[must_use]
pub fn i32_trunc_sat_u(value: f64) -> i32 {
    value as u32 as i32
}

/// `i64.trunc_sat_f64_s`
#[must_use]
pub fn i64_trunc_sat_s(value: f64) -> i64 {
    value as i64
}

/// `i64.trunc_sat_f64_u`
#[must_use]
pub fn i64_trunc_sat_u(value: f64) -> i64 {
    value as u64 as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_traps() {
        assert_eq!(i32_div_s(1, 0), Err(Trap::DivideByZero));
        assert_eq!(i32_div_s(i32::MIN, -1), Err(Trap::IntegerOverflow));
        assert_eq!(i32_rem_s(i32::MIN, -1), Ok(0));
        assert_eq!(i64_rem_u(7, 0), Err(Trap::DivideByZero));
        assert_eq!(i32_div_u(-1, 2), Ok(0x7fff_ffff));
        assert_eq!(i32_rem_s(-7, 2), Ok(-1));
    }

    #[test]
    fn test_min_max_signed_zero_and_nan() {
        assert!(f32_min(-0.0, 0.0).is_sign_negative());
        assert!(f32_min(0.0, -0.0).is_sign_negative());
        assert!(f64_max(-0.0, 0.0).is_sign_positive());
        assert!(f64_max(f64::NAN, 1.0).is_nan());
        assert!(f32_min(1.0, f32::NAN).is_nan());
        assert_eq!(f64_min(1.0, 2.0), 1.0);
    }

    #[test]
    fn test_nearest_ties_to_even() {
        assert_eq!(f32_nearest(2.5), 2.0);
        assert_eq!(f32_nearest(3.5), 4.0);
        assert_eq!(f64_nearest(-0.5), -0.0);
        assert!(f64_nearest(-0.5).is_sign_negative());
    }

    #[test]
    fn test_trapping_truncation_bounds() {
        assert_eq!(i32_trunc_s(-2_147_483_648.9), Ok(i32::MIN));
        assert_eq!(i32_trunc_s(2_147_483_648.0), Err(Trap::IntegerOverflow));
        assert_eq!(i32_trunc_u(-0.9), Ok(0));
        assert_eq!(i32_trunc_u(-1.0), Err(Trap::IntegerOverflow));
        assert_eq!(i32_trunc_u(4_294_967_295.5), Ok(-1));
        assert_eq!(i64_trunc_s(f64::NAN), Err(Trap::InvalidConversion));
        assert_eq!(i64_trunc_u(f64::INFINITY), Err(Trap::IntegerOverflow));
    }

    #[test]
    fn test_saturating_truncation() {
        assert_eq!(i32_trunc_sat_s(f64::NAN), 0);
        assert_eq!(i32_trunc_sat_s(1e20), i32::MAX);
        assert_eq!(i32_trunc_sat_u(-5.0), 0);
        assert_eq!(i32_trunc_sat_u(1e20), -1);
        assert_eq!(i64_trunc_sat_s(f64::NEG_INFINITY), i64::MIN);
    }
}
