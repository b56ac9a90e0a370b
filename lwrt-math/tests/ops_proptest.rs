// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Property tests for the trapping numeric operations.

use lwrt_error::Trap;
use lwrt_math::{i32_div_s, i32_rem_s, i32_trunc_s, i32_trunc_sat_s, i64_div_u};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_div_rem_identity(lhs in any::<i32>(), rhs in any::<i32>().prop_filter("non-zero", |r| *r != 0)) {
        prop_assume!(!(lhs == i32::MIN && rhs == -1));
        let q = i32_div_s(lhs, rhs).unwrap();
        let r = i32_rem_s(lhs, rhs).unwrap();
        prop_assert_eq!(q.wrapping_mul(rhs).wrapping_add(r), lhs);
    }

    #[test]
    fn test_zero_divisor_always_traps(lhs in any::<i64>()) {
        prop_assert_eq!(i64_div_u(lhs, 0), Err(Trap::DivideByZero));
    }

    #[test]
    fn test_in_range_truncation_agrees_with_saturation(value in -2_147_483_648.0f64..2_147_483_647.0) {
        prop_assert_eq!(i32_trunc_s(value), Ok(i32_trunc_sat_s(value)));
    }
}
