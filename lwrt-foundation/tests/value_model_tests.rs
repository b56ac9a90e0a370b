// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Value and type model tests

use lwrt_foundation::{
    ExternKind, FuncType, GlobalType, Limits, MemoryType, Value, ValueType,
};
use proptest::prelude::*;

#[test]
fn test_extern_kind_decoding() -> lwrt_foundation::Result<()> {
    assert_eq!(ExternKind::from_binary(0x02)?, ExternKind::Memory);
    assert_eq!(ExternKind::from_binary(0x03)?.to_string(), "global");
    assert!(ExternKind::from_binary(0x04).is_err());
    Ok(())
}

#[test]
fn test_memory_type_limits() {
    let ty = MemoryType::new(1, Some(2));
    assert_eq!(ty.limits, Limits::new(1, Some(2)));
    let global = GlobalType {
        value_type: ValueType::I64,
        mutable:    true,
    };
    assert!(Value::I64(3).matches_type(global.value_type));
}

#[test]
fn test_func_types_compare_structurally() {
    let a = FuncType::new([ValueType::I32], []);
    let b = FuncType {
        params:  vec![ValueType::I32],
        results: vec![],
    };
    assert_eq!(a, b);
    assert_ne!(a, FuncType::new([ValueType::I64], []));
}

proptest! {
    #[test]
    fn test_limits_subtyping_is_reflexive(min in 0u32..1000, max in proptest::option::of(1000u32..2000)) {
        let limits = Limits::new(min, max);
        prop_assert!(limits.is_subtype_of(&limits));
    }

    #[test]
    fn test_unbounded_never_satisfies_bounded_import(min in 0u32..1000, max in 0u32..1000) {
        prop_assert!(!Limits::new(min, None).is_subtype_of(&Limits::new(0, Some(max))));
    }
}
