// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Conversions from the typed taxonomies into the uniform `Error`.

use lwrt_error::{
    codes, CallError, Error, ErrorCategory, ErrorSource, LinkError, LoadError, ToErrorCategory,
    Trap,
};

#[test]
fn test_trap_into_error_keeps_code() {
    let error: Error = Trap::OutOfBounds.into();
    assert_eq!(error.category, ErrorCategory::RuntimeTrap);
    assert_eq!(error.code, codes::MEMORY_OUT_OF_BOUNDS);
}

#[test]
fn test_load_error_into_error_keeps_reason() {
    let error: Error = LoadError::malformed(4, "bad magic").into();
    assert_eq!(error.category, ErrorCategory::Parse);
    assert_eq!(error.code, codes::MALFORMED_ENCODING);
    assert_eq!(error.message, "bad magic");
}

#[test]
fn test_link_error_categories() {
    let unresolved = LinkError::UnresolvedImport {
        module: "env".into(),
        name:   "missing_fn".into(),
    };
    assert_eq!(unresolved.to_category(), ErrorCategory::Linking);
    assert_eq!(unresolved.to_string(), "unresolved import env.missing_fn");

    let start = LinkError::StartFailed(Trap::Unreachable);
    let error: Error = start.into();
    assert_eq!(error.code, codes::START_FAILED);
}

#[test]
fn test_call_error_trap_flattens_to_trap_code() {
    let error: Error = CallError::Trap(Trap::StackOverflow).into();
    assert_eq!(error.code, codes::STACK_OVERFLOW);

    let mismatch = CallError::ArityOrTypeMismatch {
        expected_params: 2,
        given:           1,
        first_bad_arg:   None,
    };
    assert_eq!(mismatch.code(), codes::ARITY_OR_TYPE_MISMATCH);
    assert_eq!(mismatch.to_string(), "expected 2 arguments, 1 given");
}

#[test]
fn test_host_error_round_trips_through_trap() {
    let trap: Trap = Error::MISSING_MEMORY.into();
    assert_eq!(trap, Trap::Host(Error::MISSING_MEMORY));
    assert_eq!(trap.to_category(), ErrorCategory::Memory);
}
