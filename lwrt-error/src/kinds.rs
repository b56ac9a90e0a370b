// LWRT - lwrt-error
// Module: Error Kinds
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Typed error taxonomies surfaced to embedders.
//!
//! Each taxonomy belongs to exactly one stage: [`LoadError`] to the loader,
//! [`LinkError`] to instantiation, [`Trap`] to execution and [`CallError`] to
//! the embedding API boundary. None of them is ever swallowed.

use core::fmt::{self, Display};

use crate::{codes, Error, ErrorCategory, ErrorSource, ToErrorCategory};

/// Failure to turn bytes into a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// The binary encoding is malformed or truncated.
    MalformedEncoding {
        /// Byte offset at which decoding stopped
        offset: usize,
        /// What was wrong
        reason: &'static str,
    },
    /// The module decoded but is not structurally valid.
    ValidationFailed {
        /// Function index (in the function index space) if the failure is in a body
        func:   Option<u32>,
        /// What was wrong
        reason: &'static str,
    },
}

impl LoadError {
    /// Create a malformed encoding error at `offset`
    #[must_use]
    pub const fn malformed(offset: usize, reason: &'static str) -> Self {
        Self::MalformedEncoding { offset, reason }
    }

    /// Create a module-level validation error
    #[must_use]
    pub const fn invalid(reason: &'static str) -> Self {
        Self::ValidationFailed { func: None, reason }
    }

    /// Create a validation error located in function `func`
    #[must_use]
    pub const fn invalid_in(func: u32, reason: &'static str) -> Self {
        Self::ValidationFailed {
            func: Some(func),
            reason,
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEncoding { offset, reason } => {
                write!(f, "malformed encoding at offset {offset:#x}: {reason}")
            },
            Self::ValidationFailed {
                func: Some(func),
                reason,
            } => write!(f, "validation failed in function {func}: {reason}"),
            Self::ValidationFailed { func: None, reason } => {
                write!(f, "validation failed: {reason}")
            },
        }
    }
}

impl std::error::Error for LoadError {}

impl ErrorSource for LoadError {
    fn code(&self) -> u16 {
        match self {
            Self::MalformedEncoding { .. } => codes::MALFORMED_ENCODING,
            Self::ValidationFailed { .. } => codes::VALIDATION_FAILED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::MalformedEncoding { reason, .. } | Self::ValidationFailed { reason, .. } => {
                reason
            },
        }
    }

    fn category(&self) -> ErrorCategory {
        self.to_category()
    }
}

impl ToErrorCategory for LoadError {
    fn to_category(&self) -> ErrorCategory {
        match self {
            Self::MalformedEncoding { .. } => ErrorCategory::Parse,
            Self::ValidationFailed { .. } => ErrorCategory::Validation,
        }
    }
}

/// A terminal runtime fault that unwinds the current call chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    /// Memory access outside the current size
    OutOfBounds,
    /// Integer division or remainder by zero
    DivideByZero,
    /// Signed division overflow or out-of-range float truncation
    IntegerOverflow,
    /// NaN truncated to an integer
    InvalidConversion,
    /// `unreachable` executed
    Unreachable,
    /// Indirect call index outside the table
    UndefinedElement,
    /// Indirect call through an empty table slot
    UninitializedElement,
    /// Indirect call target's type differs from the call site's
    IndirectCallTypeMismatch,
    /// Call depth or operand stack bound exceeded
    StackOverflow,
    /// Fuel or wall-clock budget exhausted
    Cancelled,
    /// The guest requested process termination with this code
    ProcessExit(i32),
    /// A host function failed
    Host(Error),
}

impl Trap {
    /// Whether this is the distinguished process exit signal
    #[must_use]
    pub const fn is_exit(&self) -> bool {
        matches!(self, Self::ProcessExit(_))
    }
}

impl Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProcessExit(code) => write!(f, "process exited with code {code}"),
            Self::Host(error) => write!(f, "host function failed: {error}"),
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for Trap {}

impl ErrorSource for Trap {
    fn code(&self) -> u16 {
        match self {
            Self::OutOfBounds => codes::MEMORY_OUT_OF_BOUNDS,
            Self::DivideByZero => codes::DIVIDE_BY_ZERO,
            Self::IntegerOverflow => codes::INTEGER_OVERFLOW,
            Self::InvalidConversion => codes::INVALID_CONVERSION,
            Self::Unreachable => codes::UNREACHABLE_EXECUTED,
            Self::UndefinedElement => codes::UNDEFINED_ELEMENT,
            Self::UninitializedElement => codes::UNINITIALIZED_ELEMENT,
            Self::IndirectCallTypeMismatch => codes::INDIRECT_CALL_TYPE_MISMATCH,
            Self::StackOverflow => codes::STACK_OVERFLOW,
            Self::Cancelled => codes::EXECUTION_CANCELLED,
            Self::ProcessExit(_) => codes::PROCESS_EXIT,
            Self::Host(_) => codes::HOST_TRAP,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::OutOfBounds => "out of bounds memory access",
            Self::DivideByZero => "integer divide by zero",
            Self::IntegerOverflow => "integer overflow",
            Self::InvalidConversion => "invalid conversion to integer",
            Self::Unreachable => "unreachable executed",
            Self::UndefinedElement => "undefined element",
            Self::UninitializedElement => "uninitialized element",
            Self::IndirectCallTypeMismatch => "indirect call type mismatch",
            Self::StackOverflow => "call stack exhausted",
            Self::Cancelled => "execution cancelled",
            Self::ProcessExit(_) => "process exit",
            Self::Host(error) => error.message,
        }
    }

    fn category(&self) -> ErrorCategory {
        self.to_category()
    }
}

impl ToErrorCategory for Trap {
    fn to_category(&self) -> ErrorCategory {
        match self {
            Self::Host(error) => error.category,
            _ => ErrorCategory::RuntimeTrap,
        }
    }
}

impl From<Error> for Trap {
    fn from(error: Error) -> Self {
        Self::Host(error)
    }
}

/// Failure to produce a usable instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// No binding for a declared import
    UnresolvedImport {
        /// Import namespace
        module: String,
        /// Import field name
        name:   String,
    },
    /// The binding's type disagrees with the import declaration
    TypeMismatch {
        /// Import namespace
        module: String,
        /// Import field name
        name:   String,
        /// Which aspect did not match
        reason: &'static str,
    },
    /// The start function trapped
    StartFailed(Trap),
    /// A declared memory or table minimum exceeds the host ceiling
    LimitExceeded {
        /// `"memory"` or `"table"`
        what: &'static str,
    },
    /// An active segment does not fit inside its target
    SegmentOutOfBounds {
        /// `"data"` or `"element"`
        kind:  &'static str,
        /// Segment index
        index: u32,
    },
    /// A linker definition collides with an existing one
    Duplicate {
        /// Namespace
        module: String,
        /// Field name
        name:   String,
    },
}

impl Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedImport { module, name } => {
                write!(f, "unresolved import {module}.{name}")
            },
            Self::TypeMismatch {
                module,
                name,
                reason,
            } => write!(f, "incompatible import type for {module}.{name}: {reason}"),
            Self::StartFailed(trap) => write!(f, "start function failed: {trap}"),
            Self::LimitExceeded { what } => write!(f, "{what} exceeds host limit"),
            Self::SegmentOutOfBounds { kind, index } => {
                write!(f, "{kind} segment {index} does not fit")
            },
            Self::Duplicate { module, name } => write!(f, "{module}.{name} is already defined"),
        }
    }
}

impl std::error::Error for LinkError {}

impl ErrorSource for LinkError {
    fn code(&self) -> u16 {
        match self {
            Self::UnresolvedImport { .. } => codes::UNRESOLVED_IMPORT,
            Self::TypeMismatch { .. } => codes::IMPORT_TYPE_MISMATCH,
            Self::StartFailed(_) => codes::START_FAILED,
            Self::LimitExceeded { .. } => codes::LIMIT_EXCEEDED,
            Self::SegmentOutOfBounds { .. } => codes::SEGMENT_OUT_OF_BOUNDS,
            Self::Duplicate { .. } => codes::DUPLICATE_DEFINITION,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::UnresolvedImport { .. } => "unresolved import",
            Self::TypeMismatch { reason, .. } => reason,
            Self::StartFailed(_) => "start function failed",
            Self::LimitExceeded { .. } => "declared limit exceeds host ceiling",
            Self::SegmentOutOfBounds { .. } => "segment does not fit",
            Self::Duplicate { .. } => "duplicate definition",
        }
    }

    fn category(&self) -> ErrorCategory {
        self.to_category()
    }
}

impl ToErrorCategory for LinkError {
    fn to_category(&self) -> ErrorCategory {
        ErrorCategory::Linking
    }
}

/// Failure at the embedding API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// No export with this name
    NoSuchExport(String),
    /// The export exists but is not a function
    NotAFunction(String),
    /// Arguments do not match the declared parameters; nothing was executed
    ArityOrTypeMismatch {
        /// Declared parameter count
        expected_params: usize,
        /// Number of arguments supplied
        given:           usize,
        /// Index of the first argument whose type is wrong, if arity matched
        first_bad_arg:   Option<usize>,
    },
    /// Execution trapped
    Trap(Trap),
}

impl CallError {
    /// The trap carried by this error, if any
    #[must_use]
    pub fn trap(&self) -> Option<Trap> {
        match self {
            Self::Trap(trap) => Some(*trap),
            _ => None,
        }
    }
}

impl Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchExport(name) => write!(f, "no export named `{name}`"),
            Self::NotAFunction(name) => write!(f, "export `{name}` is not a function"),
            Self::ArityOrTypeMismatch {
                expected_params,
                given,
                first_bad_arg: Some(index),
            } => write!(
                f,
                "argument {index} has the wrong type ({given} given, {expected_params} expected)"
            ),
            Self::ArityOrTypeMismatch {
                expected_params,
                given,
                first_bad_arg: None,
            } => write!(f, "expected {expected_params} arguments, {given} given"),
            Self::Trap(trap) => write!(f, "trap: {trap}"),
        }
    }
}

impl std::error::Error for CallError {}

impl ErrorSource for CallError {
    fn code(&self) -> u16 {
        match self {
            Self::NoSuchExport(_) => codes::NO_SUCH_EXPORT,
            Self::NotAFunction(_) => codes::NOT_A_FUNCTION,
            Self::ArityOrTypeMismatch { .. } => codes::ARITY_OR_TYPE_MISMATCH,
            Self::Trap(_) => codes::CALL_TRAPPED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::NoSuchExport(_) => "no such export",
            Self::NotAFunction(_) => "export is not a function",
            Self::ArityOrTypeMismatch { .. } => "argument arity or type mismatch",
            Self::Trap(trap) => trap.message(),
        }
    }

    fn category(&self) -> ErrorCategory {
        self.to_category()
    }
}

impl ToErrorCategory for CallError {
    fn to_category(&self) -> ErrorCategory {
        match self {
            Self::NoSuchExport(_) | Self::NotAFunction(_) => ErrorCategory::Runtime,
            Self::ArityOrTypeMismatch { .. } => ErrorCategory::Type,
            Self::Trap(trap) => trap.to_category(),
        }
    }
}

impl From<Trap> for CallError {
    fn from(trap: Trap) -> Self {
        Self::Trap(trap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trap_codes_are_distinct() {
        let traps = [
            Trap::OutOfBounds,
            Trap::DivideByZero,
            Trap::IntegerOverflow,
            Trap::InvalidConversion,
            Trap::Unreachable,
            Trap::UndefinedElement,
            Trap::UninitializedElement,
            Trap::IndirectCallTypeMismatch,
            Trap::StackOverflow,
            Trap::Cancelled,
            Trap::ProcessExit(0),
            Trap::Host(Error::INSTANCE_DROPPED),
        ];
        let mut seen: Vec<u16> = traps.iter().map(|t| t.code()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), traps.len());
    }

    #[test]
    fn test_process_exit_is_distinguished() {
        assert!(Trap::ProcessExit(42).is_exit());
        assert!(!Trap::Unreachable.is_exit());
        assert_eq!(Trap::ProcessExit(42).to_string(), "process exited with code 42");
    }

    #[test]
    fn test_load_error_display() {
        let e = LoadError::malformed(0x10, "unexpected end");
        assert_eq!(e.to_string(), "malformed encoding at offset 0x10: unexpected end");
        let v = LoadError::invalid_in(3, "type mismatch");
        assert_eq!(v.to_string(), "validation failed in function 3: type mismatch");
        assert_eq!(v.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_call_error_wraps_trap() {
        let e: CallError = Trap::DivideByZero.into();
        assert_eq!(e.trap(), Some(Trap::DivideByZero));
        assert_eq!(e.to_category(), ErrorCategory::RuntimeTrap);
        assert_eq!(CallError::NoSuchExport("x".into()).trap(), None);
    }
}
