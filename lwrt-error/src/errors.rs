// LWRT - lwrt-error
// Module: Error Types
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

/// Categorized error type shared across the lwrt crates
///
/// `Error` is deliberately small and `Copy`: a category, a numeric code and
/// a static message. The typed taxonomies in [`crate::kinds`] convert into it
/// when a caller only needs a uniform representation.
use core::fmt;

use crate::{codes, kinds, ToErrorCategory};

/// `Error` categories for lwrt operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Core WebAssembly errors
    Core        = 1,
    /// Resource errors (memory, tables, etc.)
    Resource    = 3,
    /// Memory errors
    Memory      = 4,
    /// Validation errors
    Validation  = 5,
    /// Type errors
    Type        = 6,
    /// Runtime errors (general)
    Runtime     = 7,
    /// System errors
    System      = 8,
    /// Parse errors
    Parse       = 10,
    /// WebAssembly trap errors
    RuntimeTrap = 13,
    /// Linking errors
    Linking     = 14,
    /// I/O errors
    Io          = 20,
}

/// Base trait for all error types
pub trait ErrorSource: fmt::Debug + Send + Sync {
    /// Get the error code
    fn code(&self) -> u16;

    /// Get the error message
    fn message(&self) -> &'static str;

    /// Get the error category
    fn category(&self) -> ErrorCategory;
}

/// lwrt `Error` type
///
/// Used for host-side plumbing failures: a host function reporting an error,
/// a view outliving its instance, an engine invariant that did not hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  &'static str,
}

impl Error {
    /// The instance that owned a resource has been dropped
    pub const INSTANCE_DROPPED: Self = Self::new(
        ErrorCategory::Resource,
        codes::INSTANCE_DROPPED,
        "Owning instance has been dropped",
    );
    /// A host function returned values that do not match its signature
    pub const HOST_RESULT_MISMATCH: Self = Self::new(
        ErrorCategory::Type,
        codes::HOST_RESULT_MISMATCH,
        "Host function results do not match its signature",
    );
    /// A host function requires the caller's linear memory
    pub const MISSING_MEMORY: Self = Self::new(
        ErrorCategory::Memory,
        codes::MISSING_MEMORY,
        "Caller has no linear memory",
    );

    /// Create a new error.
    #[must_use]
    pub const fn new(category: ErrorCategory, code: u16, message: &'static str) -> Self {
        Self {
            category,
            code,
            message,
        }
    }

    /// Create a host I/O error
    #[must_use]
    pub const fn io_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Io, codes::IO_ERROR, message)
    }

    /// Create a runtime error for a broken engine invariant
    #[must_use]
    pub const fn engine_invariant(message: &'static str) -> Self {
        Self::new(ErrorCategory::Runtime, codes::ENGINE_INVARIANT, message)
    }

    /// Create a memory out of bounds error
    #[must_use]
    pub const fn memory_out_of_bounds(message: &'static str) -> Self {
        Self::new(ErrorCategory::Memory, codes::MEMORY_OUT_OF_BOUNDS, message)
    }

    /// Create a type mismatch error
    #[must_use]
    pub const fn type_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Type, codes::ARITY_OR_TYPE_MISMATCH, message)
    }

    /// Check if this is a memory error
    #[must_use]
    pub fn is_memory_error(&self) -> bool {
        self.category == ErrorCategory::Memory
    }

    /// Check if this is a trap
    #[must_use]
    pub fn is_trap(&self) -> bool {
        self.category == ErrorCategory::RuntimeTrap
    }

    /// Check if this is a linking error
    #[must_use]
    pub fn is_linking_error(&self) -> bool {
        self.category == ErrorCategory::Linking
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}][E{:04X}] {}",
            self.category, self.code, self.message
        )
    }
}

impl std::error::Error for Error {}

impl ErrorSource for Error {
    fn code(&self) -> u16 {
        self.code
    }

    fn message(&self) -> &'static str {
        self.message
    }

    fn category(&self) -> ErrorCategory {
        self.category
    }
}

impl ToErrorCategory for Error {
    fn to_category(&self) -> ErrorCategory {
        self.category
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::new(ErrorCategory::System, codes::IO_ERROR, "Formatting error")
    }
}

impl From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Self::io_error("Host I/O failure")
    }
}

// -- From<kinds::X> for Error implementations --
impl From<kinds::Trap> for Error {
    fn from(trap: kinds::Trap) -> Self {
        if let kinds::Trap::Host(inner) = trap {
            return inner;
        }
        Self::new(ErrorCategory::RuntimeTrap, trap.code(), trap.message())
    }
}

impl From<kinds::LoadError> for Error {
    fn from(e: kinds::LoadError) -> Self {
        Self::new(e.category(), e.code(), e.message())
    }
}

impl From<&kinds::LinkError> for Error {
    fn from(e: &kinds::LinkError) -> Self {
        Self::new(ErrorCategory::Linking, e.code(), e.message())
    }
}

impl From<kinds::LinkError> for Error {
    fn from(e: kinds::LinkError) -> Self {
        Self::from(&e)
    }
}

impl From<kinds::CallError> for Error {
    fn from(e: kinds::CallError) -> Self {
        match e {
            kinds::CallError::Trap(trap) => Self::from(trap),
            other => Self::new(other.category(), other.code(), other.message()),
        }
    }
}
