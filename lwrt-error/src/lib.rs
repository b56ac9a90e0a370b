// LWRT - lwrt-error
// Module: Error Handling
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error handling for the lwrt runtime.
//!
//! Two layers live here:
//!
//! - A small, copyable [`Error`] (category + numeric code + static message)
//!   used for plumbing failures that have no richer type, in the same shape
//!   as every other error in the workspace.
//! - The typed taxonomies an embedder actually matches on:
//!
//! | Type          | Raised by            | Variants |
//! |---------------|----------------------|----------|
//! | [`LoadError`] | module loader        | malformed encoding, failed validation |
//! | [`LinkError`] | linker               | unresolved import, type mismatch, start trap, limits, segments |
//! | [`Trap`]      | execution engine     | out of bounds, divide by zero, ... , process exit |
//! | [`CallError`] | embedding API        | missing export, bad arguments, wrapped trap |
//!
//! # Error Codes
//!
//! - Execution traps: 1000-1099
//! - Loading: 2000-2099
//! - Linking: 3000-3099
//! - Calls: 4000-4099
//! - Host and WASI: 5000-5099
//!
//! # Usage
//!
//! ```
//! use lwrt_error::{codes, Error, ErrorCategory, Trap, ToErrorCategory};
//!
//! let error = Error::new(ErrorCategory::Memory, codes::MEMORY_OUT_OF_BOUNDS, "read past end");
//! assert_eq!(error.code, codes::MEMORY_OUT_OF_BOUNDS);
//!
//! let trap = Trap::DivideByZero;
//! assert_eq!(trap.to_category(), ErrorCategory::RuntimeTrap);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error codes for lwrt
pub mod codes;
/// Error and error handling types
pub mod errors;
/// Typed error taxonomies
pub mod kinds;

pub mod prelude;

pub use errors::{Error, ErrorCategory, ErrorSource};
pub use kinds::{CallError, LinkError, LoadError, Trap};

/// A specialized `Result` type for lwrt plumbing operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error conversion trait for converting to specific error categories
pub trait ToErrorCategory {
    /// Convert the error to a specific category
    fn to_category(&self) -> ErrorCategory;
}
