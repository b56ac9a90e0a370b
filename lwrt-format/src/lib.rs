// LWRT - lwrt-format
// Module: WebAssembly Format Handling
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly binary format handling for lwrt.
//!
//! Constants for the module header, section identifiers and opcodes, plus
//! the primitive readers (LEB128 integers, floats, names, vectors) the
//! decoder builds on. Every reader takes the whole buffer and a position and
//! returns `(value, bytes_read)`; failures are reported as
//! [`LoadError::MalformedEncoding`] carrying the absolute offset.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod binary;
pub mod opcodes;

pub use binary::*;
pub use lwrt_error::LoadError;

/// Result type for format-level reads
pub type Result<T> = core::result::Result<T, LoadError>;
