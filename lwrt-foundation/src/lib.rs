// LWRT - lwrt-foundation
// Module: Foundation Library
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Foundation library for the lwrt WebAssembly runtime.
//!
//! This crate holds the vocabulary shared by the loader, the runtime, host
//! functions and WASI:
//!
//! - [`types`]: value types, function signatures, limits and the memory,
//!   table and global descriptors.
//! - [`values`]: runtime values with bit-exact floats.
//! - [`memory_accessor`]: the narrow view of linear memory that host
//!   functions are given.
//! - [`tracing`]: re-exports of the `tracing` macros plus span helpers used
//!   across the workspace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod memory_accessor;
pub mod prelude;
pub mod tracing;
pub mod types;
pub mod values;

pub use lwrt_error::{Error, ErrorCategory, Result};
pub use lwrt_math::{FloatBits32, FloatBits64};
pub use memory_accessor::MemoryAccessor;
pub use types::{
    ExternKind, FuncType, GlobalType, Limits, MemoryType, RefType, TableType, ValueType,
    WASM_PAGE_SIZE,
};
pub use values::Value;
