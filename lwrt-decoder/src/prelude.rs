// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude for lwrt-decoder

pub use lwrt_error::LoadError;
pub use lwrt_foundation::{
    tracing::{debug, trace, warn},
    ExternKind, FloatBits32, FloatBits64, FuncType, GlobalType, Limits, MemoryType, RefType,
    TableType, ValueType,
};

/// Result type used throughout the decoder
pub type Result<T> = core::result::Result<T, LoadError>;
