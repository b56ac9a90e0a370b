// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude for lwrt-foundation
//!
//! Re-exports the types that nearly every downstream module touches.

pub use std::{
    collections::HashMap,
    fmt,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};

pub use lwrt_error::{codes, Error, ErrorCategory, Result, Trap};

pub use crate::{
    memory_accessor::MemoryAccessor,
    types::{
        ExternKind, FuncType, GlobalType, Limits, MemoryType, RefType, TableType, ValueType,
        WASM_PAGE_SIZE,
    },
    values::Value,
    FloatBits32, FloatBits64,
};
