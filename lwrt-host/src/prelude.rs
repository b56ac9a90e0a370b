// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for lwrt-host
//!
//! Re-exports the foundation types used by host function modules.

pub use std::{
    collections::HashMap,
    fmt,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};

pub use lwrt_error::{codes, Error, ErrorCategory, Trap};
pub use lwrt_foundation::{
    tracing::{debug, trace, warn},
    FuncType, MemoryAccessor, Value, ValueType,
};

pub use crate::{
    builder::HostBuilder,
    callback::CallbackRegistry,
    function::{HostContext, HostFunc, HostFunctionHandler},
};
