// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for lwrt
//!
//! Everything an embedder usually needs in one import:
//!
//! ```
//! use lwrt::prelude::*;
//! let engine = Engine::new(EngineConfig::default());
//! # let _ = engine;
//! ```

pub use std::sync::Arc;

pub use lwrt_error::{CallError, Error, ErrorCategory, LinkError, LoadError, Trap};
pub use lwrt_foundation::{
    tracing::{debug, trace, warn},
    ExternKind, FuncType, GlobalType, MemoryAccessor, MemoryType, TableType, Value, ValueType,
};
pub use lwrt_host::{CallbackRegistry, HostBuilder, HostContext, HostFunc};
pub use lwrt_runtime::{
    EngineConfig, EnginePreset, ExecutionStats, Extern, Linker, MemoryView, ModuleInstance,
};
pub use lwrt_wasi::{CaptureBuffer, WasiCtx, WasiCtxBuilder, WASI_MODULE};

pub use crate::{
    engine::Engine,
    instance::{Completion, Instance},
    module::{load, Module},
};
