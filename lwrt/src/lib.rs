// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Lightweight WebAssembly Runtime (LWRT)
//!
//! A minimal embeddable WebAssembly runtime: load a binary module, link
//! its imports against host functions (including a WASI preview 1 shim) or
//! other instances, instantiate it, call its exports and inspect its
//! linear memory.
//!
//! ## Features
//!
//! - Validating loader for the core binary format
//! - Non-recursive interpreter with call depth, fuel and deadline limits
//! - Explicit import linking with cross-instance imports
//! - `wasi_snapshot_preview1` stdio, arguments, environment and clocks
//!
//! ## Usage
//!
//! ```
//! use lwrt::prelude::*;
//!
//! // (module (func (export "add") (param i32 i32) (result i32)
//! //   local.get 0 local.get 1 i32.add))
//! let bytes = [
//!     0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, 0x01, 0x07, 0x01, 0x60, 0x02, 0x7f,
//!     0x7f, 0x01, 0x7f, 0x03, 0x02, 0x01, 0x00, 0x07, 0x07, 0x01, 0x03, 0x61, 0x64, 0x64,
//!     0x00, 0x00, 0x0a, 0x09, 0x01, 0x07, 0x00, 0x20, 0x00, 0x20, 0x01, 0x6a, 0x0b,
//! ];
//! let module = load(&bytes)?;
//! let instance = Engine::default().instantiate(&module, &Linker::new())?;
//! let result = instance.call_export("add", &[Value::I32(2), Value::I32(3)])?;
//! assert_eq!(result, Completion::Returned(vec![Value::I32(5)]));
//! # Ok::<(), lwrt::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod instance;
pub mod module;
pub mod prelude;

pub use engine::Engine;
pub use instance::{Completion, Instance};
pub use lwrt_error::{CallError, Error, LinkError, LoadError, Trap};
pub use lwrt_foundation::{ExternKind, FuncType, Value, ValueType};
pub use lwrt_host::{CallbackRegistry, HostBuilder, HostContext, HostFunc};
pub use lwrt_runtime::{EngineConfig, EnginePreset, ExecutionStats, Linker, MemoryView};
pub use lwrt_wasi as wasi;
pub use module::{load, Module};

/// WebAssembly core version this runtime implements
pub const CORE_VERSION: &str = "1.0";
