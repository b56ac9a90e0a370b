// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Lightweight WebAssembly Runtime (LWRT) - Runtime Implementation
//!
//! Instances, their linear memory, tables and globals, the import
//! [`Linker`], and the stackless interpreter that executes function bodies.
//!
//! ```
//! use lwrt_runtime::{EngineConfig, Linker, Memory};
//! use lwrt_foundation::MemoryType;
//! use std::sync::Arc;
//!
//! let mut linker = Linker::new();
//! let memory = Memory::new(MemoryType::new(1, None), 16).unwrap();
//! linker.define("env", "memory", Arc::new(memory)).unwrap();
//! assert!(linker.get("env", "memory").is_some());
//! # let _ = EngineConfig::default();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod execution;
pub mod func;
pub mod global;
pub mod linker;
pub mod memory;
pub mod module_instance;
pub mod prelude;
pub mod stackless;
pub mod table;

pub use config::{EngineConfig, EnginePreset};
pub use execution::ExecutionStats;
pub use func::FuncInstance;
pub use global::Global;
pub use linker::Linker;
pub use lwrt_error::{CallError, Error, LinkError, Result, Trap};
pub use memory::{Memory, MemoryView, PAGE_SIZE};
pub use module_instance::{check_arguments, Extern, ModuleInstance};
pub use stackless::StacklessEngine;
pub use table::Table;
