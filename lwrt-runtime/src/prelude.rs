// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for lwrt-runtime
//!
//! Re-exports the types shared by the memory, table, linker and engine
//! modules.

pub use std::{
    collections::HashMap,
    fmt,
    string::{String, ToString},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    vec::Vec,
};

pub use lwrt_decoder::{Instruction, Module};
pub use lwrt_error::{codes, CallError, Error, ErrorCategory, LinkError, Trap};
pub use lwrt_foundation::{
    tracing::{debug, trace, warn},
    ExternKind, FuncType, GlobalType, Limits, MemoryAccessor, MemoryType, TableType, Value,
    ValueType, WASM_PAGE_SIZE,
};
pub use lwrt_host::{CallbackRegistry, HostContext, HostFunc};

pub use crate::{
    config::{EngineConfig, EnginePreset},
    func::FuncInstance,
    global::Global,
    memory::{Memory, MemoryView},
    module_instance::{Extern, ModuleInstance},
    table::Table,
};

/// Lock a mutex, recovering the data if another thread panicked while
/// holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
