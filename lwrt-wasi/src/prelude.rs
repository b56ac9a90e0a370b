// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for lwrt-wasi

pub use std::{
    collections::HashMap,
    string::{String, ToString},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    vec::Vec,
};

pub use lwrt_error::{Error, Trap};
pub use lwrt_foundation::{
    tracing::{debug, trace, warn},
    FuncType, MemoryAccessor, Value, ValueType,
};
pub use lwrt_host::{CallbackRegistry, HostContext, HostFunc};

pub use crate::{
    ctx::{CaptureBuffer, WasiCtx, WasiCtxBuilder},
    errno::{self, Errno},
};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
