// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Tracing support for the lwrt runtime
//!
//! Wraps the `tracing` crate and provides span helpers for the phases every
//! embedder wants to see: loading a module, resolving its imports, running
//! a call and touching memory. Downstream crates import the macros from
//! here so the whole workspace agrees on one `tracing` version.

pub use ::tracing::{debug, error, info, trace, warn};
pub use ::tracing::{debug_span, error_span, info_span, span, trace_span, warn_span};
pub use ::tracing::{event, field, instrument, Level, Span};

/// Trace events for module lifecycle
#[derive(Debug, Clone)]
pub struct ModuleTrace;

impl ModuleTrace {
    /// Create a span for module loading
    #[inline]
    pub fn loading(size: usize) -> Span {
        debug_span!("module_load", binary_size = %size)
    }

    /// Create a span for decoding a single section
    #[inline]
    pub fn section(id: u8, size: u32) -> Span {
        trace_span!("module_section", id = %id, size = %size)
    }

    /// Create a span for module instantiation
    #[inline]
    pub fn instantiating(imports: usize, functions: usize) -> Span {
        debug_span!("module_instantiate", imports = %imports, functions = %functions)
    }
}

/// Trace events for import operations
#[derive(Debug, Clone)]
pub struct ImportTrace;

impl ImportTrace {
    /// Create a span for import registration
    #[inline]
    pub fn registering(module: &str, field: &str) -> Span {
        trace_span!("import_register", module = %module, field = %field)
    }

    /// Create a span for import resolution
    #[inline]
    pub fn resolving(idx: usize, module: &str, field: &str) -> Span {
        trace_span!("import_resolve", index = %idx, module = %module, field = %field)
    }
}

/// Trace events for function execution
#[derive(Debug, Clone)]
pub struct ExecutionTrace;

impl ExecutionTrace {
    /// Create a span for an exported call
    #[inline]
    pub fn export_call(name: &str, args: usize) -> Span {
        debug_span!("call_export", name = %name, args = %args)
    }

    /// Create a span for function execution
    #[inline]
    pub fn function(func_idx: u32, depth: usize) -> Span {
        trace_span!("execute_function", func_idx = %func_idx, depth = %depth)
    }

    /// Create a span for host function calls
    #[inline]
    pub fn host_call(module: &str, function: &str) -> Span {
        trace_span!("host_call", module = %module, function = %function)
    }
}

/// Trace events for memory operations
#[derive(Debug, Clone)]
pub struct MemoryTrace;

impl MemoryTrace {
    /// Create a span for memory growth
    #[inline]
    pub fn growing(current_pages: u32, delta: u32) -> Span {
        trace_span!("memory_grow", current = %current_pages, delta = %delta)
    }

    /// Create a span for host-side memory access
    #[inline]
    pub fn accessing(offset: u32, len: usize) -> Span {
        trace_span!("memory_access", offset = %offset, len = %len)
    }
}
