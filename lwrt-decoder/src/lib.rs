// LWRT - lwrt-decoder
// Module: WebAssembly Binary Decoder
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

//! WebAssembly module loader and validator for lwrt
//!
//! [`load`] turns a binary module image into an immutable [`Module`]:
//!
//! 1. The header and section sequence are decoded; any truncation, bad
//!    count, overlong integer or out-of-order section is reported as
//!    [`LoadError::MalformedEncoding`] with the byte offset.
//! 2. Function bodies are decoded into a flat instruction list with block,
//!    `else` and `end` targets resolved to instruction indices.
//! 3. The module is validated: indices, limits, constant expressions,
//!    export name uniqueness, conflicting duplicate imports, and a single
//!    forward type-stack pass per function body. Failures are reported as
//!    [`LoadError::ValidationFailed`].
//!
//! Loading is a pure function of the input bytes; no partial module is
//! ever returned.

pub mod instructions;
pub mod module;
pub mod parser;
pub mod prelude;
pub mod reader;
pub mod sections;
pub mod validation;

pub use instructions::{
    BlockType, ConvertOp, FloatBinOp, FloatRelOp, FloatUnOp, Instruction, IntBinOp, IntRelOp,
    IntUnOp, LoadOp, StoreOp,
};
pub use lwrt_error::LoadError;
pub use lwrt_foundation::ExternKind;
pub use module::{
    ConstExpr, DataSegment, ElementSegment, Export, FunctionBody, Global, Import, ImportDesc,
    Module,
};
pub use parser::parse_module;

/// Load and validate a binary module.
///
/// # Errors
///
/// [`LoadError::MalformedEncoding`] if the bytes are not a well-formed
/// encoding, [`LoadError::ValidationFailed`] if they are but the module is
/// not valid.
pub fn load(bytes: &[u8]) -> Result<Module, LoadError> {
    let span = lwrt_foundation::tracing::ModuleTrace::loading(bytes.len());
    let _guard = span.enter();

    let module = parse_module(bytes)?;
    validation::validate_module(&module)?;

    lwrt_foundation::tracing::debug!(
        types = module.types.len(),
        imports = module.imports.len(),
        functions = module.bodies.len(),
        exports = module.exports.len(),
        "module loaded"
    );
    Ok(module)
}
