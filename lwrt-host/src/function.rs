// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host function representation.
//!
//! A host function is a shared closure plus the signature it was declared
//! with. The linker checks the signature against the module's import, and
//! the engine checks what the closure returns against it on every call.

use crate::prelude::*;

/// What a host function can see of the instance that called it.
pub trait HostContext {
    /// The caller's linear memory, if it has one.
    fn memory(&self) -> Option<&dyn MemoryAccessor>;
}

/// Context for calls that do not originate from an instance.
impl HostContext for () {
    fn memory(&self) -> Option<&dyn MemoryAccessor> {
        None
    }
}

/// Host function handler type for implementing WebAssembly imports
pub type HostFunctionHandler =
    Arc<dyn Fn(&mut dyn HostContext, &[Value]) -> Result<Vec<Value>, Trap> + Send + Sync>;

/// A host-provided callable with a declared signature.
#[derive(Clone)]
pub struct HostFunc {
    ty:      FuncType,
    handler: HostFunctionHandler,
}

impl HostFunc {
    /// Wrap a closure as a host function of type `ty`.
    pub fn new<F>(ty: FuncType, f: F) -> Self
    where
        F: Fn(&mut dyn HostContext, &[Value]) -> Result<Vec<Value>, Trap> + Send + Sync + 'static,
    {
        Self {
            ty,
            handler: Arc::new(f),
        }
    }

    /// Declared signature
    #[must_use]
    pub fn ty(&self) -> &FuncType {
        &self.ty
    }

    /// Invoke the handler.
    ///
    /// Arguments are assumed to match the declared parameters; the engine
    /// only calls host functions with operands it has type-checked.
    ///
    /// # Errors
    ///
    /// Whatever trap the handler raises, or
    /// `Trap::Host(Error::HOST_RESULT_MISMATCH)` if the handler returns
    /// values that do not match the declared results.
    pub fn call(&self, ctx: &mut dyn HostContext, args: &[Value]) -> Result<Vec<Value>, Trap> {
        let results = (self.handler)(ctx, args)?;
        let matches = results.len() == self.ty.results.len()
            && results.iter().zip(&self.ty.results).all(|(v, ty)| v.matches_type(*ty));
        if !matches {
            warn!(expected = %self.ty, returned = results.len(), "host function result mismatch");
            return Err(Trap::Host(Error::HOST_RESULT_MISMATCH));
        }
        Ok(results)
    }
}

impl fmt::Debug for HostFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunc").field("ty", &self.ty).finish_non_exhaustive()
    }
}
