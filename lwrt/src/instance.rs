// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instance handle: the embedder's view of a running module.

use crate::prelude::*;

/// How a successful call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The function returned these values
    Returned(Vec<Value>),
    /// The guest asked to terminate the process with this code
    Exited(i32),
}

impl Completion {
    /// Returned values, if the function returned
    #[must_use]
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Self::Returned(values) => Some(values),
            Self::Exited(_) => None,
        }
    }

    /// Exit code, if the guest terminated
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Returned(_) => None,
            Self::Exited(code) => Some(*code),
        }
    }
}

/// A live instance of a [`Module`]
///
/// Clones share the same instance. Dropping the last clone (and every
/// instance that imported from it) frees the instance's memory; any
/// [`MemoryView`] taken earlier then reports
/// `Trap::Host(Error::INSTANCE_DROPPED)`.
#[derive(Debug, Clone)]
pub struct Instance {
    inner: Arc<ModuleInstance>,
}

impl From<Arc<ModuleInstance>> for Instance {
    fn from(inner: Arc<ModuleInstance>) -> Self {
        Self { inner }
    }
}

impl Instance {
    /// Call the exported function `name`.
    ///
    /// A guest `proc_exit` is a normal completion, reported as
    /// [`Completion::Exited`].
    ///
    /// # Errors
    ///
    /// [`CallError::NoSuchExport`], [`CallError::NotAFunction`] or
    /// [`CallError::ArityOrTypeMismatch`] before anything runs, and
    /// [`CallError::Trap`] for every other trap.
    pub fn call_export(&self, name: &str, args: &[Value]) -> Result<Completion, CallError> {
        match self.inner.call_export(name, args) {
            Ok(values) => Ok(Completion::Returned(values)),
            Err(CallError::Trap(Trap::ProcessExit(code))) => {
                debug!(export = name, code, "guest exited");
                Ok(Completion::Exited(code))
            },
            Err(error) => Err(error),
        }
    }

    /// Call `name` and return its results, treating a guest exit as an
    /// error.
    ///
    /// # Errors
    ///
    /// As for [`Instance::call_export`], with exits reported as
    /// `CallError::Trap(Trap::ProcessExit(code))`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, CallError> {
        self.inner.call_export(name, args)
    }

    /// Copy `len` bytes out of linear memory.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if the range does not fit, or
    /// `Trap::Host(Error::MISSING_MEMORY)` if the instance has no memory.
    pub fn read_memory(&self, offset: u32, len: usize) -> Result<Vec<u8>, Trap> {
        let memory = self.inner.memory().ok_or(Trap::Host(Error::MISSING_MEMORY))?;
        if !memory.fits(u64::from(offset), len) {
            return Err(Trap::OutOfBounds);
        }
        let mut buf = vec![0; len];
        memory.read(offset, &mut buf)?;
        Ok(buf)
    }

    /// Copy `bytes` into linear memory; all or nothing.
    ///
    /// # Errors
    ///
    /// As for [`Instance::read_memory`].
    pub fn write_memory(&self, offset: u32, bytes: &[u8]) -> Result<(), Trap> {
        let memory = self.inner.memory().ok_or(Trap::Host(Error::MISSING_MEMORY))?;
        memory.write(offset, bytes)
    }

    /// Current memory size in pages, if the instance has a memory
    #[must_use]
    pub fn memory_size(&self) -> Option<u32> {
        self.inner.memory().map(|memory| memory.size())
    }

    /// Grow memory by `delta` pages and return the new size.
    ///
    /// `None` if there is no memory or the growth would pass the declared
    /// maximum or the engine's ceiling; the memory is unchanged then.
    pub fn grow_memory(&self, delta: u32) -> Option<u32> {
        let memory = self.inner.memory()?;
        memory.grow(delta).map(|previous| previous + delta)
    }

    /// A handle to linear memory that does not keep the instance alive
    #[must_use]
    pub fn memory_view(&self) -> Option<MemoryView> {
        self.inner.memory().map(MemoryView::new)
    }

    /// Kind of the export `name`
    #[must_use]
    pub fn get_export_kind(&self, name: &str) -> Option<ExternKind> {
        self.inner.export(name).map(Extern::kind)
    }

    /// All exports as `(name, kind)`, sorted by name
    #[must_use]
    pub fn exports(&self) -> Vec<(String, ExternKind)> {
        self.inner.exports().into_iter().map(|(name, item)| (name.to_string(), item.kind())).collect()
    }

    /// Current value of the exported global `name`
    #[must_use]
    pub fn global(&self, name: &str) -> Option<Value> {
        match self.inner.export(name)? {
            Extern::Global(global) => Some(global.get()),
            _ => None,
        }
    }

    /// Set the exported mutable global `name`.
    ///
    /// # Errors
    ///
    /// A type error when the global cannot be set to `value`.
    pub fn set_global(&self, name: &str, value: Value) -> Result<(), Error> {
        match self.inner.export(name) {
            Some(Extern::Global(global)) => global.set(value),
            _ => Err(Error::type_error("No exported global with that name")),
        }
    }

    /// Statistics of the most recent call
    #[must_use]
    pub fn last_call_stats(&self) -> ExecutionStats {
        self.inner.last_call_stats()
    }

    /// The underlying runtime instance, e.g. for
    /// [`Linker::define_instance`]
    #[must_use]
    pub fn module_instance(&self) -> &Arc<ModuleInstance> {
        &self.inner
    }
}
