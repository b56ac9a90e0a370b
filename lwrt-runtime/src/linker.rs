// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Import resolution table.
//!
//! A [`Linker`] maps `(namespace, name)` pairs to externs. Host functions,
//! memories, tables and globals are defined directly; the exports of an
//! existing instance can be defined under a namespace so a later module can
//! import them.

use lwrt_foundation::tracing::ImportTrace;

use crate::prelude::*;

/// Definitions available to modules being instantiated
#[derive(Debug, Clone, Default)]
pub struct Linker {
    definitions:     HashMap<(String, String), Extern>,
    /// Instances whose exports were defined here
    instances:       Vec<Arc<ModuleInstance>>,
    allow_shadowing: bool,
}

impl Linker {
    /// Create an empty linker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let later definitions replace earlier ones instead of failing
    pub fn allow_shadowing(&mut self, allow: bool) -> &mut Self {
        self.allow_shadowing = allow;
        self
    }

    /// Define `namespace.name`.
    ///
    /// # Errors
    ///
    /// [`LinkError::Duplicate`] if the pair is already defined and shadowing
    /// is off.
    pub fn define(
        &mut self,
        namespace: &str,
        name: &str,
        item: impl Into<Extern>,
    ) -> Result<&mut Self, LinkError> {
        let span = ImportTrace::registering(namespace, name);
        let _guard = span.enter();

        let key = (namespace.to_string(), name.to_string());
        if !self.allow_shadowing && self.definitions.contains_key(&key) {
            warn!("duplicate definition");
            return Err(LinkError::Duplicate {
                module: key.0,
                name:   key.1,
            });
        }
        let item = item.into();
        trace!(kind = ?item.kind(), "defined");
        self.definitions.insert(key, item);
        Ok(self)
    }

    /// Define a host function from a closure
    ///
    /// # Errors
    ///
    /// See [`Linker::define`].
    pub fn define_host<F>(
        &mut self,
        namespace: &str,
        name: &str,
        ty: FuncType,
        f: F,
    ) -> Result<&mut Self, LinkError>
    where
        F: Fn(&mut dyn HostContext, &[Value]) -> Result<Vec<Value>, Trap> + Send + Sync + 'static,
    {
        self.define(namespace, name, HostFunc::new(ty, f))
    }

    /// Define an existing function, host or WebAssembly
    ///
    /// # Errors
    ///
    /// See [`Linker::define`].
    pub fn define_func(
        &mut self,
        namespace: &str,
        name: &str,
        func: Arc<FuncInstance>,
    ) -> Result<&mut Self, LinkError> {
        self.define(namespace, name, Extern::Func(func))
    }

    /// Define every function of a host registry under its own namespaces
    ///
    /// # Errors
    ///
    /// The first [`LinkError::Duplicate`]; earlier functions stay defined.
    pub fn define_registry(&mut self, registry: &CallbackRegistry) -> Result<&mut Self, LinkError> {
        for (module, name, func) in registry.iter() {
            self.define(module, name, func.clone())?;
        }
        Ok(self)
    }

    /// Define every export of `instance` under `namespace` and keep the
    /// instance alive for as long as the linker.
    ///
    /// # Errors
    ///
    /// The first [`LinkError::Duplicate`]; earlier exports stay defined.
    pub fn define_instance(
        &mut self,
        namespace: &str,
        instance: &Arc<ModuleInstance>,
    ) -> Result<&mut Self, LinkError> {
        for (name, item) in instance.exports() {
            self.define(namespace, name, item.clone())?;
        }
        if !self.instances.iter().any(|known| Arc::ptr_eq(known, instance)) {
            self.instances.push(Arc::clone(instance));
        }
        Ok(self)
    }

    /// Look up a definition
    #[must_use]
    pub fn get(&self, namespace: &str, name: &str) -> Option<&Extern> {
        self.definitions.get(&(namespace.to_string(), name.to_string()))
    }

    /// Number of definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether nothing is defined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Instantiate `module` against these definitions.
    ///
    /// # Errors
    ///
    /// See [`ModuleInstance::instantiate`].
    pub fn instantiate(
        &self,
        module: &Arc<Module>,
        config: &EngineConfig,
    ) -> Result<Arc<ModuleInstance>, LinkError> {
        ModuleInstance::instantiate(Arc::clone(module), self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> FuncType {
        FuncType::default()
    }

    #[test]
    fn test_duplicate_definitions() {
        let mut linker = Linker::new();
        linker.define_host("env", "f", unit(), |_, _| Ok(Vec::new())).expect("first definition");
        let err = linker.define_host("env", "f", unit(), |_, _| Ok(Vec::new())).unwrap_err();
        assert_eq!(
            err,
            LinkError::Duplicate {
                module: "env".to_string(),
                name:   "f".to_string(),
            }
        );

        linker.allow_shadowing(true);
        assert!(linker.define_host("env", "f", unit(), |_, _| Ok(Vec::new())).is_ok());
        assert_eq!(linker.len(), 1);
    }

    #[test]
    fn test_define_registry() {
        let mut registry = CallbackRegistry::new();
        registry.register_host_function("env", "a", HostFunc::new(unit(), |_, _| Ok(Vec::new())));
        registry.register_host_function("other", "b", HostFunc::new(unit(), |_, _| Ok(Vec::new())));

        let mut linker = Linker::new();
        linker.define_registry(&registry).expect("no clashes");
        assert!(matches!(linker.get("env", "a"), Some(Extern::Func(_))));
        assert!(matches!(linker.get("other", "b"), Some(Extern::Func(_))));
        assert!(linker.get("env", "b").is_none());
    }

    #[test]
    fn test_define_memory() {
        let memory = Arc::new(Memory::new(MemoryType::new(1, Some(2)), 16).expect("small memory"));
        let mut linker = Linker::new();
        linker.define("env", "memory", Arc::clone(&memory)).expect("defined");
        match linker.get("env", "memory") {
            Some(Extern::Memory(found)) => assert!(Arc::ptr_eq(found, &memory)),
            other => panic!("unexpected definition {other:?}"),
        }
    }
}
