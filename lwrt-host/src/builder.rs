// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Builder for host function bundles.

use crate::prelude::*;

/// Builder for a [`CallbackRegistry`]
#[derive(Debug, Default)]
pub struct HostBuilder {
    registry: CallbackRegistry,
}

impl HostBuilder {
    /// Create a new, empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host function
    #[must_use]
    pub fn with_host_function(mut self, module_name: &str, function_name: &str, func: HostFunc) -> Self {
        self.registry.register_host_function(module_name, function_name, func);
        self
    }

    /// Add a host function built from a closure and a signature
    #[must_use]
    pub fn with_fn<F>(self, module_name: &str, function_name: &str, ty: FuncType, f: F) -> Self
    where
        F: Fn(&mut dyn HostContext, &[Value]) -> Result<Vec<Value>, Trap> + Send + Sync + 'static,
    {
        self.with_host_function(module_name, function_name, HostFunc::new(ty, f))
    }

    /// Merge every function of another registry, later entries winning
    #[must_use]
    pub fn with_registry(mut self, other: &CallbackRegistry) -> Self {
        for (module, name, func) in other.iter() {
            self.registry.register_host_function(module, name, func.clone());
        }
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> CallbackRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_merges_registries() {
        let base = HostBuilder::new()
            .with_fn("env", "one", FuncType::new([], [ValueType::I32]), |_, _| Ok(vec![Value::I32(1)]))
            .build();
        let registry = HostBuilder::new()
            .with_fn("env", "two", FuncType::new([], [ValueType::I32]), |_, _| Ok(vec![Value::I32(2)]))
            .with_registry(&base)
            .build();

        assert_eq!(registry.len(), 2);
        assert!(registry.has_host_function("env", "one"));
        assert!(registry.has_host_function("env", "two"));
    }
}
