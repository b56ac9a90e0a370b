// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Callback registry for host functions.
//!
//! A registry groups host functions by namespace and name. The linker pulls
//! whole registries in at once, which is how bundles such as the WASI shim
//! are offered to modules.

use crate::prelude::*;

/// A registry of host functions keyed by `(namespace, name)`
#[derive(Default, Clone)]
pub struct CallbackRegistry {
    /// Host functions registry (module name -> function name -> function)
    host_functions: HashMap<String, HashMap<String, HostFunc>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("registered_modules", &self.host_functions.keys())
            .finish()
    }
}

impl CallbackRegistry {
    /// Create a new callback registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host function, replacing any previous one with the same
    /// namespace and name.
    pub fn register_host_function(&mut self, module_name: &str, function_name: &str, func: HostFunc) {
        trace!(module = module_name, function = function_name, ty = %func.ty(), "registering host function");
        self.host_functions
            .entry(module_name.to_string())
            .or_default()
            .insert(function_name.to_string(), func);
    }

    /// Check if a host function is registered
    #[must_use]
    pub fn has_host_function(&self, module_name: &str, function_name: &str) -> bool {
        self.get_host_function(module_name, function_name).is_some()
    }

    /// Look up a host function
    #[must_use]
    pub fn get_host_function(&self, module_name: &str, function_name: &str) -> Option<&HostFunc> {
        self.host_functions.get(module_name)?.get(function_name)
    }

    /// Call a host function directly, outside of any instance.
    ///
    /// # Errors
    ///
    /// `Trap::Host` with [`codes::UNRESOLVED_IMPORT`] if no such function is
    /// registered, otherwise whatever the function itself returns.
    pub fn call_host_function(
        &self,
        ctx: &mut dyn HostContext,
        module_name: &str,
        function_name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>, Trap> {
        let func = self.get_host_function(module_name, function_name).ok_or(Trap::Host(
            Error::new(ErrorCategory::Linking, codes::UNRESOLVED_IMPORT, "Host function not found"),
        ))?;
        func.call(ctx, args)
    }

    /// All registered namespaces, sorted
    #[must_use]
    pub fn get_registered_modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = self.host_functions.keys().map(String::as_str).collect();
        modules.sort_unstable();
        modules
    }

    /// All function names registered under `module_name`, sorted
    #[must_use]
    pub fn get_registered_functions(&self, module_name: &str) -> Vec<&str> {
        let mut functions: Vec<&str> = self
            .host_functions
            .get(module_name)
            .map(|funcs| funcs.keys().map(String::as_str).collect())
            .unwrap_or_default();
        functions.sort_unstable();
        functions
    }

    /// Iterate over every `(namespace, name, function)` in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &HostFunc)> + '_ {
        self.get_registered_modules().into_iter().flat_map(move |module| {
            self.get_registered_functions(module).into_iter().filter_map(move |name| {
                self.get_host_function(module, name).map(|func| (module, name, func))
            })
        })
    }

    /// Number of registered functions
    #[must_use]
    pub fn len(&self) -> usize {
        self.host_functions.values().map(HashMap::len).sum()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
