// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Loaded modules.

use crate::prelude::*;

/// A validated module, cheap to clone and share between instances
#[derive(Debug, Clone)]
pub struct Module(Arc<lwrt_decoder::Module>);

/// Parse and validate a binary module.
///
/// # Errors
///
/// [`LoadError::MalformedEncoding`] for bytes that are not a well-formed
/// module, including any truncated prefix of one, and
/// [`LoadError::ValidationFailed`] for a well-formed but invalid module.
pub fn load(bytes: &[u8]) -> Result<Module, LoadError> {
    Module::new(bytes)
}

impl Module {
    /// Parse and validate a binary module; see [`load`].
    ///
    /// # Errors
    ///
    /// See [`load`].
    pub fn new(bytes: &[u8]) -> Result<Self, LoadError> {
        lwrt_decoder::load(bytes).map(|module| Self(Arc::new(module)))
    }

    /// Declared imports as `(namespace, name, kind)`, in declaration order
    pub fn imports(&self) -> impl Iterator<Item = (&str, &str, ExternKind)> + '_ {
        self.0
            .imports
            .iter()
            .map(|import| (import.module.as_str(), import.name.as_str(), import.desc.kind()))
    }

    /// Exports as `(name, kind)`, in declaration order
    pub fn exports(&self) -> impl Iterator<Item = (&str, ExternKind)> + '_ {
        self.0.exports.iter().map(|export| (export.name.as_str(), export.kind))
    }

    /// Signature of an exported function
    #[must_use]
    pub fn export_func_type(&self, name: &str) -> Option<&FuncType> {
        let export = self.0.export(name)?;
        if export.kind != ExternKind::Func {
            return None;
        }
        self.0.func_type(export.index)
    }

    /// The decoded module
    #[must_use]
    pub fn decoded(&self) -> &Arc<lwrt_decoder::Module> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imports_and_exports() {
        let bytes = wat::parse_str(
            r#"
            (module
              (import "env" "log" (func (param i32)))
              (import "env" "memory" (memory 1))
              (func (export "run") (param i32) (result i32) local.get 0)
              (global (export "g") i32 (i32.const 0)))
            "#,
        )
        .expect("valid wat");
        let module = load(&bytes).expect("valid module");
        let imports: Vec<_> = module.imports().collect();
        assert_eq!(imports, [("env", "log", ExternKind::Func), ("env", "memory", ExternKind::Memory)]);
        let exports: Vec<_> = module.exports().collect();
        assert_eq!(exports, [("run", ExternKind::Func), ("g", ExternKind::Global)]);
        assert_eq!(
            module.export_func_type("run"),
            Some(&FuncType::new([ValueType::I32], [ValueType::I32]))
        );
        assert_eq!(module.export_func_type("g"), None);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(load(b"\0asm\x02\0\0\0"), Err(LoadError::MalformedEncoding { .. })));
        assert!(matches!(load(b"not wasm"), Err(LoadError::MalformedEncoding { .. })));
    }
}
