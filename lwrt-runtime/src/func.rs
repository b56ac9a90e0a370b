// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Function instances.
//!
//! Every entry in an instance's function index space, imported or defined,
//! is one of these. Imports are resolved once at link time and stored in
//! declaration order, so a `call` never looks anything up by name.

use crate::prelude::*;

/// A callable function
pub enum FuncInstance {
    /// A function defined by a module instance
    Wasm {
        /// Signature
        ty:       FuncType,
        /// Owning instance; weak so that tables and instances do not keep
        /// each other alive
        instance: Weak<ModuleInstance>,
        /// Index in the owning instance's function index space
        index:    u32,
    },
    /// A host-provided function
    Host(HostFunc),
}

impl FuncInstance {
    /// Signature of the function
    #[must_use]
    pub fn ty(&self) -> &FuncType {
        match self {
            Self::Wasm { ty, .. } => ty,
            Self::Host(func) => func.ty(),
        }
    }

    /// Whether this is a host function
    #[must_use]
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

impl fmt::Debug for FuncInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wasm { ty, index, .. } => {
                f.debug_struct("Wasm").field("ty", ty).field("index", index).finish_non_exhaustive()
            },
            Self::Host(func) => f.debug_tuple("Host").field(func).finish(),
        }
    }
}

impl From<HostFunc> for FuncInstance {
    fn from(func: HostFunc) -> Self {
        Self::Host(func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_func_instance() {
        let ty = FuncType::new([ValueType::I32], []);
        let func = FuncInstance::from(HostFunc::new(ty.clone(), |_, _| Ok(Vec::new())));
        assert!(func.is_host());
        assert_eq!(func.ty(), &ty);
    }
}
