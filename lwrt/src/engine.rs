// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The engine: execution limits shared by the instances it creates.

use crate::prelude::*;

/// Creates instances that run under one [`EngineConfig`]
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with `config`
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Create an engine from a preset
    #[must_use]
    pub fn from_preset(preset: EnginePreset) -> Self {
        Self::new(EngineConfig::from_preset(preset))
    }

    /// Limits applied to every instance of this engine
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Instantiate `module`, resolving its imports from `linker`.
    ///
    /// # Errors
    ///
    /// A [`LinkError`]; no instance is observable in that case.
    pub fn instantiate(&self, module: &Module, linker: &Linker) -> Result<Instance, LinkError> {
        linker.instantiate(module.decoded(), &self.config).map(Instance::from)
    }

    /// Instantiate `module` with the WASI syscalls of `wasi` in addition to
    /// the definitions in `linker`.
    ///
    /// # Errors
    ///
    /// [`LinkError::Duplicate`] if `linker` already defines a WASI name,
    /// otherwise as for [`Engine::instantiate`].
    pub fn instantiate_with_wasi(
        &self,
        module: &Module,
        linker: &Linker,
        wasi: WasiCtx,
    ) -> Result<Instance, LinkError> {
        let mut linker = linker.clone();
        linker.define_registry(&wasi.into_registry())?;
        self.instantiate(module, &linker)
    }
}
