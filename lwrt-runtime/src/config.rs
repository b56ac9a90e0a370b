// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Engine configuration.
//!
//! Every limit the engine enforces at run time or instantiation time lives
//! here. [`EnginePreset`] gives named starting points; individual fields are
//! then adjusted with the `with_*` builder methods.

use std::time::Duration;

use lwrt_foundation::types::MAX_MEMORY_PAGES;

/// Named configuration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePreset {
    /// General purpose defaults
    #[default]
    Standard,
    /// Small footprint with a bounded instruction budget
    Constrained,
    /// Only the limits of the WebAssembly format itself
    Unbounded,
}

/// Limits enforced by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Call frames before `Trap::StackOverflow`
    pub max_call_depth:     usize,
    /// Operand values per frame before `Trap::StackOverflow`
    pub max_value_stack:    usize,
    /// Instruction budget per call; exhaustion raises `Trap::Cancelled`
    pub fuel:               Option<u64>,
    /// Wall-clock budget per call
    pub deadline:           Option<Duration>,
    /// Instructions executed between deadline checks
    pub check_interval:     u32,
    /// Host ceiling for linear memory, in pages
    pub max_memory_pages:   u32,
    /// Host ceiling for table size
    pub max_table_elements: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_preset(EnginePreset::Standard)
    }
}

impl EngineConfig {
    /// Configuration for a preset
    #[must_use]
    pub fn from_preset(preset: EnginePreset) -> Self {
        match preset {
            EnginePreset::Standard => Self {
                max_call_depth:     1024,
                max_value_stack:    65536,
                fuel:               None,
                deadline:           None,
                check_interval:     4096,
                max_memory_pages:   MAX_MEMORY_PAGES,
                max_table_elements: 1_000_000,
            },
            EnginePreset::Constrained => Self {
                max_call_depth:     256,
                max_value_stack:    4096,
                fuel:               Some(10_000_000),
                deadline:           None,
                check_interval:     1024,
                max_memory_pages:   256,
                max_table_elements: 10_000,
            },
            EnginePreset::Unbounded => Self {
                max_call_depth:     1 << 20,
                max_value_stack:    1 << 24,
                fuel:               None,
                deadline:           None,
                check_interval:     4096,
                max_memory_pages:   MAX_MEMORY_PAGES,
                max_table_elements: u32::MAX,
            },
        }
    }

    /// Set the maximum call depth
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the maximum operand stack height per frame
    #[must_use]
    pub fn with_max_value_stack(mut self, values: usize) -> Self {
        self.max_value_stack = values;
        self
    }

    /// Set the per-call instruction budget
    #[must_use]
    pub fn with_fuel(mut self, fuel: Option<u64>) -> Self {
        self.fuel = fuel;
        self
    }

    /// Set the per-call wall-clock budget
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set how many instructions run between deadline checks
    #[must_use]
    pub fn with_check_interval(mut self, interval: u32) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    /// Set the host memory ceiling, clamped to the format maximum
    #[must_use]
    pub fn with_max_memory_pages(mut self, pages: u32) -> Self {
        self.max_memory_pages = pages.min(MAX_MEMORY_PAGES);
        self
    }

    /// Set the host table ceiling
    #[must_use]
    pub fn with_max_table_elements(mut self, elements: u32) -> Self {
        self.max_table_elements = elements;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard() {
        let config = EngineConfig::default();
        assert_eq!(config, EngineConfig::from_preset(EnginePreset::Standard));
        assert_eq!(config.max_call_depth, 1024);
        assert_eq!(config.max_value_stack, 65536);
        assert_eq!(config.fuel, None);
        assert_eq!(config.check_interval, 4096);
        assert_eq!(config.max_memory_pages, 65536);
        assert_eq!(config.max_table_elements, 1_000_000);
    }

    #[test]
    fn test_constrained_preset() {
        let config = EngineConfig::from_preset(EnginePreset::Constrained);
        assert_eq!(config.max_call_depth, 256);
        assert_eq!(config.max_memory_pages, 256);
        assert_eq!(config.fuel, Some(10_000_000));
    }

    #[test]
    fn test_builder_clamps() {
        let config = EngineConfig::default()
            .with_max_memory_pages(u32::MAX)
            .with_check_interval(0)
            .with_deadline(Some(Duration::from_millis(5)));
        assert_eq!(config.max_memory_pages, MAX_MEMORY_PAGES);
        assert_eq!(config.check_interval, 1);
        assert_eq!(config.deadline, Some(Duration::from_millis(5)));
    }
}
