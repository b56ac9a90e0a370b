// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Execution related structures
//!
//! Statistics collected by the engine during a single call.

/// Structure to track execution statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Number of instructions executed
    pub instructions_executed: u64,
    /// Number of WebAssembly function calls, including the entry call
    pub function_calls:        u64,
    /// Number of host function calls
    pub host_calls:            u64,
    /// Maximum call depth reached
    pub max_call_depth:        usize,
    /// Maximum operand stack height reached
    pub max_stack_height:      usize,
}

impl ExecutionStats {
    /// Create a new instance with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Increment the instruction count
    pub fn increment_instructions(&mut self, count: u64) {
        self.instructions_executed = self.instructions_executed.saturating_add(count);
    }

    /// Increment function call count
    pub fn increment_function_calls(&mut self) {
        self.function_calls = self.function_calls.saturating_add(1);
    }

    /// Increment host call count
    pub fn increment_host_calls(&mut self) {
        self.host_calls = self.host_calls.saturating_add(1);
    }

    /// Update maximum call depth
    pub fn update_call_depth(&mut self, depth: usize) {
        self.max_call_depth = self.max_call_depth.max(depth);
    }

    /// Update maximum operand stack height
    pub fn update_stack_height(&mut self, height: usize) {
        self.max_stack_height = self.max_stack_height.max(height);
    }
}
