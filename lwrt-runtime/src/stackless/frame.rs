// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Stackless function activation frame

use crate::prelude::*;

/// A branch target inside a function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    /// Values carried by a branch to this label
    pub arity:        usize,
    /// Operand stack height to restore, below the carried values
    pub height:       usize,
    /// Instruction index to continue at after a branch
    pub continuation: usize,
    /// Loop labels stay in place when branched to
    pub is_loop:      bool,
}

/// Activation record of one WebAssembly function call
#[derive(Debug)]
pub struct StacklessFrame {
    /// Instance the function belongs to
    pub instance: Arc<ModuleInstance>,
    /// Function index in that instance
    pub func_idx: u32,
    /// Next instruction to execute
    pub pc:       usize,
    /// Parameters followed by declared locals
    pub locals:   Vec<Value>,
    /// Operand stack height when the frame was entered
    pub base:     usize,
    /// Number of results
    pub arity:    usize,
    /// Open blocks, innermost last
    pub labels:   Vec<Label>,
}

impl StacklessFrame {
    /// Get a local variable
    ///
    /// # Errors
    ///
    /// An engine invariant trap if `index` is out of range, which
    /// validation rules out.
    pub fn get_local(&self, index: u32) -> Result<Value, Trap> {
        self.locals
            .get(index as usize)
            .copied()
            .ok_or(Trap::Host(Error::engine_invariant("Local index out of bounds")))
    }

    /// Set a local variable
    ///
    /// # Errors
    ///
    /// As for [`StacklessFrame::get_local`].
    pub fn set_local(&mut self, index: u32, value: Value) -> Result<(), Trap> {
        let slot = self
            .locals
            .get_mut(index as usize)
            .ok_or(Trap::Host(Error::engine_invariant("Local index out of bounds")))?;
        *slot = value;
        Ok(())
    }
}
