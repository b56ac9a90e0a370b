// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Stackless WebAssembly execution engine
//!
//! The interpreter does not recurse on the host stack: WebAssembly calls
//! push a [`StacklessFrame`] onto an explicit frame stack and returns pop
//! it, so call depth is bounded only by [`crate::EngineConfig`]. A trap is
//! an ordinary `Err` propagated out of the dispatch loop; nothing unwinds.

pub mod engine;
pub mod frame;

pub use engine::StacklessEngine;
pub use frame::{Label, StacklessFrame};
