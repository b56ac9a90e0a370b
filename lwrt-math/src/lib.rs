// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT
// Project: LWRT
// Module: lwrt-math

//! Mathematical operations and types for lwrt.
//! Provides the parts of the WebAssembly numeric instructions that are not a
//! plain wrapping Rust operator: trapping division, float min/max/nearest and
//! float-to-int truncation.

#![forbid(unsafe_code)]
#![deny(missing_docs, clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic)]
#![allow(clippy::float_arithmetic, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

// Modules
pub mod float_bits;
pub mod ops;
pub mod prelude;
pub mod traits;

pub use float_bits::{FloatBits32, FloatBits64};
pub use ops::*;
pub use traits::LittleEndian;
