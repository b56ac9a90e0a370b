// LWRT - lwrt-math
// Module: Prelude
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Crate prelude for `lwrt-math`

pub use lwrt_error::{Error, ErrorCategory, Result, Trap};

pub use crate::{
    float_bits::{FloatBits32, FloatBits64},
    traits::LittleEndian,
};
