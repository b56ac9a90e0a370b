// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude for lwrt-error
//!
//! Brings the error types and traits every downstream crate needs into scope
//! with a single glob import.

pub use core::fmt::{self, Debug, Display};
pub use std::string::{String, ToString};

pub use crate::{
    codes, CallError, Error, ErrorCategory, ErrorSource, LinkError, LoadError, Result,
    ToErrorCategory, Trap,
};
