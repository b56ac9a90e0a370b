// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

//! Host function infrastructure for the lwrt runtime.
//!
//! The outside world injects behavior into a module only through imports
//! keyed by `(namespace, name)`. This crate provides the pieces an embedder
//! uses to supply them:
//!
//! - [`HostFunc`]: a callable with a declared signature.
//! - [`HostContext`]: what a host function can see of its caller (the
//!   caller's linear memory).
//! - [`CallbackRegistry`]: a bundle of host functions grouped by namespace,
//!   such as the WASI shim.
//!
//! ## Usage
//!
//! ```rust
//! # use lwrt_host::prelude::*;
//! let registry = HostBuilder::new()
//!     .with_host_function(
//!         "env",
//!         "answer",
//!         HostFunc::new(FuncType::new([], [ValueType::I32]), |_, _| Ok(vec![Value::I32(42)])),
//!     )
//!     .build();
//! assert!(registry.has_host_function("env", "answer"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::missing_panics_doc)]

pub mod builder;
pub mod callback;
pub mod function;
pub mod prelude;

pub use builder::HostBuilder;
pub use callback::CallbackRegistry;
pub use function::{HostContext, HostFunc, HostFunctionHandler};
