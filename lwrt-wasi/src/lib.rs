// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! # LWRT WASI Implementation
//!
//! A minimal `wasi_snapshot_preview1` surface for the lwrt runtime:
//! command-line arguments, environment, clocks, the three standard streams
//! and `proc_exit`.
//!
//! The syscalls are ordinary host functions. [`WasiCtx::into_registry`]
//! bundles them into a [`CallbackRegistry`] that a linker can pull in next
//! to any other host imports.
//!
//! ## Usage
//!
//! ```rust
//! use lwrt_wasi::{CaptureBuffer, WasiCtx, WASI_MODULE};
//!
//! let stdout = CaptureBuffer::new();
//! let registry = WasiCtx::builder()
//!     .arg("hello.wasm")
//!     .env("LANG", "C")
//!     .stdout_capture(&stdout)
//!     .build()
//!     .into_registry();
//! assert!(registry.has_host_function(WASI_MODULE, "fd_write"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ctx;
pub mod errno;
pub mod prelude;
pub mod preview1;

pub use ctx::{CaptureBuffer, WasiCtx, WasiCtxBuilder, STDERR, STDIN, STDOUT};
pub use errno::Errno;
pub use lwrt_host::CallbackRegistry;
pub use preview1::WASI_MODULE;
