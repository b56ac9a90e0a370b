// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Run a WASI "hello world" with the host's standard streams.
//!
//! `RUST_LOG=lwrt_runtime=trace cargo run --example hello_wasi` shows the
//! load, link and call spans.

use lwrt::prelude::*;
use tracing_subscriber::EnvFilter;

const HELLO: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "proc_exit" (func $exit (param i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "\08\00\00\00\0e\00\00\00")
  (data (i32.const 8) "Hello, world!\n")
  (func (export "_start")
    (call $exit
      (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 32)))))
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let module = load(&wat::parse_str(HELLO)?)?;
    let wasi = WasiCtx::builder().inherit_stdio().args(["hello"]).build();
    let instance = Engine::default().instantiate_with_wasi(&module, &Linker::new(), wasi)?;

    match instance.call_export("_start", &[])? {
        Completion::Exited(code) => eprintln!("exited with {code}"),
        Completion::Returned(values) => eprintln!("returned {values:?}"),
    }
    Ok(())
}
