// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Guest programs driving the WASI preview1 syscalls end to end.

use lwrt::prelude::*;

fn run_with(source: &str, wasi: WasiCtx) -> (Instance, Result<Completion, CallError>) {
    let module = load(&wat::parse_str(source).expect("valid wat")).expect("valid module");
    let instance = Engine::default()
        .instantiate_with_wasi(&module, &Linker::new(), wasi)
        .expect("instantiates");
    let outcome = instance.call_export("_start", &[]);
    (instance, outcome)
}

const HELLO: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "\08\00\00\00\06\00\00\00")
  (data (i32.const 8) "hello\n")
  (func (export "_start") (result i32)
    i32.const 1
    i32.const 0
    i32.const 1
    i32.const 100
    call $fd_write))
"#;

#[test]
fn test_hello_world_is_captured() {
    let stdout = CaptureBuffer::new();
    let (instance, outcome) = run_with(HELLO, WasiCtx::builder().stdout_capture(&stdout).build());
    assert_eq!(outcome, Ok(Completion::Returned(vec![Value::I32(0)])));
    assert_eq!(stdout.to_string_lossy(), "hello\n");
    assert_eq!(instance.read_memory(100, 4), Ok(6u32.to_le_bytes().to_vec()));
}

#[test]
fn test_proc_exit_is_a_normal_completion() {
    let (_, outcome) = run_with(
        r#"
        (module
          (import "wasi_snapshot_preview1" "proc_exit" (func $exit (param i32)))
          (memory 1)
          (func (export "_start") i32.const 42 call $exit unreachable))
        "#,
        WasiCtx::builder().build(),
    );
    let completion = outcome.expect("exit is not an error");
    assert_eq!(completion, Completion::Exited(42));
    assert_eq!(completion.exit_code(), Some(42));
    assert_eq!(completion.values(), None);
}

#[test]
fn test_args_are_visible_to_the_guest() {
    let (instance, outcome) = run_with(
        r#"
        (module
          (import "wasi_snapshot_preview1" "args_sizes_get"
            (func $sizes (param i32 i32) (result i32)))
          (import "wasi_snapshot_preview1" "args_get"
            (func $args (param i32 i32) (result i32)))
          (memory (export "memory") 1)
          (func (export "_start") (result i32)
            (drop (call $sizes (i32.const 0) (i32.const 4)))
            (drop (call $args (i32.const 16) (i32.const 64)))
            i32.const 0
            i32.load))
        "#,
        WasiCtx::builder().args(["prog", "-v"]).build(),
    );
    assert_eq!(outcome, Ok(Completion::Returned(vec![Value::I32(2)])));
    assert_eq!(instance.read_memory(4, 4), Ok(8u32.to_le_bytes().to_vec()));
    assert_eq!(instance.read_memory(64, 8), Ok(b"prog\0-v\0".to_vec()));
    let mut pointers = Vec::new();
    pointers.extend_from_slice(&64u32.to_le_bytes());
    pointers.extend_from_slice(&69u32.to_le_bytes());
    assert_eq!(instance.read_memory(16, 8), Ok(pointers));
}

#[test]
fn test_stdin_is_echoed_to_stdout() {
    let stdout = CaptureBuffer::new();
    let wasi = WasiCtx::builder().stdin_bytes("ping").stdout_capture(&stdout).build();
    let (_, outcome) = run_with(
        r#"
        (module
          (import "wasi_snapshot_preview1" "fd_read"
            (func $fd_read (param i32 i32 i32 i32) (result i32)))
          (import "wasi_snapshot_preview1" "fd_write"
            (func $fd_write (param i32 i32 i32 i32) (result i32)))
          (memory 1)
          (data (i32.const 0) "\40\00\00\00\10\00\00\00")
          (func (export "_start") (result i32)
            (drop (call $fd_read (i32.const 0) (i32.const 0) (i32.const 1) (i32.const 8)))
            ;; write back only what was read
            (i32.store (i32.const 4) (i32.load (i32.const 8)))
            (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 12))))
        "#,
        wasi,
    );
    assert_eq!(outcome, Ok(Completion::Returned(vec![Value::I32(0)])));
    assert_eq!(stdout.contents(), b"ping");
}

#[test]
fn test_bad_descriptor_is_an_errno() {
    let (_, outcome) = run_with(
        r#"
        (module
          (import "wasi_snapshot_preview1" "fd_write"
            (func $fd_write (param i32 i32 i32 i32) (result i32)))
          (memory 1)
          (func (export "_start") (result i32)
            (call $fd_write (i32.const 9) (i32.const 0) (i32.const 0) (i32.const 100))))
        "#,
        WasiCtx::builder().build(),
    );
    assert_eq!(outcome, Ok(Completion::Returned(vec![Value::I32(i32::from(lwrt::wasi::errno::BADF))])));
}

#[test]
fn test_syscall_signature_mismatch_fails_to_link() {
    let module = load(
        &wat::parse_str(
            r#"(module (import "wasi_snapshot_preview1" "proc_exit" (func (param i64))))"#,
        )
        .expect("valid wat"),
    )
    .expect("valid module");
    let err = Engine::default()
        .instantiate_with_wasi(&module, &Linker::new(), WasiCtx::builder().build())
        .unwrap_err();
    assert!(matches!(err, LinkError::TypeMismatch { ref name, .. } if name == "proc_exit"));
}

#[test]
fn test_unknown_syscall_is_unresolved() {
    let module = load(
        &wat::parse_str(
            r#"(module (import "wasi_snapshot_preview1" "random_get" (func (param i32 i32) (result i32))))"#,
        )
        .expect("valid wat"),
    )
    .expect("valid module");
    let err = Engine::default()
        .instantiate_with_wasi(&module, &Linker::new(), WasiCtx::builder().build())
        .unwrap_err();
    assert_eq!(
        err,
        LinkError::UnresolvedImport {
            module: WASI_MODULE.into(),
            name:   "random_get".into(),
        }
    );
}
