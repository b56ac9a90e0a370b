// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! End-to-end tests through the embedding API.

use lwrt::prelude::*;
use proptest::prelude::*;

fn module(source: &str) -> Module {
    load(&wat::parse_str(source).expect("valid wat")).expect("valid module")
}

fn instantiate(source: &str) -> Instance {
    Engine::default().instantiate(&module(source), &Linker::new()).expect("instantiates")
}

const CALC: &str = r#"
(module
  (memory (export "memory") 1 2)
  (global (export "answer") i32 (i32.const 42))
  (global (export "counter") (mut i64) (i64.const 0))
  (func (export "add") (param i32 i32) (result i32)
    local.get 0 local.get 1 i32.add)
  (func (export "div") (param i32 i32) (result i32)
    local.get 0 local.get 1 i32.div_u)
  (func (export "sum_bytes") (param i32 i32) (result i32) (local i32)
    block
      loop
        local.get 1
        i32.eqz
        br_if 1
        local.get 2
        local.get 0
        i32.load8_u
        i32.add
        local.set 2
        local.get 0 i32.const 1 i32.add local.set 0
        local.get 1 i32.const 1 i32.sub local.set 1
        br 0
      end
    end
    local.get 2)
)
"#;

#[test]
fn test_add_and_divide_by_zero() {
    let instance = instantiate(CALC);
    assert_eq!(
        instance.call_export("add", &[Value::I32(2), Value::I32(3)]),
        Ok(Completion::Returned(vec![Value::I32(5)]))
    );
    assert_eq!(
        instance.call_export("div", &[Value::I32(1), Value::I32(0)]),
        Err(CallError::Trap(Trap::DivideByZero))
    );
}

#[test]
fn test_wrong_arguments_never_execute() {
    let instance = instantiate(CALC);
    let before = instance.last_call_stats();
    assert!(matches!(
        instance.call_export("add", &[Value::I32(2)]),
        Err(CallError::ArityOrTypeMismatch { expected_params: 2, given: 1, .. })
    ));
    assert!(matches!(
        instance.call_export("add", &[Value::f32(1.0), Value::I32(2)]),
        Err(CallError::ArityOrTypeMismatch { first_bad_arg: Some(0), .. })
    ));
    assert_eq!(instance.last_call_stats(), before);
}

#[test]
fn test_grow_to_maximum() {
    let instance = instantiate(CALC);
    assert_eq!(instance.memory_size(), Some(1));
    assert_eq!(instance.grow_memory(1), Some(2));
    assert_eq!(instance.grow_memory(1), None);
    assert_eq!(instance.memory_size(), Some(2));
}

#[test]
fn test_failed_grow_keeps_contents() {
    let instance = instantiate(CALC);
    instance.write_memory(100, b"keep").expect("in bounds");
    assert_eq!(instance.grow_memory(5), None);
    assert_eq!(instance.read_memory(100, 4), Ok(b"keep".to_vec()));
}

#[test]
fn test_memory_round_trip_through_code() {
    let instance = instantiate(CALC);
    instance.write_memory(16, &[1, 2, 3, 4, 250]).expect("in bounds");
    assert_eq!(
        instance.call("sum_bytes", &[Value::I32(16), Value::I32(5)]),
        Ok(vec![Value::I32(260)])
    );
    assert_eq!(instance.read_memory(65_535, 2), Err(Trap::OutOfBounds));
    assert_eq!(instance.write_memory(65_535, &[0, 0]), Err(Trap::OutOfBounds));
}

#[test]
fn test_export_kinds_and_globals() {
    let instance = instantiate(CALC);
    assert_eq!(instance.get_export_kind("add"), Some(ExternKind::Func));
    assert_eq!(instance.get_export_kind("memory"), Some(ExternKind::Memory));
    assert_eq!(instance.get_export_kind("answer"), Some(ExternKind::Global));
    assert_eq!(instance.get_export_kind("nope"), None);

    assert_eq!(instance.global("answer"), Some(Value::I32(42)));
    assert!(instance.set_global("answer", Value::I32(1)).is_err());
    instance.set_global("counter", Value::I64(7)).expect("mutable global");
    assert_eq!(instance.global("counter"), Some(Value::I64(7)));
    assert_eq!(instance.global("add"), None);

    let names: Vec<_> = instance.exports().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["add", "answer", "counter", "div", "memory", "sum_bytes"]);
    assert_eq!(instance.call_export("memory", &[]), Err(CallError::NotAFunction("memory".into())));
}

#[test]
fn test_unresolved_import_yields_no_instance() {
    let module = module(r#"(module (import "env" "missing_fn" (func)) (func (export "f")))"#);
    let err = Engine::default().instantiate(&module, &Linker::new()).unwrap_err();
    assert_eq!(
        err,
        LinkError::UnresolvedImport {
            module: "env".into(),
            name:   "missing_fn".into(),
        }
    );
}

#[test]
fn test_memory_view_outlives_instance() {
    let instance = instantiate(CALC);
    let view = instance.memory_view().expect("has memory");
    view.write(0, &[9]).expect("alive");
    assert_eq!(instance.read_memory(0, 1), Ok(vec![9]));
    drop(instance);
    assert_eq!(view.read(0, 1), Err(Trap::Host(Error::INSTANCE_DROPPED)));
}

#[test]
fn test_host_imports_and_cross_instance_linking() {
    let engine = Engine::default();
    let mut linker = Linker::new();
    linker
        .define_host("env", "triple", FuncType::new([ValueType::I32], [ValueType::I32]), |_, args| {
            Ok(vec![Value::I32(args[0].as_i32().unwrap_or(0) * 3)])
        })
        .expect("defined");

    let lib = engine
        .instantiate(
            &module(
                r#"
                (module
                  (import "env" "triple" (func $triple (param i32) (result i32)))
                  (func (export "nine_times") (param i32) (result i32)
                    local.get 0 call $triple call $triple))
                "#,
            ),
            &linker,
        )
        .expect("library instantiates");
    linker.define_instance("lib", lib.module_instance()).expect("exports defined");

    let app = engine
        .instantiate(
            &module(
                r#"
                (module
                  (import "lib" "nine_times" (func $nine (param i32) (result i32)))
                  (func (export "main") (result i32) i32.const 2 call $nine))
                "#,
            ),
            &linker,
        )
        .expect("application instantiates");
    assert_eq!(app.call("main", &[]), Ok(vec![Value::I32(18)]));
}

#[test]
fn test_constrained_preset_limits_runaway_code() {
    let engine = Engine::from_preset(EnginePreset::Constrained);
    let instance = engine
        .instantiate(&module(r#"(module (func (export "spin") (loop br 0)))"#), &Linker::new())
        .expect("instantiates");
    assert_eq!(instance.call_export("spin", &[]), Err(CallError::Trap(Trap::Cancelled)));
}

#[test]
fn test_instance_usable_after_trap() {
    let instance = instantiate(CALC);
    assert!(instance.call_export("div", &[Value::I32(1), Value::I32(0)]).is_err());
    assert_eq!(instance.call("div", &[Value::I32(9), Value::I32(3)]), Ok(vec![Value::I32(3)]));
}

#[test]
fn test_shared_module_gives_independent_instances() {
    let module = module(CALC);
    let engine = Engine::default();
    let first = engine.instantiate(&module, &Linker::new()).expect("instantiates");
    let second = engine.instantiate(&module, &Linker::new()).expect("instantiates");
    first.write_memory(0, &[7]).expect("in bounds");
    assert_eq!(second.read_memory(0, 1), Ok(vec![0]));
}

proptest! {
    #[test]
    fn test_growth_adds_exact_pages(delta in 0u32..4) {
        let instance = instantiate(r#"(module (memory (export "m") 1 3))"#);
        let grown = instance.grow_memory(delta);
        if delta <= 2 {
            prop_assert_eq!(grown, Some(1 + delta));
            let tail = instance.read_memory(65_536 * delta, 65_536).expect("last page addressable");
            prop_assert!(tail.iter().all(|&b| b == 0));
        } else {
            prop_assert_eq!(grown, None);
            prop_assert_eq!(instance.memory_size(), Some(1));
        }
    }

    #[test]
    fn test_add_matches_wrapping_add(a in any::<i32>(), b in any::<i32>()) {
        let instance = instantiate(CALC);
        prop_assert_eq!(
            instance.call("add", &[Value::I32(a), Value::I32(b)]),
            Ok(vec![Value::I32(a.wrapping_add(b))])
        );
    }
}

#[test]
fn test_host_bundle_reads_guest_memory() {
    let registry = HostBuilder::new()
        .with_fn("env", "sum4", FuncType::new([ValueType::I32], [ValueType::I32]), |caller, args| {
            let memory = caller.memory().ok_or(Trap::Host(Error::MISSING_MEMORY))?;
            let mut bytes = [0u8; 4];
            memory.read_bytes(args[0].as_i32().unwrap_or(0) as u32, &mut bytes)?;
            Ok(vec![Value::I32(bytes.iter().map(|&b| i32::from(b)).sum())])
        })
        .build();
    let mut linker = Linker::new();
    linker.define_registry(&registry).expect("defined");

    let module = module(
        r#"
        (module
          (import "env" "sum4" (func $sum4 (param i32) (result i32)))
          (memory 1)
          (data (i32.const 32) "\01\02\03\04")
          (func (export "run") (result i32) i32.const 32 call $sum4)
          (func (export "edge") (result i32) i32.const 65534 call $sum4))
        "#,
    );
    let instance = Engine::default().instantiate(&module, &linker).expect("instantiates");
    assert_eq!(instance.call("run", &[]), Ok(vec![Value::I32(10)]));
    assert_eq!(instance.call_export("edge", &[]), Err(CallError::Trap(Trap::OutOfBounds)));
}
