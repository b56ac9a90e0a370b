// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Linear memory behaviour observed from WebAssembly code and the host.

use std::sync::Arc;

use lwrt_foundation::{MemoryType, Value};
use lwrt_runtime::{CallError, EngineConfig, Linker, Memory, MemoryView, ModuleInstance, Trap};
use proptest::prelude::*;

fn instantiate(source: &str) -> Arc<ModuleInstance> {
    let bytes = wat::parse_str(source).expect("valid wat");
    let module = Arc::new(lwrt_decoder::load(&bytes).expect("valid module"));
    Linker::new().instantiate(&module, &EngineConfig::default()).expect("instantiation succeeds")
}

const GROWABLE: &str = r#"
(module
  (memory (export "mem") 1 3)
  (func (export "grow") (param i32) (result i32)
    local.get 0 memory.grow)
  (func (export "size") (result i32) memory.size)
  (func (export "load") (param i32) (result i32)
    local.get 0 i32.load)
  (func (export "store") (param i32 i32)
    local.get 0 local.get 1 i32.store)
  (func (export "load8") (param i32) (result i32)
    local.get 0 i32.load8_s offset=1)
  (func (export "fill") (param i32 i32 i32)
    local.get 0 local.get 1 local.get 2 memory.fill)
  (func (export "copy") (param i32 i32 i32)
    local.get 0 local.get 1 local.get 2 memory.copy)
)
"#;

fn i32_result(result: Result<Vec<Value>, CallError>) -> Result<i32, CallError> {
    result.map(|values| values[0].as_i32().expect("i32 result"))
}

#[test]
fn test_grow_returns_previous_size() {
    let instance = instantiate(GROWABLE);
    assert_eq!(i32_result(instance.call_export("grow", &[Value::I32(1)])), Ok(1));
    assert_eq!(i32_result(instance.call_export("size", &[])), Ok(2));
    assert_eq!(i32_result(instance.call_export("grow", &[Value::I32(0)])), Ok(2));
    // Past the declared maximum
    assert_eq!(i32_result(instance.call_export("grow", &[Value::I32(2)])), Ok(-1));
    assert_eq!(i32_result(instance.call_export("size", &[])), Ok(2));
    assert_eq!(i32_result(instance.call_export("grow", &[Value::I32(1)])), Ok(2));
    assert_eq!(i32_result(instance.call_export("size", &[])), Ok(3));
}

#[test]
fn test_grown_pages_are_zeroed_and_addressable() {
    let instance = instantiate(GROWABLE);
    assert_eq!(
        i32_result(instance.call_export("load", &[Value::I32(65_536)])),
        Err(CallError::Trap(Trap::OutOfBounds))
    );
    instance.call_export("grow", &[Value::I32(1)]).expect("grow succeeds");
    assert_eq!(i32_result(instance.call_export("load", &[Value::I32(65_536)])), Ok(0));
    instance.call_export("store", &[Value::I32(131_068), Value::I32(-2)]).expect("last word");
    assert_eq!(i32_result(instance.call_export("load", &[Value::I32(131_068)])), Ok(-2));
    assert_eq!(
        instance.call_export("store", &[Value::I32(131_069), Value::I32(1)]),
        Err(CallError::Trap(Trap::OutOfBounds))
    );
}

#[test]
fn test_offset_and_sign_extension() {
    let instance = instantiate(GROWABLE);
    instance.call_export("store", &[Value::I32(0), Value::I32(0x0000_ff00)]).expect("store");
    assert_eq!(i32_result(instance.call_export("load8", &[Value::I32(0)])), Ok(-1));
    // The effective address does not wrap around
    assert_eq!(
        i32_result(instance.call_export("load8", &[Value::I32(-1)])),
        Err(CallError::Trap(Trap::OutOfBounds))
    );
}

#[test]
fn test_bulk_memory() {
    let instance = instantiate(GROWABLE);
    instance
        .call_export("fill", &[Value::I32(8), Value::I32(0xAB), Value::I32(4)])
        .expect("fill");
    assert_eq!(i32_result(instance.call_export("load", &[Value::I32(8)])), Ok(0xABAB_ABAB_u32 as i32));

    instance
        .call_export("copy", &[Value::I32(10), Value::I32(8), Value::I32(4)])
        .expect("overlapping copy");
    let memory = instance.memory().expect("memory");
    let mut bytes = [0u8; 8];
    memory.read(8, &mut bytes).expect("in bounds");
    assert_eq!(bytes, [0xAB, 0xAB, 0xAB, 0xAB, 0xAB, 0xAB, 0, 0]);

    assert_eq!(
        instance.call_export("fill", &[Value::I32(65_535), Value::I32(0), Value::I32(2)]),
        Err(CallError::Trap(Trap::OutOfBounds))
    );
    // A failed fill writes nothing
    assert_eq!(i32_result(instance.call_export("load", &[Value::I32(65_532)])), Ok(0));
}

#[test]
fn test_memory_view_tracks_owner() {
    let instance = instantiate(GROWABLE);
    let view = MemoryView::new(instance.memory().expect("memory"));
    view.write(0, b"abcd").expect("write through view");
    assert_eq!(i32_result(instance.call_export("load", &[Value::I32(0)])), Ok(0x6463_6261));

    instance.call_export("grow", &[Value::I32(1)]).expect("grow");
    assert_eq!(view.size(), Ok(2));

    drop(instance);
    assert!(!view.is_alive());
    assert!(view.read(0, 4).is_err());
}

proptest! {
    #[test]
    fn test_grow_sequence_respects_maximum(deltas in proptest::collection::vec(0u32..4, 0..16)) {
        let memory = Memory::new(MemoryType::new(1, Some(6)), 16).expect("memory");
        let mut expected = 1u32;
        for delta in deltas {
            let result = memory.grow(delta);
            if expected + delta <= 6 {
                prop_assert_eq!(result, Some(expected));
                expected += delta;
            } else {
                prop_assert_eq!(result, None);
            }
            prop_assert_eq!(memory.size(), expected);
            prop_assert_eq!(memory.size_in_bytes(), expected as usize * 65_536);
        }
    }

    #[test]
    fn test_accesses_never_exceed_bounds(offset in 0u32..140_000, len in 0usize..70_000) {
        let memory = Memory::new(MemoryType::new(1, None), 16).expect("memory");
        let mut buf = vec![0u8; len];
        let fits = u64::from(offset) + len as u64 <= 65_536;
        prop_assert_eq!(memory.read(offset, &mut buf).is_ok(), fits);
        prop_assert_eq!(memory.write(offset, &buf).is_ok(), fits);
    }
}
