// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Opcode constants for the supported instruction set.
//!
//! Numeric opcodes from `0x45` to `0xC4` are dense and decoded by range in
//! the decoder; only the boundaries are named here.

#![allow(missing_docs)]

// Control
pub const UNREACHABLE: u8 = 0x00;
pub const NOP: u8 = 0x01;
pub const BLOCK: u8 = 0x02;
pub const LOOP: u8 = 0x03;
pub const IF: u8 = 0x04;
pub const ELSE: u8 = 0x05;
pub const END: u8 = 0x0B;
pub const BR: u8 = 0x0C;
pub const BR_IF: u8 = 0x0D;
pub const BR_TABLE: u8 = 0x0E;
pub const RETURN: u8 = 0x0F;
pub const CALL: u8 = 0x10;
pub const CALL_INDIRECT: u8 = 0x11;

// Parametric
pub const DROP: u8 = 0x1A;
pub const SELECT: u8 = 0x1B;
pub const SELECT_TYPED: u8 = 0x1C;

// Variable
pub const LOCAL_GET: u8 = 0x20;
pub const LOCAL_SET: u8 = 0x21;
pub const LOCAL_TEE: u8 = 0x22;
pub const GLOBAL_GET: u8 = 0x23;
pub const GLOBAL_SET: u8 = 0x24;

// Memory
pub const I32_LOAD: u8 = 0x28;
pub const I64_LOAD: u8 = 0x29;
pub const F32_LOAD: u8 = 0x2A;
pub const F64_LOAD: u8 = 0x2B;
pub const I32_LOAD8_S: u8 = 0x2C;
pub const I32_LOAD8_U: u8 = 0x2D;
pub const I32_LOAD16_S: u8 = 0x2E;
pub const I32_LOAD16_U: u8 = 0x2F;
pub const I64_LOAD8_S: u8 = 0x30;
pub const I64_LOAD8_U: u8 = 0x31;
pub const I64_LOAD16_S: u8 = 0x32;
pub const I64_LOAD16_U: u8 = 0x33;
pub const I64_LOAD32_S: u8 = 0x34;
pub const I64_LOAD32_U: u8 = 0x35;
pub const I32_STORE: u8 = 0x36;
pub const I64_STORE: u8 = 0x37;
pub const F32_STORE: u8 = 0x38;
pub const F64_STORE: u8 = 0x39;
pub const I32_STORE8: u8 = 0x3A;
pub const I32_STORE16: u8 = 0x3B;
pub const I64_STORE8: u8 = 0x3C;
pub const I64_STORE16: u8 = 0x3D;
pub const I64_STORE32: u8 = 0x3E;
pub const MEMORY_SIZE: u8 = 0x3F;
pub const MEMORY_GROW: u8 = 0x40;

// Constants
pub const I32_CONST: u8 = 0x41;
pub const I64_CONST: u8 = 0x42;
pub const F32_CONST: u8 = 0x43;
pub const F64_CONST: u8 = 0x44;
// Numeric
/// First numeric opcode (`i32.eqz`)
pub const NUMERIC_FIRST: u8 = 0x45;
/// Last MVP numeric opcode (`f64.reinterpret_i64`)
pub const NUMERIC_LAST: u8 = 0xBF;
/// First sign-extension opcode (`i32.extend8_s`)
pub const SIGN_EXT_FIRST: u8 = 0xC0;
/// Last sign-extension opcode (`i64.extend32_s`)
pub const SIGN_EXT_LAST: u8 = 0xC4;

/// Prefix for the `0xFC` extended opcodes
pub const MISC_PREFIX: u8 = 0xFC;

// 0xFC sub-opcodes
/// First saturating truncation (`i32.trunc_sat_f32_s`)
pub const TRUNC_SAT_FIRST: u32 = 0;
/// Last saturating truncation (`i64.trunc_sat_f64_u`)
pub const TRUNC_SAT_LAST: u32 = 7;
/// `memory.init` (passive segments, not supported)
pub const MEMORY_INIT: u32 = 8;
/// `data.drop` (passive segments, not supported)
pub const DATA_DROP: u32 = 9;
/// `memory.copy`
pub const MEMORY_COPY: u32 = 10;
/// `memory.fill`
pub const MEMORY_FILL: u32 = 11;
