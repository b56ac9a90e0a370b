// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly instruction representation and function body decoding.
//!
//! Bodies are decoded into a flat `Vec<Instruction>`. Structured control
//! instructions carry the indices of their matching `else` and `end` so the
//! interpreter never has to scan forward. Numeric instructions are grouped
//! by shape (unary, binary, compare, convert) with an operator enum, which
//! keeps both the validator and the interpreter to one rule per shape.

use lwrt_format::opcodes as op;

use crate::{prelude::*, reader::BinaryReader};

/// Signature of a structured block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// `[] -> []`
    Empty,
    /// `[] -> [t]`
    Value(ValueType),
    /// Signature given by a type index
    Func(u32),
}

/// Integer unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntUnOp {
    /// Count leading zeros
    Clz,
    /// Count trailing zeros
    Ctz,
    /// Count set bits
    Popcnt,
    /// Sign-extend the low 8 bits
    Extend8S,
    /// Sign-extend the low 16 bits
    Extend16S,
    /// Sign-extend the low 32 bits (i64 only)
    Extend32S,
}

/// Integer binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum IntBinOp {
    Add,
    Sub,
    Mul,
    DivS,
    DivU,
    RemS,
    RemU,
    And,
    Or,
    Xor,
    Shl,
    ShrS,
    ShrU,
    Rotl,
    Rotr,
}

/// Integer comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum IntRelOp {
    Eq,
    Ne,
    LtS,
    LtU,
    GtS,
    GtU,
    LeS,
    LeU,
    GeS,
    GeU,
}

/// Float unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FloatUnOp {
    Abs,
    Neg,
    Ceil,
    Floor,
    Trunc,
    Nearest,
    Sqrt,
}

/// Float binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FloatBinOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Copysign,
}

/// Float comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FloatRelOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// Conversions between value types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ConvertOp {
    I32WrapI64,
    I32TruncF32S,
    I32TruncF32U,
    I32TruncF64S,
    I32TruncF64U,
    I64ExtendI32S,
    I64ExtendI32U,
    I64TruncF32S,
    I64TruncF32U,
    I64TruncF64S,
    I64TruncF64U,
    F32ConvertI32S,
    F32ConvertI32U,
    F32ConvertI64S,
    F32ConvertI64U,
    F32DemoteF64,
    F64ConvertI32S,
    F64ConvertI32U,
    F64ConvertI64S,
    F64ConvertI64U,
    F64PromoteF32,
    I32ReinterpretF32,
    I64ReinterpretF64,
    F32ReinterpretI32,
    F64ReinterpretI64,
    I32TruncSatF32S,
    I32TruncSatF32U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF32S,
    I64TruncSatF32U,
    I64TruncSatF64S,
    I64TruncSatF64U,
}

/// Conversions in opcode order starting at `0xA7`
const MVP_CONVERSIONS: [ConvertOp; 25] = [
    ConvertOp::I32WrapI64,
    ConvertOp::I32TruncF32S,
    ConvertOp::I32TruncF32U,
    ConvertOp::I32TruncF64S,
    ConvertOp::I32TruncF64U,
    ConvertOp::I64ExtendI32S,
    ConvertOp::I64ExtendI32U,
    ConvertOp::I64TruncF32S,
    ConvertOp::I64TruncF32U,
    ConvertOp::I64TruncF64S,
    ConvertOp::I64TruncF64U,
    ConvertOp::F32ConvertI32S,
    ConvertOp::F32ConvertI32U,
    ConvertOp::F32ConvertI64S,
    ConvertOp::F32ConvertI64U,
    ConvertOp::F32DemoteF64,
    ConvertOp::F64ConvertI32S,
    ConvertOp::F64ConvertI32U,
    ConvertOp::F64ConvertI64S,
    ConvertOp::F64ConvertI64U,
    ConvertOp::F64PromoteF32,
    ConvertOp::I32ReinterpretF32,
    ConvertOp::I64ReinterpretF64,
    ConvertOp::F32ReinterpretI32,
    ConvertOp::F64ReinterpretI64,
];

/// Saturating truncations in `0xFC` sub-opcode order
const SAT_CONVERSIONS: [ConvertOp; 8] = [
    ConvertOp::I32TruncSatF32S,
    ConvertOp::I32TruncSatF32U,
    ConvertOp::I32TruncSatF64S,
    ConvertOp::I32TruncSatF64U,
    ConvertOp::I64TruncSatF32S,
    ConvertOp::I64TruncSatF32U,
    ConvertOp::I64TruncSatF64S,
    ConvertOp::I64TruncSatF64U,
];

impl ConvertOp {
    /// `(operand, result)` types
    #[must_use]
    pub fn signature(self) -> (ValueType, ValueType) {
        use ConvertOp::*;
        use ValueType::{F32, F64, I32, I64};
        match self {
            I32WrapI64 => (I64, I32),
            I32TruncF32S | I32TruncF32U | I32TruncSatF32S | I32TruncSatF32U
            | I32ReinterpretF32 => (F32, I32),
            I32TruncF64S | I32TruncF64U | I32TruncSatF64S | I32TruncSatF64U => (F64, I32),
            I64ExtendI32S | I64ExtendI32U => (I32, I64),
            I64TruncF32S | I64TruncF32U | I64TruncSatF32S | I64TruncSatF32U => (F32, I64),
            I64TruncF64S | I64TruncF64U | I64TruncSatF64S | I64TruncSatF64U
            | I64ReinterpretF64 => (F64, I64),
            F32ConvertI32S | F32ConvertI32U | F32ReinterpretI32 => (I32, F32),
            F32ConvertI64S | F32ConvertI64U => (I64, F32),
            F32DemoteF64 => (F64, F32),
            F64ConvertI32S | F64ConvertI32U => (I32, F64),
            F64ConvertI64S | F64ConvertI64U | F64ReinterpretI64 => (I64, F64),
            F64PromoteF32 => (F32, F64),
        }
    }
}

/// Memory load operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum LoadOp {
    I32Load,
    I64Load,
    F32Load,
    F64Load,
    I32Load8S,
    I32Load8U,
    I32Load16S,
    I32Load16U,
    I64Load8S,
    I64Load8U,
    I64Load16S,
    I64Load16U,
    I64Load32S,
    I64Load32U,
}

impl LoadOp {
    /// Bytes read from memory
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            LoadOp::I32Load8S | LoadOp::I32Load8U | LoadOp::I64Load8S | LoadOp::I64Load8U => 1,
            LoadOp::I32Load16S | LoadOp::I32Load16U | LoadOp::I64Load16S | LoadOp::I64Load16U => {
                2
            },
            LoadOp::I32Load | LoadOp::F32Load | LoadOp::I64Load32S | LoadOp::I64Load32U => 4,
            LoadOp::I64Load | LoadOp::F64Load => 8,
        }
    }

    /// Type pushed onto the stack
    #[must_use]
    pub const fn result_type(self) -> ValueType {
        match self {
            LoadOp::I32Load
            | LoadOp::I32Load8S
            | LoadOp::I32Load8U
            | LoadOp::I32Load16S
            | LoadOp::I32Load16U => ValueType::I32,
            LoadOp::F32Load => ValueType::F32,
            LoadOp::F64Load => ValueType::F64,
            _ => ValueType::I64,
        }
    }
}

/// Memory store operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum StoreOp {
    I32Store,
    I64Store,
    F32Store,
    F64Store,
    I32Store8,
    I32Store16,
    I64Store8,
    I64Store16,
    I64Store32,
}

impl StoreOp {
    /// Bytes written to memory
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            StoreOp::I32Store8 | StoreOp::I64Store8 => 1,
            StoreOp::I32Store16 | StoreOp::I64Store16 => 2,
            StoreOp::I32Store | StoreOp::F32Store | StoreOp::I64Store32 => 4,
            StoreOp::I64Store | StoreOp::F64Store => 8,
        }
    }

    /// Type of the stored operand
    #[must_use]
    pub const fn value_type(self) -> ValueType {
        match self {
            StoreOp::I32Store | StoreOp::I32Store8 | StoreOp::I32Store16 => ValueType::I32,
            StoreOp::F32Store => ValueType::F32,
            StoreOp::F64Store => ValueType::F64,
            StoreOp::I64Store | StoreOp::I64Store8 | StoreOp::I64Store16 | StoreOp::I64Store32 => {
                ValueType::I64
            },
        }
    }
}

/// A decoded instruction.
///
/// Control targets (`end`, `else_`) are indices into the owning function's
/// instruction list.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Trap unconditionally
    Unreachable,
    /// Do nothing
    Nop,
    /// Structured block; branches continue after `end`
    Block {
        /// Block signature
        ty:  BlockType,
        /// Index of the matching `end`
        end: u32,
    },
    /// Structured loop; branches continue at the first body instruction
    Loop {
        /// Block signature
        ty: BlockType,
    },
    /// Conditional block
    If {
        /// Block signature
        ty:    BlockType,
        /// Index of the matching `else`, if any
        else_: Option<u32>,
        /// Index of the matching `end`
        end:   u32,
    },
    /// Start of the false branch; reached from the true branch it skips to `end`
    Else {
        /// Index of the matching `end`
        end: u32,
    },
    /// End of a block or of the function
    End,
    /// Unconditional branch to a relative label depth
    Br(u32),
    /// Conditional branch
    BrIf(u32),
    /// Indexed branch
    BrTable {
        /// Label depths by index
        targets: Box<[u32]>,
        /// Label depth for out-of-range indices
        default: u32,
    },
    /// Return from the function
    Return,
    /// Direct call
    Call(u32),
    /// Call through a table with a runtime signature check
    CallIndirect {
        /// Expected type index
        type_idx: u32,
        /// Table index
        table:    u32,
    },
    /// Discard the top operand
    Drop,
    /// Choose between two operands; typed form carries its type
    Select(Option<ValueType>),
    #[allow(missing_docs)]
    LocalGet(u32),
    #[allow(missing_docs)]
    LocalSet(u32),
    #[allow(missing_docs)]
    LocalTee(u32),
    #[allow(missing_docs)]
    GlobalGet(u32),
    #[allow(missing_docs)]
    GlobalSet(u32),
    /// Memory load with static offset
    Load {
        /// Operator
        op:     LoadOp,
        /// Static offset added to the address operand
        offset: u32,
    },
    /// Memory store with static offset
    Store {
        /// Operator
        op:     StoreOp,
        /// Static offset added to the address operand
        offset: u32,
    },
    /// Current memory size in pages
    MemorySize,
    /// Grow memory; pushes the previous size or -1
    MemoryGrow,
    /// `memory.copy`
    MemoryCopy,
    /// `memory.fill`
    MemoryFill,
    #[allow(missing_docs)]
    I32Const(i32),
    #[allow(missing_docs)]
    I64Const(i64),
    #[allow(missing_docs)]
    F32Const(FloatBits32),
    #[allow(missing_docs)]
    F64Const(FloatBits64),
    #[allow(missing_docs)]
    I32Eqz,
    #[allow(missing_docs)]
    I64Eqz,
    #[allow(missing_docs)]
    I32Compare(IntRelOp),
    #[allow(missing_docs)]
    I64Compare(IntRelOp),
    #[allow(missing_docs)]
    F32Compare(FloatRelOp),
    #[allow(missing_docs)]
    F64Compare(FloatRelOp),
    #[allow(missing_docs)]
    I32Unary(IntUnOp),
    #[allow(missing_docs)]
    I64Unary(IntUnOp),
    #[allow(missing_docs)]
    F32Unary(FloatUnOp),
    #[allow(missing_docs)]
    F64Unary(FloatUnOp),
    #[allow(missing_docs)]
    I32Binary(IntBinOp),
    #[allow(missing_docs)]
    I64Binary(IntBinOp),
    #[allow(missing_docs)]
    F32Binary(FloatBinOp),
    #[allow(missing_docs)]
    F64Binary(FloatBinOp),
    #[allow(missing_docs)]
    Convert(ConvertOp),
}

const INT_REL: [IntRelOp; 10] = [
    IntRelOp::Eq,
    IntRelOp::Ne,
    IntRelOp::LtS,
    IntRelOp::LtU,
    IntRelOp::GtS,
    IntRelOp::GtU,
    IntRelOp::LeS,
    IntRelOp::LeU,
    IntRelOp::GeS,
    IntRelOp::GeU,
];

const FLOAT_REL: [FloatRelOp; 6] = [
    FloatRelOp::Eq,
    FloatRelOp::Ne,
    FloatRelOp::Lt,
    FloatRelOp::Gt,
    FloatRelOp::Le,
    FloatRelOp::Ge,
];

const INT_UN: [IntUnOp; 3] = [IntUnOp::Clz, IntUnOp::Ctz, IntUnOp::Popcnt];

const INT_BIN: [IntBinOp; 15] = [
    IntBinOp::Add,
    IntBinOp::Sub,
    IntBinOp::Mul,
    IntBinOp::DivS,
    IntBinOp::DivU,
    IntBinOp::RemS,
    IntBinOp::RemU,
    IntBinOp::And,
    IntBinOp::Or,
    IntBinOp::Xor,
    IntBinOp::Shl,
    IntBinOp::ShrS,
    IntBinOp::ShrU,
    IntBinOp::Rotl,
    IntBinOp::Rotr,
];

const FLOAT_UN: [FloatUnOp; 7] = [
    FloatUnOp::Abs,
    FloatUnOp::Neg,
    FloatUnOp::Ceil,
    FloatUnOp::Floor,
    FloatUnOp::Trunc,
    FloatUnOp::Nearest,
    FloatUnOp::Sqrt,
];

const FLOAT_BIN: [FloatBinOp; 7] = [
    FloatBinOp::Add,
    FloatBinOp::Sub,
    FloatBinOp::Mul,
    FloatBinOp::Div,
    FloatBinOp::Min,
    FloatBinOp::Max,
    FloatBinOp::Copysign,
];

const LOADS: [LoadOp; 14] = [
    LoadOp::I32Load,
    LoadOp::I64Load,
    LoadOp::F32Load,
    LoadOp::F64Load,
    LoadOp::I32Load8S,
    LoadOp::I32Load8U,
    LoadOp::I32Load16S,
    LoadOp::I32Load16U,
    LoadOp::I64Load8S,
    LoadOp::I64Load8U,
    LoadOp::I64Load16S,
    LoadOp::I64Load16U,
    LoadOp::I64Load32S,
    LoadOp::I64Load32U,
];

const STORES: [StoreOp; 9] = [
    StoreOp::I32Store,
    StoreOp::I64Store,
    StoreOp::F32Store,
    StoreOp::F64Store,
    StoreOp::I32Store8,
    StoreOp::I32Store16,
    StoreOp::I64Store8,
    StoreOp::I64Store16,
    StoreOp::I64Store32,
];

/// Decode the dense numeric opcode range `0x45..=0xC4`.
fn decode_numeric(opcode: u8) -> Option<Instruction> {
    use Instruction::*;
    let at = |base: u8| usize::from(opcode - base);
    Some(match opcode {
        0x45 => I32Eqz,
        0x46..=0x4F => I32Compare(INT_REL[at(0x46)]),
        0x50 => I64Eqz,
        0x51..=0x5A => I64Compare(INT_REL[at(0x51)]),
        0x5B..=0x60 => F32Compare(FLOAT_REL[at(0x5B)]),
        0x61..=0x66 => F64Compare(FLOAT_REL[at(0x61)]),
        0x67..=0x69 => I32Unary(INT_UN[at(0x67)]),
        0x6A..=0x78 => I32Binary(INT_BIN[at(0x6A)]),
        0x79..=0x7B => I64Unary(INT_UN[at(0x79)]),
        0x7C..=0x8A => I64Binary(INT_BIN[at(0x7C)]),
        0x8B..=0x91 => F32Unary(FLOAT_UN[at(0x8B)]),
        0x92..=0x98 => F32Binary(FLOAT_BIN[at(0x92)]),
        0x99..=0x9F => F64Unary(FLOAT_UN[at(0x99)]),
        0xA0..=0xA6 => F64Binary(FLOAT_BIN[at(0xA0)]),
        0xA7..=0xBF => Convert(MVP_CONVERSIONS[at(0xA7)]),
        0xC0 => I32Unary(IntUnOp::Extend8S),
        0xC1 => I32Unary(IntUnOp::Extend16S),
        0xC2 => I64Unary(IntUnOp::Extend8S),
        0xC3 => I64Unary(IntUnOp::Extend16S),
        0xC4 => I64Unary(IntUnOp::Extend32S),
        _ => return None,
    })
}

/// Read a block type: `0x40`, a value type, or a non-negative s33 type index.
fn read_block_type(reader: &mut BinaryReader<'_>) -> Result<BlockType> {
    let pos = reader.pos();
    let byte = reader.peek_u8()?;
    if byte == lwrt_format::BLOCK_TYPE_EMPTY {
        reader.u8()?;
        return Ok(BlockType::Empty);
    }
    if let Ok(ty) = ValueType::from_binary(byte) {
        reader.u8()?;
        return Ok(BlockType::Value(ty));
    }
    let idx = reader.read(lwrt_format::read_leb128_i33)?;
    u32::try_from(idx)
        .map(BlockType::Func)
        .map_err(|_| LoadError::malformed(pos, "malformed block type"))
}

/// Read a memarg and check its alignment against the access width.
fn read_memarg(reader: &mut BinaryReader<'_>, width: u32, func: u32) -> Result<u32> {
    let align = reader.u32()?;
    let offset = reader.u32()?;
    if align > width.trailing_zeros() {
        return Err(LoadError::invalid_in(func, "alignment must not be larger than natural"));
    }
    Ok(offset)
}

fn expect_zero_byte(reader: &mut BinaryReader<'_>) -> Result<()> {
    let pos = reader.pos();
    match reader.u8()? {
        0 => Ok(()),
        _ => Err(LoadError::malformed(pos, "zero byte expected")),
    }
}

/// Open structured instruction awaiting its `end`
struct OpenBlock {
    start: usize,
    else_: Option<usize>,
}

fn index(at: usize) -> u32 {
    // Bodies are bounded by the u32 section size, so indices fit
    at as u32
}

/// Decode the instruction sequence of one function body.
///
/// `func` is the function's index in the function index space, used for
/// error reporting. Decoding stops at the `end` that closes the body, which
/// must be the last byte of `reader`.
///
/// # Errors
///
/// `MalformedEncoding` for unknown opcodes, truncation and trailing bytes;
/// `ValidationFailed` for misplaced `else` and over-aligned memory access.
pub fn decode_body(reader: &mut BinaryReader<'_>, func: u32) -> Result<Vec<Instruction>> {
    let mut code = Vec::new();
    let mut open: Vec<OpenBlock> = Vec::new();

    loop {
        let pos = reader.pos();
        let opcode = reader.u8()?;
        let at = code.len();
        let instr = match opcode {
            op::UNREACHABLE => Instruction::Unreachable,
            op::NOP => Instruction::Nop,
            op::BLOCK => {
                let ty = read_block_type(reader)?;
                open.push(OpenBlock {
                    start: at,
                    else_: None,
                });
                Instruction::Block { ty, end: 0 }
            },
            op::LOOP => {
                let ty = read_block_type(reader)?;
                open.push(OpenBlock {
                    start: at,
                    else_: None,
                });
                Instruction::Loop { ty }
            },
            op::IF => {
                let ty = read_block_type(reader)?;
                open.push(OpenBlock {
                    start: at,
                    else_: None,
                });
                Instruction::If {
                    ty,
                    else_: None,
                    end: 0,
                }
            },
            op::ELSE => {
                let block = open
                    .last_mut()
                    .filter(|b| {
                        b.else_.is_none() && matches!(code[b.start], Instruction::If { .. })
                    })
                    .ok_or(LoadError::invalid_in(func, "else without matching if"))?;
                block.else_ = Some(at);
                Instruction::Else { end: 0 }
            },
            op::END => {
                match open.pop() {
                    Some(block) => patch_end(&mut code, &block, at),
                    None => {
                        code.push(Instruction::End);
                        reader.expect_end("operators remaining after end of function")?;
                        return Ok(code);
                    },
                }
                Instruction::End
            },
            op::BR => Instruction::Br(reader.u32()?),
            op::BR_IF => Instruction::BrIf(reader.u32()?),
            op::BR_TABLE => {
                let targets = reader.vec(BinaryReader::u32)?;
                let default = reader.u32()?;
                Instruction::BrTable {
                    targets: targets.into_boxed_slice(),
                    default,
                }
            },
            op::RETURN => Instruction::Return,
            op::CALL => Instruction::Call(reader.u32()?),
            op::CALL_INDIRECT => {
                let type_idx = reader.u32()?;
                let table = reader.u32()?;
                Instruction::CallIndirect { type_idx, table }
            },
            op::DROP => Instruction::Drop,
            op::SELECT => Instruction::Select(None),
            op::SELECT_TYPED => {
                let types = reader.vec(BinaryReader::value_type)?;
                match types.as_slice() {
                    [ty] => Instruction::Select(Some(*ty)),
                    _ => return Err(LoadError::invalid_in(func, "invalid result arity")),
                }
            },
            op::LOCAL_GET => Instruction::LocalGet(reader.u32()?),
            op::LOCAL_SET => Instruction::LocalSet(reader.u32()?),
            op::LOCAL_TEE => Instruction::LocalTee(reader.u32()?),
            op::GLOBAL_GET => Instruction::GlobalGet(reader.u32()?),
            op::GLOBAL_SET => Instruction::GlobalSet(reader.u32()?),
            op::I32_LOAD..=op::I64_LOAD32_U => {
                let load = LOADS[usize::from(opcode - op::I32_LOAD)];
                let offset = read_memarg(reader, load.width(), func)?;
                Instruction::Load { op: load, offset }
            },
            op::I32_STORE..=op::I64_STORE32 => {
                let store = STORES[usize::from(opcode - op::I32_STORE)];
                let offset = read_memarg(reader, store.width(), func)?;
                Instruction::Store { op: store, offset }
            },
            op::MEMORY_SIZE => {
                expect_zero_byte(reader)?;
                Instruction::MemorySize
            },
            op::MEMORY_GROW => {
                expect_zero_byte(reader)?;
                Instruction::MemoryGrow
            },
            op::I32_CONST => Instruction::I32Const(reader.i32()?),
            op::I64_CONST => Instruction::I64Const(reader.i64()?),
            op::F32_CONST => {
                Instruction::F32Const(FloatBits32(reader.read(lwrt_format::read_f32_bits)?))
            },
            op::F64_CONST => {
                Instruction::F64Const(FloatBits64(reader.read(lwrt_format::read_f64_bits)?))
            },
            op::MISC_PREFIX => decode_misc(reader, pos)?,
            _ => decode_numeric(opcode)
                .ok_or(LoadError::malformed(pos, "illegal opcode"))?,
        };
        code.push(instr);
    }
}

/// Decode a `0xFC`-prefixed instruction.
fn decode_misc(reader: &mut BinaryReader<'_>, pos: usize) -> Result<Instruction> {
    let sub = reader.u32()?;
    match sub {
        op::TRUNC_SAT_FIRST..=op::TRUNC_SAT_LAST => {
            Ok(Instruction::Convert(SAT_CONVERSIONS[sub as usize]))
        },
        op::MEMORY_COPY => {
            expect_zero_byte(reader)?;
            expect_zero_byte(reader)?;
            Ok(Instruction::MemoryCopy)
        },
        op::MEMORY_FILL => {
            expect_zero_byte(reader)?;
            Ok(Instruction::MemoryFill)
        },
        _ => Err(LoadError::malformed(pos, "illegal opcode")),
    }
}

/// Point the block opened at `block.start` (and its `else`) at `end`.
fn patch_end(code: &mut [Instruction], block: &OpenBlock, end: usize) {
    let end_idx = index(end);
    let else_idx = block.else_.map(index);
    match &mut code[block.start] {
        Instruction::Block { end, .. } => *end = end_idx,
        Instruction::If { else_, end, .. } => {
            *else_ = else_idx;
            *end = end_idx;
        },
        _ => {},
    }
    if let Some(at) = block.else_ {
        if let Instruction::Else { end } = &mut code[at] {
            *end = end_idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<Vec<Instruction>> {
        decode_body(&mut BinaryReader::new(bytes, 0), 0)
    }

    #[test]
    fn test_control_targets_are_resolved() -> Result<()> {
        // if (result i32) i32.const 1 else i32.const 2 end end
        let code = decode(&[0x04, 0x7F, 0x41, 0x01, 0x05, 0x41, 0x02, 0x0B, 0x0B])?;
        assert_eq!(
            code[0],
            Instruction::If {
                ty:    BlockType::Value(ValueType::I32),
                else_: Some(2),
                end:   4,
            }
        );
        assert_eq!(code[2], Instruction::Else { end: 4 });
        assert_eq!(code.len(), 6);
        Ok(())
    }

    #[test]
    fn test_numeric_ranges() {
        assert_eq!(decode_numeric(0x6A), Some(Instruction::I32Binary(IntBinOp::Add)));
        assert_eq!(decode_numeric(0x8A), Some(Instruction::I64Binary(IntBinOp::Rotr)));
        assert_eq!(decode_numeric(0xA6), Some(Instruction::F64Binary(FloatBinOp::Copysign)));
        assert_eq!(
            decode_numeric(0xBF),
            Some(Instruction::Convert(ConvertOp::F64ReinterpretI64))
        );
        assert_eq!(decode_numeric(0xC5), None);
    }

    #[test]
    fn test_missing_final_end_is_malformed() {
        assert!(matches!(decode(&[0x01, 0x01]), Err(LoadError::MalformedEncoding { .. })));
    }

    #[test]
    fn test_trailing_bytes_after_end() {
        assert_eq!(
            decode(&[0x0B, 0x01]),
            Err(LoadError::malformed(1, "operators remaining after end of function"))
        );
    }

    #[test]
    fn test_over_aligned_access_is_invalid() {
        // i32.load align=3 (8 bytes) offset=0
        assert!(matches!(
            decode(&[0x41, 0x00, 0x28, 0x03, 0x00, 0x1A, 0x0B]),
            Err(LoadError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_misc_prefix() -> Result<()> {
        let code = decode(&[0xFC, 0x07, 0xFC, 0x0A, 0x00, 0x00, 0x0B])?;
        assert_eq!(code[0], Instruction::Convert(ConvertOp::I64TruncSatF64U));
        assert_eq!(code[1], Instruction::MemoryCopy);
        Ok(())
    }
}
