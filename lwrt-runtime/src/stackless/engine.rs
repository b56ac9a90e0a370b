// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The dispatch loop.

use std::time::Instant;

use lwrt_decoder::{
    BlockType, ConvertOp, FloatBinOp, FloatRelOp, FloatUnOp, IntBinOp, IntRelOp, IntUnOp, LoadOp,
    StoreOp,
};
use lwrt_foundation::{tracing::ExecutionTrace, FloatBits32, FloatBits64};

use super::frame::{Label, StacklessFrame};
use crate::{execution::ExecutionStats, prelude::*};

const fn invariant(message: &'static str) -> Trap {
    Trap::Host(Error::engine_invariant(message))
}

/// What the dispatch loop does after an instruction
enum Flow {
    /// Next instruction in the same frame
    Continue,
    /// Call a function; the index is set for direct calls
    Call(Arc<FuncInstance>, Option<u32>),
    /// Leave the current frame
    Return,
}

/// The view of the caller a host function receives
struct CallerContext<'a> {
    memory: Option<&'a Memory>,
}

impl HostContext for CallerContext<'_> {
    fn memory(&self) -> Option<&dyn MemoryAccessor> {
        self.memory.map(|memory| memory as &dyn MemoryAccessor)
    }
}

/// Parameter and result counts of a block type
fn block_arity(module: &Module, ty: BlockType) -> (usize, usize) {
    match ty {
        BlockType::Empty => (0, 0),
        BlockType::Value(_) => (0, 1),
        BlockType::Func(idx) => module
            .types
            .get(idx as usize)
            .map_or((0, 0), |t| (t.params.len(), t.results.len())),
    }
}

macro_rules! int_ops {
    ($int:ty, $uint:ty, $bits:expr, $unary:ident, $binary:ident, $compare:ident,
     $div_s:path, $div_u:path, $rem_s:path, $rem_u:path) => {
        fn $unary(op: IntUnOp, v: $int) -> $int {
            match op {
                IntUnOp::Clz => v.leading_zeros() as $int,
                IntUnOp::Ctz => v.trailing_zeros() as $int,
                IntUnOp::Popcnt => v.count_ones() as $int,
                IntUnOp::Extend8S => v as i8 as $int,
                IntUnOp::Extend16S => v as i16 as $int,
                IntUnOp::Extend32S => v as i32 as $int,
            }
        }

        fn $binary(op: IntBinOp, a: $int, b: $int) -> Result<$int, Trap> {
            Ok(match op {
                IntBinOp::Add => a.wrapping_add(b),
                IntBinOp::Sub => a.wrapping_sub(b),
                IntBinOp::Mul => a.wrapping_mul(b),
                IntBinOp::DivS => $div_s(a, b)?,
                IntBinOp::DivU => $div_u(a, b)?,
                IntBinOp::RemS => $rem_s(a, b)?,
                IntBinOp::RemU => $rem_u(a, b)?,
                IntBinOp::And => a & b,
                IntBinOp::Or => a | b,
                IntBinOp::Xor => a ^ b,
                IntBinOp::Shl => a.wrapping_shl(b as u32),
                IntBinOp::ShrS => a.wrapping_shr(b as u32),
                IntBinOp::ShrU => (a as $uint).wrapping_shr(b as u32) as $int,
                IntBinOp::Rotl => a.rotate_left((b as u32) % $bits),
                IntBinOp::Rotr => a.rotate_right((b as u32) % $bits),
            })
        }

        fn $compare(op: IntRelOp, a: $int, b: $int) -> bool {
            match op {
                IntRelOp::Eq => a == b,
                IntRelOp::Ne => a != b,
                IntRelOp::LtS => a < b,
                IntRelOp::LtU => (a as $uint) < (b as $uint),
                IntRelOp::GtS => a > b,
                IntRelOp::GtU => (a as $uint) > (b as $uint),
                IntRelOp::LeS => a <= b,
                IntRelOp::LeU => (a as $uint) <= (b as $uint),
                IntRelOp::GeS => a >= b,
                IntRelOp::GeU => (a as $uint) >= (b as $uint),
            }
        }
    };
}

int_ops!(
    i32, u32, 32, i32_unary, i32_binary, i32_compare,
    lwrt_math::i32_div_s, lwrt_math::i32_div_u, lwrt_math::i32_rem_s, lwrt_math::i32_rem_u
);
int_ops!(
    i64, u64, 64, i64_unary, i64_binary, i64_compare,
    lwrt_math::i64_div_s, lwrt_math::i64_div_u, lwrt_math::i64_rem_s, lwrt_math::i64_rem_u
);

// Abs, neg and copysign only touch the sign bit so NaN payloads survive.
macro_rules! float_ops {
    ($float:ty, $bits:ty, $sign:expr, $unary:ident, $binary:ident, $compare:ident,
     $min:path, $max:path, $nearest:path) => {
        fn $unary(op: FloatUnOp, bits: $bits) -> $bits {
            let v = <$float>::from_bits(bits);
            match op {
                FloatUnOp::Abs => bits & !$sign,
                FloatUnOp::Neg => bits ^ $sign,
                FloatUnOp::Ceil => v.ceil().to_bits(),
                FloatUnOp::Floor => v.floor().to_bits(),
                FloatUnOp::Trunc => v.trunc().to_bits(),
                FloatUnOp::Nearest => $nearest(v).to_bits(),
                FloatUnOp::Sqrt => v.sqrt().to_bits(),
            }
        }

        fn $binary(op: FloatBinOp, a: $bits, b: $bits) -> $bits {
            let (x, y) = (<$float>::from_bits(a), <$float>::from_bits(b));
            match op {
                FloatBinOp::Add => (x + y).to_bits(),
                FloatBinOp::Sub => (x - y).to_bits(),
                FloatBinOp::Mul => (x * y).to_bits(),
                FloatBinOp::Div => (x / y).to_bits(),
                FloatBinOp::Min => $min(x, y).to_bits(),
                FloatBinOp::Max => $max(x, y).to_bits(),
                FloatBinOp::Copysign => (a & !$sign) | (b & $sign),
            }
        }

        fn $compare(op: FloatRelOp, a: $bits, b: $bits) -> bool {
            let (x, y) = (<$float>::from_bits(a), <$float>::from_bits(b));
            match op {
                FloatRelOp::Eq => x == y,
                FloatRelOp::Ne => x != y,
                FloatRelOp::Lt => x < y,
                FloatRelOp::Gt => x > y,
                FloatRelOp::Le => x <= y,
                FloatRelOp::Ge => x >= y,
            }
        }
    };
}

float_ops!(
    f32, u32, 0x8000_0000_u32, f32_unary, f32_binary, f32_compare,
    lwrt_math::f32_min, lwrt_math::f32_max, lwrt_math::f32_nearest
);
float_ops!(
    f64, u64, 0x8000_0000_0000_0000_u64, f64_unary, f64_binary, f64_compare,
    lwrt_math::f64_min, lwrt_math::f64_max, lwrt_math::f64_nearest
);

fn convert(op: ConvertOp, v: Value) -> Result<Value, Trap> {
    use ConvertOp::*;

    let i32_of = |v: Value| v.as_i32().ok_or(invariant("Expected i32 operand"));
    let i64_of = |v: Value| v.as_i64().ok_or(invariant("Expected i64 operand"));
    let f32_of = |v: Value| v.as_f32().ok_or(invariant("Expected f32 operand"));
    let f64_of = |v: Value| v.as_f64().ok_or(invariant("Expected f64 operand"));

    Ok(match op {
        I32WrapI64 => Value::I32(i64_of(v)? as i32),
        I32TruncF32S => Value::I32(lwrt_math::i32_trunc_s(f64::from(f32_of(v)?))?),
        I32TruncF32U => Value::I32(lwrt_math::i32_trunc_u(f64::from(f32_of(v)?))?),
        I32TruncF64S => Value::I32(lwrt_math::i32_trunc_s(f64_of(v)?)?),
        I32TruncF64U => Value::I32(lwrt_math::i32_trunc_u(f64_of(v)?)?),
        I64ExtendI32S => Value::I64(i64::from(i32_of(v)?)),
        I64ExtendI32U => Value::I64(i64::from(i32_of(v)? as u32)),
        I64TruncF32S => Value::I64(lwrt_math::i64_trunc_s(f64::from(f32_of(v)?))?),
        I64TruncF32U => Value::I64(lwrt_math::i64_trunc_u(f64::from(f32_of(v)?))?),
        I64TruncF64S => Value::I64(lwrt_math::i64_trunc_s(f64_of(v)?)?),
        I64TruncF64U => Value::I64(lwrt_math::i64_trunc_u(f64_of(v)?)?),
        F32ConvertI32S => Value::f32(i32_of(v)? as f32),
        F32ConvertI32U => Value::f32(i32_of(v)? as u32 as f32),
        F32ConvertI64S => Value::f32(i64_of(v)? as f32),
        F32ConvertI64U => Value::f32(i64_of(v)? as u64 as f32),
        F32DemoteF64 => Value::f32(f64_of(v)? as f32),
        F64ConvertI32S => Value::f64(f64::from(i32_of(v)?)),
        F64ConvertI32U => Value::f64(f64::from(i32_of(v)? as u32)),
        F64ConvertI64S => Value::f64(i64_of(v)? as f64),
        F64ConvertI64U => Value::f64(i64_of(v)? as u64 as f64),
        F64PromoteF32 => Value::f64(f64::from(f32_of(v)?)),
        I32ReinterpretF32 => match v {
            Value::F32(bits) => Value::I32(bits.to_bits() as i32),
            _ => return Err(invariant("Expected f32 operand")),
        },
        I64ReinterpretF64 => match v {
            Value::F64(bits) => Value::I64(bits.to_bits() as i64),
            _ => return Err(invariant("Expected f64 operand")),
        },
        F32ReinterpretI32 => Value::F32(FloatBits32::from_bits(i32_of(v)? as u32)),
        F64ReinterpretI64 => Value::F64(FloatBits64::from_bits(i64_of(v)? as u64)),
        I32TruncSatF32S => Value::I32(lwrt_math::i32_trunc_sat_s(f64::from(f32_of(v)?))),
        I32TruncSatF32U => Value::I32(lwrt_math::i32_trunc_sat_u(f64::from(f32_of(v)?))),
        I32TruncSatF64S => Value::I32(lwrt_math::i32_trunc_sat_s(f64_of(v)?)),
        I32TruncSatF64U => Value::I32(lwrt_math::i32_trunc_sat_u(f64_of(v)?)),
        I64TruncSatF32S => Value::I64(lwrt_math::i64_trunc_sat_s(f64::from(f32_of(v)?))),
        I64TruncSatF32U => Value::I64(lwrt_math::i64_trunc_sat_u(f64::from(f32_of(v)?))),
        I64TruncSatF64S => Value::I64(lwrt_math::i64_trunc_sat_s(f64_of(v)?)),
        I64TruncSatF64U => Value::I64(lwrt_math::i64_trunc_sat_u(f64_of(v)?)),
    })
}

fn load(memory: &Memory, op: LoadOp, addr: u32, offset: u32) -> Result<Value, Trap> {
    Ok(match op {
        LoadOp::I32Load => Value::I32(i32::from_le_bytes(memory.load(addr, offset)?)),
        LoadOp::I64Load => Value::I64(i64::from_le_bytes(memory.load(addr, offset)?)),
        LoadOp::F32Load => {
            Value::F32(FloatBits32::from_bits(u32::from_le_bytes(memory.load(addr, offset)?)))
        },
        LoadOp::F64Load => {
            Value::F64(FloatBits64::from_bits(u64::from_le_bytes(memory.load(addr, offset)?)))
        },
        LoadOp::I32Load8S => Value::I32(i32::from(i8::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I32Load8U => Value::I32(i32::from(u8::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I32Load16S => Value::I32(i32::from(i16::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I32Load16U => Value::I32(i32::from(u16::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I64Load8S => Value::I64(i64::from(i8::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I64Load8U => Value::I64(i64::from(u8::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I64Load16S => Value::I64(i64::from(i16::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I64Load16U => Value::I64(i64::from(u16::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I64Load32S => Value::I64(i64::from(i32::from_le_bytes(memory.load(addr, offset)?))),
        LoadOp::I64Load32U => Value::I64(i64::from(u32::from_le_bytes(memory.load(addr, offset)?))),
    })
}

fn store(memory: &Memory, op: StoreOp, addr: u32, offset: u32, value: Value) -> Result<(), Trap> {
    let bits = match value {
        Value::I32(v) => u64::from(v as u32),
        Value::I64(v) => v as u64,
        Value::F32(v) => u64::from(v.to_bits()),
        Value::F64(v) => v.to_bits(),
    };
    let width = op.width() as usize;
    memory.store(addr, offset, &bits.to_le_bytes()[..width])
}

/// Executes WebAssembly functions for one top-level call
pub struct StacklessEngine<'c> {
    config:      &'c EngineConfig,
    /// Operand stack shared by all frames
    stack:       Vec<Value>,
    /// Call frames, innermost last
    frames:      Vec<StacklessFrame>,
    stats:       ExecutionStats,
    fuel:        Option<u64>,
    deadline:    Option<Instant>,
    until_check: u32,
}

impl<'c> StacklessEngine<'c> {
    /// Create an engine enforcing `config`
    #[must_use]
    pub fn new(config: &'c EngineConfig) -> Self {
        Self {
            config,
            stack: Vec::new(),
            frames: Vec::new(),
            stats: ExecutionStats::default(),
            fuel: config.fuel,
            deadline: None,
            until_check: config.check_interval.max(1),
        }
    }

    /// Statistics gathered so far
    #[must_use]
    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Remaining fuel, if metering is on
    #[must_use]
    pub fn fuel(&self) -> Option<u64> {
        self.fuel
    }

    /// Run `func` with type-checked `args` until it returns or traps.
    ///
    /// # Errors
    ///
    /// The trap that ended execution. The engine is left empty either way.
    pub fn invoke(&mut self, func: &Arc<FuncInstance>, args: &[Value]) -> Result<Vec<Value>, Trap> {
        self.deadline = self.config.deadline.map(|budget| Instant::now() + budget);
        self.stack.clear();
        self.frames.clear();
        self.stack.extend_from_slice(args);

        let result = self.call_function(func, None, None).and_then(|pushed| {
            if pushed {
                self.run()?;
            }
            let results = func.ty().results.len();
            let split = self.stack.len().checked_sub(results).ok_or(invariant("Missing results"))?;
            Ok(self.stack.split_off(split))
        });
        self.stack.clear();
        self.frames.clear();
        result
    }

    /// Enter `func`. Host functions run to completion here; for WebAssembly
    /// functions a frame is pushed and `true` returned.
    fn call_function(
        &mut self,
        func: &Arc<FuncInstance>,
        caller: Option<&Arc<ModuleInstance>>,
        func_idx: Option<u32>,
    ) -> Result<bool, Trap> {
        let params = func.ty().params.len();
        let base = self.stack.len().checked_sub(params).ok_or(invariant("Missing arguments"))?;

        match func.as_ref() {
            FuncInstance::Host(host) => {
                let (module, name) = caller
                    .zip(func_idx)
                    .and_then(|(instance, idx)| instance.import_name(idx))
                    .unwrap_or(("<indirect>", "<host>"));
                let span = ExecutionTrace::host_call(module, name);
                let _guard = span.enter();

                let args: Vec<Value> = self.stack.drain(base..).collect();
                trace!(?args, "calling host function");
                self.stats.increment_host_calls();
                let mut ctx = CallerContext {
                    memory: caller.and_then(|instance| instance.memory()).map(Arc::as_ref),
                };
                let results = host.call(&mut ctx, &args)?;
                self.stack.extend(results);
                Ok(false)
            },
            FuncInstance::Wasm { instance, index, ty } => {
                let instance = instance.upgrade().ok_or(Trap::Host(Error::INSTANCE_DROPPED))?;
                if self.frames.len() >= self.config.max_call_depth {
                    debug!(depth = self.frames.len(), "call stack exhausted");
                    return Err(Trap::StackOverflow);
                }
                let body = instance.body(*index).ok_or(invariant("Missing function body"))?;
                let mut locals: Vec<Value> = self.stack.drain(base..).collect();
                locals.extend(body.locals.iter().map(|ty| Value::default_for_type(*ty)));

                trace!(func_idx = index, depth = self.frames.len() + 1, "entering function");
                self.frames.push(StacklessFrame {
                    instance,
                    func_idx: *index,
                    pc: 0,
                    locals,
                    base,
                    arity: ty.results.len(),
                    labels: Vec::new(),
                });
                self.stats.increment_function_calls();
                self.stats.update_call_depth(self.frames.len());
                Ok(true)
            },
        }
    }

    fn run(&mut self) -> Result<(), Trap> {
        while let Some(frame) = self.frames.last() {
            let instance = Arc::clone(&frame.instance);
            let base = frame.base;
            let body = instance.body(frame.func_idx).ok_or(invariant("Missing function body"))?;

            loop {
                let frame = self.frames.last_mut().ok_or(invariant("Missing frame"))?;
                let pc = frame.pc;
                frame.pc += 1;
                let instr = body.code.get(pc).ok_or(invariant("Fell off the end of a function"))?;

                self.tick()?;
                let flow = self.step(&instance, instr)?;

                let height = self.stack.len().saturating_sub(base);
                if height > self.config.max_value_stack {
                    debug!(height, "operand stack exhausted");
                    return Err(Trap::StackOverflow);
                }
                self.stats.update_stack_height(height);

                match flow {
                    Flow::Continue => {},
                    Flow::Call(func, idx) => {
                        if self.call_function(&func, Some(&instance), idx)? {
                            break;
                        }
                    },
                    Flow::Return => {
                        self.return_from_function()?;
                        break;
                    },
                }
            }
        }
        Ok(())
    }

    /// Charge one instruction against the fuel and deadline budgets
    fn tick(&mut self) -> Result<(), Trap> {
        if let Some(fuel) = &mut self.fuel {
            if *fuel == 0 {
                debug!("fuel exhausted");
                return Err(Trap::Cancelled);
            }
            *fuel -= 1;
        }
        self.stats.increment_instructions(1);
        if let Some(deadline) = self.deadline {
            self.until_check -= 1;
            if self.until_check == 0 {
                self.until_check = self.config.check_interval.max(1);
                if Instant::now() >= deadline {
                    debug!("deadline exceeded");
                    return Err(Trap::Cancelled);
                }
            }
        }
        Ok(())
    }

    fn frame(&mut self) -> Result<&mut StacklessFrame, Trap> {
        self.frames.last_mut().ok_or(invariant("Missing frame"))
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value, Trap> {
        self.stack.pop().ok_or(invariant("Operand stack underflow"))
    }

    fn pop_i32(&mut self) -> Result<i32, Trap> {
        self.pop()?.as_i32().ok_or(invariant("Expected i32 operand"))
    }

    fn pop_i64(&mut self) -> Result<i64, Trap> {
        self.pop()?.as_i64().ok_or(invariant("Expected i64 operand"))
    }

    fn pop_f32_bits(&mut self) -> Result<u32, Trap> {
        match self.pop()? {
            Value::F32(bits) => Ok(bits.to_bits()),
            _ => Err(invariant("Expected f32 operand")),
        }
    }

    fn pop_f64_bits(&mut self) -> Result<u64, Trap> {
        match self.pop()? {
            Value::F64(bits) => Ok(bits.to_bits()),
            _ => Err(invariant("Expected f64 operand")),
        }
    }

    fn push_label(&mut self, params: usize, label_arity: usize, continuation: usize, is_loop: bool) -> Result<(), Trap> {
        let height = self.stack.len().checked_sub(params).ok_or(invariant("Missing block parameters"))?;
        self.frame()?.labels.push(Label {
            arity: label_arity,
            height,
            continuation,
            is_loop,
        });
        Ok(())
    }

    /// Branch to the label `depth` levels out; the outermost depth returns
    /// from the function.
    fn branch(&mut self, depth: u32) -> Result<Flow, Trap> {
        let frame = self.frames.last_mut().ok_or(invariant("Missing frame"))?;
        let depth = depth as usize;
        if depth >= frame.labels.len() {
            return Ok(Flow::Return);
        }
        let idx = frame.labels.len() - 1 - depth;
        let label = frame.labels[idx];

        let keep_from = self.stack.len().checked_sub(label.arity).ok_or(invariant("Missing branch values"))?;
        if label.height > keep_from {
            return Err(invariant("Label height above stack"));
        }
        self.stack.drain(label.height..keep_from);

        frame.labels.truncate(if label.is_loop { idx + 1 } else { idx });
        frame.pc = label.continuation;
        Ok(Flow::Continue)
    }

    fn return_from_function(&mut self) -> Result<(), Trap> {
        let frame = self.frames.pop().ok_or(invariant("Missing frame"))?;
        let keep_from = self.stack.len().checked_sub(frame.arity).ok_or(invariant("Missing results"))?;
        if frame.base > keep_from {
            return Err(invariant("Frame base above stack"));
        }
        self.stack.drain(frame.base..keep_from);
        Ok(())
    }

    fn memory(instance: &ModuleInstance) -> Result<&Memory, Trap> {
        instance.memory().map(Arc::as_ref).ok_or(Trap::Host(Error::MISSING_MEMORY))
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, instance: &Arc<ModuleInstance>, instr: &Instruction) -> Result<Flow, Trap> {
        match instr {
            Instruction::Unreachable => return Err(Trap::Unreachable),
            Instruction::Nop => {},
            Instruction::Block { ty, end } => {
                let (params, results) = block_arity(instance.module(), *ty);
                self.push_label(params, results, *end as usize + 1, false)?;
            },
            Instruction::Loop { ty } => {
                let (params, _) = block_arity(instance.module(), *ty);
                let continuation = self.frame()?.pc;
                self.push_label(params, params, continuation, true)?;
            },
            Instruction::If { ty, else_, end } => {
                let condition = self.pop_i32()?;
                let (params, results) = block_arity(instance.module(), *ty);
                let continuation = *end as usize + 1;
                if condition != 0 {
                    self.push_label(params, results, continuation, false)?;
                } else if let Some(else_) = else_ {
                    self.push_label(params, results, continuation, false)?;
                    self.frame()?.pc = *else_ as usize + 1;
                } else {
                    self.frame()?.pc = continuation;
                }
            },
            Instruction::Else { end } => {
                // End of the taken branch; the matching `end` pops the label
                self.frame()?.pc = *end as usize;
            },
            Instruction::End => {
                if self.frame()?.labels.pop().is_none() {
                    return Ok(Flow::Return);
                }
            },
            Instruction::Br(depth) => return self.branch(*depth),
            Instruction::BrIf(depth) => {
                if self.pop_i32()? != 0 {
                    return self.branch(*depth);
                }
            },
            Instruction::BrTable { targets, default } => {
                let idx = self.pop_i32()? as u32 as usize;
                let depth = targets.get(idx).copied().unwrap_or(*default);
                return self.branch(depth);
            },
            Instruction::Return => return Ok(Flow::Return),
            Instruction::Call(idx) => {
                let func = instance.func(*idx).cloned().ok_or(invariant("Unknown function"))?;
                return Ok(Flow::Call(func, Some(*idx)));
            },
            Instruction::CallIndirect { type_idx, .. } => {
                let expected = instance
                    .module()
                    .types
                    .get(*type_idx as usize)
                    .ok_or(invariant("Unknown type"))?;
                let table = instance.table().ok_or(invariant("Missing table"))?;
                let slot = self.pop_i32()? as u32;
                let func = table.get(slot)?.ok_or(Trap::UninitializedElement)?;
                if func.ty() != expected {
                    debug!(slot, expected = %expected, actual = %func.ty(), "indirect call type mismatch");
                    return Err(Trap::IndirectCallTypeMismatch);
                }
                return Ok(Flow::Call(func, None));
            },
            Instruction::Drop => {
                self.pop()?;
            },
            Instruction::Select(_) => {
                let condition = self.pop_i32()?;
                let second = self.pop()?;
                let first = self.pop()?;
                self.push(if condition != 0 { first } else { second });
            },
            Instruction::LocalGet(idx) => {
                let value = self.frame()?.get_local(*idx)?;
                self.push(value);
            },
            Instruction::LocalSet(idx) => {
                let value = self.pop()?;
                self.frame()?.set_local(*idx, value)?;
            },
            Instruction::LocalTee(idx) => {
                let value = *self.stack.last().ok_or(invariant("Operand stack underflow"))?;
                self.frame()?.set_local(*idx, value)?;
            },
            Instruction::GlobalGet(idx) => {
                let global = instance.global(*idx).ok_or(invariant("Unknown global"))?;
                self.push(global.get());
            },
            Instruction::GlobalSet(idx) => {
                let value = self.pop()?;
                let global = instance.global(*idx).ok_or(invariant("Unknown global"))?;
                global.set(value)?;
            },
            Instruction::Load { op, offset } => {
                let addr = self.pop_i32()? as u32;
                let value = load(Self::memory(instance)?, *op, addr, *offset)?;
                self.push(value);
            },
            Instruction::Store { op, offset } => {
                let value = self.pop()?;
                let addr = self.pop_i32()? as u32;
                store(Self::memory(instance)?, *op, addr, *offset, value)?;
            },
            Instruction::MemorySize => {
                let pages = Self::memory(instance)?.size();
                self.push(Value::I32(pages as i32));
            },
            Instruction::MemoryGrow => {
                let delta = self.pop_i32()? as u32;
                let previous = Self::memory(instance)?.grow(delta);
                self.push(Value::I32(previous.map_or(-1, |pages| pages as i32)));
            },
            Instruction::MemoryCopy => {
                let len = self.pop_i32()? as u32;
                let src = self.pop_i32()? as u32;
                let dst = self.pop_i32()? as u32;
                Self::memory(instance)?.copy_within(src, dst, len)?;
            },
            Instruction::MemoryFill => {
                let len = self.pop_i32()? as u32;
                let value = self.pop_i32()? as u8;
                let dst = self.pop_i32()? as u32;
                Self::memory(instance)?.fill(dst, value, len)?;
            },
            Instruction::I32Const(v) => self.push(Value::I32(*v)),
            Instruction::I64Const(v) => self.push(Value::I64(*v)),
            Instruction::F32Const(v) => self.push(Value::F32(*v)),
            Instruction::F64Const(v) => self.push(Value::F64(*v)),
            Instruction::I32Eqz => {
                let v = self.pop_i32()?;
                self.push(Value::I32(i32::from(v == 0)));
            },
            Instruction::I64Eqz => {
                let v = self.pop_i64()?;
                self.push(Value::I32(i32::from(v == 0)));
            },
            Instruction::I32Compare(op) => {
                let b = self.pop_i32()?;
                let a = self.pop_i32()?;
                self.push(Value::I32(i32::from(i32_compare(*op, a, b))));
            },
            Instruction::I64Compare(op) => {
                let b = self.pop_i64()?;
                let a = self.pop_i64()?;
                self.push(Value::I32(i32::from(i64_compare(*op, a, b))));
            },
            Instruction::F32Compare(op) => {
                let b = self.pop_f32_bits()?;
                let a = self.pop_f32_bits()?;
                self.push(Value::I32(i32::from(f32_compare(*op, a, b))));
            },
            Instruction::F64Compare(op) => {
                let b = self.pop_f64_bits()?;
                let a = self.pop_f64_bits()?;
                self.push(Value::I32(i32::from(f64_compare(*op, a, b))));
            },
            Instruction::I32Unary(op) => {
                let v = self.pop_i32()?;
                self.push(Value::I32(i32_unary(*op, v)));
            },
            Instruction::I64Unary(op) => {
                let v = self.pop_i64()?;
                self.push(Value::I64(i64_unary(*op, v)));
            },
            Instruction::F32Unary(op) => {
                let v = self.pop_f32_bits()?;
                self.push(Value::F32(FloatBits32::from_bits(f32_unary(*op, v))));
            },
            Instruction::F64Unary(op) => {
                let v = self.pop_f64_bits()?;
                self.push(Value::F64(FloatBits64::from_bits(f64_unary(*op, v))));
            },
            Instruction::I32Binary(op) => {
                let b = self.pop_i32()?;
                let a = self.pop_i32()?;
                self.push(Value::I32(i32_binary(*op, a, b)?));
            },
            Instruction::I64Binary(op) => {
                let b = self.pop_i64()?;
                let a = self.pop_i64()?;
                self.push(Value::I64(i64_binary(*op, a, b)?));
            },
            Instruction::F32Binary(op) => {
                let b = self.pop_f32_bits()?;
                let a = self.pop_f32_bits()?;
                self.push(Value::F32(FloatBits32::from_bits(f32_binary(*op, a, b))));
            },
            Instruction::F64Binary(op) => {
                let b = self.pop_f64_bits()?;
                let a = self.pop_f64_bits()?;
                self.push(Value::F64(FloatBits64::from_bits(f64_binary(*op, a, b))));
            },
            Instruction::Convert(op) => {
                let v = self.pop()?;
                self.push(convert(*op, v)?);
            },
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_helpers() {
        assert_eq!(i32_binary(IntBinOp::Add, i32::MAX, 1), Ok(i32::MIN));
        assert_eq!(i32_binary(IntBinOp::Shl, 1, 33), Ok(2));
        assert_eq!(i32_binary(IntBinOp::ShrU, -1, 28), Ok(0xF));
        assert_eq!(i32_binary(IntBinOp::ShrS, -16, 2), Ok(-4));
        assert_eq!(i32_binary(IntBinOp::Rotl, 0x8000_0001_u32 as i32, 1), Ok(3));
        assert_eq!(i32_binary(IntBinOp::DivU, 7, 0), Err(Trap::DivideByZero));
        assert_eq!(i64_binary(IntBinOp::RemS, i64::MIN, -1), Ok(0));
        assert_eq!(i32_unary(IntUnOp::Clz, 1), 31);
        assert_eq!(i64_unary(IntUnOp::Extend32S, 0x8000_0000), -0x8000_0000);
        assert!(i32_compare(IntRelOp::LtU, 1, -1));
        assert!(!i32_compare(IntRelOp::LtS, 1, -1));
    }

    #[test]
    fn test_float_sign_operations_keep_payload() {
        let nan = 0x7fc0_1234_u32;
        assert_eq!(f32_unary(FloatUnOp::Neg, nan), nan | 0x8000_0000);
        assert_eq!(f32_unary(FloatUnOp::Abs, nan | 0x8000_0000), nan);
        assert_eq!(f32_binary(FloatBinOp::Copysign, 1.5f32.to_bits(), (-0.0f32).to_bits()), (-1.5f32).to_bits());
        assert!(!f64_compare(FloatRelOp::Eq, f64::NAN.to_bits(), f64::NAN.to_bits()));
        assert!(f64_compare(FloatRelOp::Ne, f64::NAN.to_bits(), f64::NAN.to_bits()));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(convert(ConvertOp::I32WrapI64, Value::I64(0x1_0000_0002)), Ok(Value::I32(2)));
        assert_eq!(convert(ConvertOp::I64ExtendI32U, Value::I32(-1)), Ok(Value::I64(0xFFFF_FFFF)));
        assert_eq!(convert(ConvertOp::I32TruncF32S, Value::f32(f32::NAN)), Err(Trap::InvalidConversion));
        assert_eq!(convert(ConvertOp::I32TruncF64U, Value::f64(-1.0)), Err(Trap::IntegerOverflow));
        assert_eq!(convert(ConvertOp::I32TruncSatF64U, Value::f64(-1.0)), Ok(Value::I32(0)));
        assert_eq!(convert(ConvertOp::F32ConvertI32U, Value::I32(-1)), Ok(Value::f32(4_294_967_296.0)));
        assert_eq!(
            convert(ConvertOp::I32ReinterpretF32, Value::f32(1.0)),
            Ok(Value::I32(0x3f80_0000))
        );
    }
}
