// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Module validation.
//!
//! Module-level checks (indices, limits, constant expressions, exports,
//! imports) followed by one forward pass per function body that tracks an
//! abstract operand stack of value types and a stack of control frames.
//! After `unreachable`, `br`, `br_table` or `return` the rest of the current
//! block is stack-polymorphic: pops below the frame's height yield an
//! unknown type that matches anything.

use std::collections::{HashMap, HashSet};

use lwrt_foundation::types::MAX_MEMORY_PAGES;

use crate::{
    instructions::{BlockType, Instruction},
    module::{ConstExpr, ImportDesc, Module},
    prelude::*,
};

/// Validate a parsed module.
///
/// # Errors
///
/// `ValidationFailed` describing the first problem found.
pub fn validate_module(module: &Module) -> Result<()> {
    validate_types(module)?;
    validate_imports(module)?;
    validate_tables(module)?;
    validate_memories(module)?;
    validate_globals(module)?;
    validate_exports(module)?;
    validate_start(module)?;
    validate_elements(module)?;
    validate_data(module)?;
    validate_code(module)
}

fn validate_types(module: &Module) -> Result<()> {
    let num_types = module.types.len() as u32;
    for &type_idx in &module.functions {
        if type_idx >= num_types {
            return Err(LoadError::invalid("unknown type"));
        }
    }
    Ok(())
}

fn validate_table_limits(limits: &Limits) -> Result<()> {
    if limits.max.is_some_and(|max| max < limits.min) {
        return Err(LoadError::invalid("size minimum must not be greater than maximum"));
    }
    Ok(())
}

fn validate_memory_limits(limits: &Limits) -> Result<()> {
    if limits.min > MAX_MEMORY_PAGES || limits.max.is_some_and(|max| max > MAX_MEMORY_PAGES) {
        return Err(LoadError::invalid("memory size must be at most 65536 pages (4GiB)"));
    }
    validate_table_limits(limits)
}

fn validate_imports(module: &Module) -> Result<()> {
    let num_types = module.types.len() as u32;
    let mut seen: HashMap<(&str, &str), &ImportDesc> = HashMap::new();

    for import in &module.imports {
        match &import.desc {
            ImportDesc::Func(type_idx) if *type_idx >= num_types => {
                return Err(LoadError::invalid("unknown type"));
            },
            ImportDesc::Table(ty) => validate_table_limits(&ty.limits)?,
            ImportDesc::Memory(ty) => validate_memory_limits(&ty.limits)?,
            _ => {},
        }

        let key = (import.module.as_str(), import.name.as_str());
        if let Some(previous) = seen.insert(key, &import.desc) {
            if !same_import_type(module, previous, &import.desc) {
                return Err(LoadError::invalid("import declared twice with incompatible types"));
            }
        }
    }
    Ok(())
}

/// Two import descriptors are compatible when a single entity could
/// satisfy both.
fn same_import_type(module: &Module, a: &ImportDesc, b: &ImportDesc) -> bool {
    match (a, b) {
        (ImportDesc::Func(x), ImportDesc::Func(y)) => {
            module.types.get(*x as usize) == module.types.get(*y as usize)
        },
        _ => a == b,
    }
}

fn validate_tables(module: &Module) -> Result<()> {
    if module.num_tables() > 1 {
        return Err(LoadError::invalid("multiple tables"));
    }
    module
        .tables
        .iter()
        .try_for_each(|table| validate_table_limits(&table.limits))
}

fn validate_memories(module: &Module) -> Result<()> {
    if module.num_memories() > 1 {
        return Err(LoadError::invalid("multiple memories"));
    }
    module
        .memories
        .iter()
        .try_for_each(|memory| validate_memory_limits(&memory.limits))
}

/// Type of a constant expression. `global.get` may only read imported
/// globals, which are initialised before any of the module's own.
fn const_expr_type(module: &Module, expr: &ConstExpr) -> Result<ValueType> {
    Ok(match expr {
        ConstExpr::I32(_) => ValueType::I32,
        ConstExpr::I64(_) => ValueType::I64,
        ConstExpr::F32(_) => ValueType::F32,
        ConstExpr::F64(_) => ValueType::F64,
        ConstExpr::GlobalGet(idx) => {
            if *idx >= module.num_imported_globals() {
                return Err(LoadError::invalid("unknown global"));
            }
            module
                .global_type(*idx)
                .map(|g| g.value_type)
                .ok_or(LoadError::invalid("unknown global"))?
        },
    })
}

fn expect_const_type(module: &Module, expr: &ConstExpr, expected: ValueType) -> Result<()> {
    if const_expr_type(module, expr)? != expected {
        return Err(LoadError::invalid("type mismatch"));
    }
    Ok(())
}

fn validate_globals(module: &Module) -> Result<()> {
    for global in &module.globals {
        expect_const_type(module, &global.init, global.ty.value_type)?;
    }
    Ok(())
}

fn validate_exports(module: &Module) -> Result<()> {
    let mut names = HashSet::new();
    for export in &module.exports {
        if !names.insert(export.name.as_str()) {
            return Err(LoadError::invalid("duplicate export name"));
        }
        let bound = match export.kind {
            ExternKind::Func => module.num_funcs(),
            ExternKind::Table => module.num_tables(),
            ExternKind::Memory => module.num_memories(),
            ExternKind::Global => module.num_globals(),
        };
        if export.index >= bound {
            return Err(LoadError::invalid(match export.kind {
                ExternKind::Func => "unknown function",
                ExternKind::Table => "unknown table",
                ExternKind::Memory => "unknown memory",
                ExternKind::Global => "unknown global",
            }));
        }
    }
    Ok(())
}

fn validate_start(module: &Module) -> Result<()> {
    let Some(start) = module.start else {
        return Ok(());
    };
    let ty = module.func_type(start).ok_or(LoadError::invalid("unknown function"))?;
    if !ty.params.is_empty() || !ty.results.is_empty() {
        return Err(LoadError::invalid("start function"));
    }
    Ok(())
}

fn validate_elements(module: &Module) -> Result<()> {
    for segment in &module.elements {
        if segment.table >= module.num_tables() {
            return Err(LoadError::invalid("unknown table"));
        }
        expect_const_type(module, &segment.offset, ValueType::I32)?;
        if segment.funcs.iter().any(|f| *f >= module.num_funcs()) {
            return Err(LoadError::invalid("unknown function"));
        }
    }
    Ok(())
}

fn validate_data(module: &Module) -> Result<()> {
    for segment in &module.data {
        if segment.memory >= module.num_memories() {
            return Err(LoadError::invalid("unknown memory"));
        }
        expect_const_type(module, &segment.offset, ValueType::I32)?;
    }
    Ok(())
}

fn validate_code(module: &Module) -> Result<()> {
    let first = module.num_imported_funcs();
    for (i, body) in module.bodies.iter().enumerate() {
        let func_idx = first + i as u32;
        let ty = module
            .func_type(func_idx)
            .ok_or(LoadError::invalid_in(func_idx, "unknown type"))?;
        let mut locals = ty.params.clone();
        locals.extend_from_slice(&body.locals);
        FunctionValidator::new(module, func_idx, locals, ty.results.clone()).run(&body.code)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Block,
    Loop,
    If,
    Else,
}

#[derive(Debug)]
struct ControlFrame {
    kind:        FrameKind,
    params:      Vec<ValueType>,
    results:     Vec<ValueType>,
    height:      usize,
    unreachable: bool,
}

impl ControlFrame {
    /// Types a branch to this frame must carry
    fn label_types(&self) -> &[ValueType] {
        if self.kind == FrameKind::Loop {
            &self.params
        } else {
            &self.results
        }
    }
}

/// `None` is the unknown type produced by a polymorphic stack
type Operand = Option<ValueType>;

struct FunctionValidator<'m> {
    module:  &'m Module,
    func:    u32,
    locals:  Vec<ValueType>,
    results: Vec<ValueType>,
    vals:    Vec<Operand>,
    ctrls:   Vec<ControlFrame>,
}

impl<'m> FunctionValidator<'m> {
    fn new(module: &'m Module, func: u32, locals: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        Self {
            module,
            func,
            locals,
            results,
            vals: Vec::new(),
            ctrls: Vec::new(),
        }
    }

    fn err(&self, reason: &'static str) -> LoadError {
        LoadError::invalid_in(self.func, reason)
    }

    fn push(&mut self, ty: ValueType) {
        self.vals.push(Some(ty));
    }

    fn push_operands(&mut self, types: &[ValueType]) {
        self.vals.extend(types.iter().copied().map(Some));
    }

    fn pop(&mut self) -> Result<Operand> {
        let frame = self.ctrls.last().ok_or(self.err("type mismatch"))?;
        if self.vals.len() == frame.height {
            if frame.unreachable {
                return Ok(None);
            }
            return Err(self.err("type mismatch"));
        }
        self.vals.pop().ok_or(self.err("type mismatch"))
    }

    fn pop_expect(&mut self, expected: ValueType) -> Result<Operand> {
        let actual = self.pop()?;
        match actual {
            Some(ty) if ty != expected => Err(self.err("type mismatch")),
            _ => Ok(Some(expected)),
        }
    }

    fn pop_operands(&mut self, types: &[ValueType]) -> Result<()> {
        for ty in types.iter().rev() {
            self.pop_expect(*ty)?;
        }
        Ok(())
    }

    fn push_ctrl(&mut self, kind: FrameKind, params: Vec<ValueType>, results: Vec<ValueType>) {
        let height = self.vals.len();
        self.push_operands(&params);
        self.ctrls.push(ControlFrame {
            kind,
            params,
            results,
            height,
            unreachable: false,
        });
    }

    fn pop_ctrl(&mut self) -> Result<ControlFrame> {
        let results = self.ctrls.last().ok_or(self.err("type mismatch"))?.results.clone();
        self.pop_operands(&results)?;
        let frame = self.ctrls.pop().ok_or(self.err("type mismatch"))?;
        if self.vals.len() != frame.height {
            return Err(self.err("type mismatch"));
        }
        Ok(frame)
    }

    fn set_unreachable(&mut self) -> Result<()> {
        let err = self.err("type mismatch");
        let frame = self.ctrls.last_mut().ok_or(err)?;
        self.vals.truncate(frame.height);
        frame.unreachable = true;
        Ok(())
    }

    fn label(&self, depth: u32) -> Result<Vec<ValueType>> {
        let idx = self
            .ctrls
            .len()
            .checked_sub(1 + depth as usize)
            .ok_or(self.err("unknown label"))?;
        Ok(self.ctrls[idx].label_types().to_vec())
    }

    fn block_signature(&self, ty: BlockType) -> Result<(Vec<ValueType>, Vec<ValueType>)> {
        match ty {
            BlockType::Empty => Ok((Vec::new(), Vec::new())),
            BlockType::Value(v) => Ok((Vec::new(), vec![v])),
            BlockType::Func(idx) => self
                .module
                .types
                .get(idx as usize)
                .map(|t| (t.params.clone(), t.results.clone()))
                .ok_or(self.err("unknown type")),
        }
    }

    fn local(&self, idx: u32) -> Result<ValueType> {
        self.locals.get(idx as usize).copied().ok_or(self.err("unknown local"))
    }

    fn global(&self, idx: u32) -> Result<GlobalType> {
        self.module.global_type(idx).ok_or(self.err("unknown global"))
    }

    fn require_memory(&self) -> Result<()> {
        if self.module.num_memories() == 0 {
            return Err(self.err("unknown memory 0"));
        }
        Ok(())
    }

    fn unary(&mut self, operand: ValueType, result: ValueType) -> Result<()> {
        self.pop_expect(operand)?;
        self.push(result);
        Ok(())
    }

    fn binary(&mut self, operand: ValueType, result: ValueType) -> Result<()> {
        self.pop_expect(operand)?;
        self.pop_expect(operand)?;
        self.push(result);
        Ok(())
    }

    fn run(mut self, code: &[Instruction]) -> Result<()> {
        self.push_ctrl(FrameKind::Block, Vec::new(), self.results.clone());
        for instr in code {
            if self.ctrls.is_empty() {
                return Err(self.err("operators remaining after end of function"));
            }
            self.step(instr)?;
        }
        if !self.ctrls.is_empty() {
            return Err(self.err("unexpected end of function"));
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, instr: &Instruction) -> Result<()> {
        use ValueType::{F32, F64, I32, I64};

        match instr {
            Instruction::Unreachable => self.set_unreachable()?,
            Instruction::Nop => {},
            Instruction::Block { ty, .. } | Instruction::Loop { ty } => {
                let (params, results) = self.block_signature(*ty)?;
                self.pop_operands(&params)?;
                let kind = if matches!(instr, Instruction::Loop { .. }) {
                    FrameKind::Loop
                } else {
                    FrameKind::Block
                };
                self.push_ctrl(kind, params, results);
            },
            Instruction::If { ty, .. } => {
                let (params, results) = self.block_signature(*ty)?;
                self.pop_expect(I32)?;
                self.pop_operands(&params)?;
                self.push_ctrl(FrameKind::If, params, results);
            },
            Instruction::Else { .. } => {
                let frame = self.pop_ctrl()?;
                if frame.kind != FrameKind::If {
                    return Err(self.err("else without matching if"));
                }
                self.push_ctrl(FrameKind::Else, frame.params, frame.results);
            },
            Instruction::End => {
                let frame = self.pop_ctrl()?;
                if frame.kind == FrameKind::If && frame.params != frame.results {
                    return Err(self.err("type mismatch"));
                }
                self.push_operands(&frame.results);
            },
            Instruction::Br(depth) => {
                let types = self.label(*depth)?;
                self.pop_operands(&types)?;
                self.set_unreachable()?;
            },
            Instruction::BrIf(depth) => {
                let types = self.label(*depth)?;
                self.pop_expect(I32)?;
                self.pop_operands(&types)?;
                self.push_operands(&types);
            },
            Instruction::BrTable { targets, default } => {
                self.pop_expect(I32)?;
                let default_types = self.label(*default)?;
                let arity = default_types.len();
                for target in targets.iter() {
                    let types = self.label(*target)?;
                    if types.len() != arity {
                        return Err(self.err("type mismatch"));
                    }
                    // Check the operands against each label without consuming them
                    let saved = self.vals.clone();
                    self.pop_operands(&types)?;
                    self.vals = saved;
                }
                self.pop_operands(&default_types)?;
                self.set_unreachable()?;
            },
            Instruction::Return => {
                let results = self.results.clone();
                self.pop_operands(&results)?;
                self.set_unreachable()?;
            },
            Instruction::Call(func) => {
                let ty = self
                    .module
                    .func_type(*func)
                    .ok_or(self.err("unknown function"))?
                    .clone();
                self.pop_operands(&ty.params)?;
                self.push_operands(&ty.results);
            },
            Instruction::CallIndirect { type_idx, table } => {
                if *table >= self.module.num_tables() {
                    return Err(self.err("unknown table"));
                }
                let ty = self
                    .module
                    .types
                    .get(*type_idx as usize)
                    .ok_or(self.err("unknown type"))?
                    .clone();
                self.pop_expect(I32)?;
                self.pop_operands(&ty.params)?;
                self.push_operands(&ty.results);
            },
            Instruction::Drop => {
                self.pop()?;
            },
            Instruction::Select(None) => {
                self.pop_expect(I32)?;
                let first = self.pop()?;
                let second = self.pop()?;
                let ty = match (first, second) {
                    (Some(a), Some(b)) if a != b => return Err(self.err("type mismatch")),
                    (Some(a), _) | (None, Some(a)) => Some(a),
                    (None, None) => None,
                };
                self.vals.push(ty);
            },
            Instruction::Select(Some(ty)) => {
                self.pop_expect(I32)?;
                self.pop_expect(*ty)?;
                self.pop_expect(*ty)?;
                self.push(*ty);
            },
            Instruction::LocalGet(idx) => {
                let ty = self.local(*idx)?;
                self.push(ty);
            },
            Instruction::LocalSet(idx) => {
                let ty = self.local(*idx)?;
                self.pop_expect(ty)?;
            },
            Instruction::LocalTee(idx) => {
                let ty = self.local(*idx)?;
                self.unary(ty, ty)?;
            },
            Instruction::GlobalGet(idx) => {
                let ty = self.global(*idx)?;
                self.push(ty.value_type);
            },
            Instruction::GlobalSet(idx) => {
                let ty = self.global(*idx)?;
                if !ty.mutable {
                    return Err(self.err("global is immutable"));
                }
                self.pop_expect(ty.value_type)?;
            },
            Instruction::Load { op, .. } => {
                self.require_memory()?;
                self.unary(I32, op.result_type())?;
            },
            Instruction::Store { op, .. } => {
                self.require_memory()?;
                self.pop_expect(op.value_type())?;
                self.pop_expect(I32)?;
            },
            Instruction::MemorySize => {
                self.require_memory()?;
                self.push(I32);
            },
            Instruction::MemoryGrow => {
                self.require_memory()?;
                self.unary(I32, I32)?;
            },
            Instruction::MemoryCopy | Instruction::MemoryFill => {
                self.require_memory()?;
                self.pop_operands(&[I32, I32, I32])?;
            },
            Instruction::I32Const(_) => self.push(I32),
            Instruction::I64Const(_) => self.push(I64),
            Instruction::F32Const(_) => self.push(F32),
            Instruction::F64Const(_) => self.push(F64),
            Instruction::I32Eqz => self.unary(I32, I32)?,
            Instruction::I64Eqz => self.unary(I64, I32)?,
            Instruction::I32Compare(_) => self.binary(I32, I32)?,
            Instruction::I64Compare(_) => self.binary(I64, I32)?,
            Instruction::F32Compare(_) => self.binary(F32, I32)?,
            Instruction::F64Compare(_) => self.binary(F64, I32)?,
            Instruction::I32Unary(_) => self.unary(I32, I32)?,
            Instruction::I64Unary(_) => self.unary(I64, I64)?,
            Instruction::F32Unary(_) => self.unary(F32, F32)?,
            Instruction::F64Unary(_) => self.unary(F64, F64)?,
            Instruction::I32Binary(_) => self.binary(I32, I32)?,
            Instruction::I64Binary(_) => self.binary(I64, I64)?,
            Instruction::F32Binary(_) => self.binary(F32, F32)?,
            Instruction::F64Binary(_) => self.binary(F64, F64)?,
            Instruction::Convert(op) => {
                let (from, to) = op.signature();
                self.unary(from, to)?;
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Export, FunctionBody};

    fn single_function(params: &[ValueType], results: &[ValueType], code: Vec<Instruction>) -> Module {
        Module {
            types: vec![FuncType::new(params.iter().copied(), results.iter().copied())],
            functions: vec![0],
            bodies: vec![FunctionBody {
                locals: Vec::new(),
                code,
            }],
            ..Module::default()
        }
    }

    #[test]
    fn test_add_validates() -> Result<()> {
        let module = single_function(
            &[ValueType::I32, ValueType::I32],
            &[ValueType::I32],
            vec![
                Instruction::LocalGet(0),
                Instruction::LocalGet(1),
                Instruction::I32Binary(crate::instructions::IntBinOp::Add),
                Instruction::End,
            ],
        );
        validate_module(&module)
    }

    #[test]
    fn test_result_type_mismatch() {
        let module = single_function(
            &[],
            &[ValueType::I32],
            vec![Instruction::I64Const(1), Instruction::End],
        );
        assert_eq!(
            validate_module(&module),
            Err(LoadError::invalid_in(0, "type mismatch"))
        );
    }

    #[test]
    fn test_branch_to_missing_label() {
        let module = single_function(&[], &[], vec![Instruction::Br(1), Instruction::End]);
        assert_eq!(
            validate_module(&module),
            Err(LoadError::invalid_in(0, "unknown label"))
        );
    }

    #[test]
    fn test_unreachable_makes_stack_polymorphic() -> Result<()> {
        let module = single_function(
            &[],
            &[ValueType::F64],
            vec![
                Instruction::Unreachable,
                Instruction::I32Binary(crate::instructions::IntBinOp::Add),
                Instruction::Drop,
                Instruction::End,
            ],
        );
        validate_module(&module)
    }

    #[test]
    fn test_duplicate_export_names() {
        let mut module = single_function(&[], &[], vec![Instruction::End]);
        for _ in 0..2 {
            module.exports.push(Export {
                name:  "f".into(),
                kind:  ExternKind::Func,
                index: 0,
            });
        }
        assert_eq!(
            validate_module(&module),
            Err(LoadError::invalid("duplicate export name"))
        );
    }

    #[test]
    fn test_immutable_global_set() {
        let mut module = single_function(
            &[],
            &[],
            vec![Instruction::I32Const(1), Instruction::GlobalSet(0), Instruction::End],
        );
        module.globals.push(crate::module::Global {
            ty:   GlobalType {
                value_type: ValueType::I32,
                mutable:    false,
            },
            init: ConstExpr::I32(0),
        });
        assert_eq!(
            validate_module(&module),
            Err(LoadError::invalid_in(0, "global is immutable"))
        );
    }
}
