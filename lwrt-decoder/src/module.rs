// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly module representation
//!
//! A [`Module`] is produced once by the loader and never mutated. Index
//! spaces follow the binary format: imported entities come first, followed
//! by the module's own definitions.

use crate::{instructions::Instruction, prelude::*};

/// What an import expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDesc {
    /// A function with the given type index
    Func(u32),
    /// A table
    Table(TableType),
    /// A linear memory
    Memory(MemoryType),
    /// A global
    Global(GlobalType),
}

impl ImportDesc {
    /// Kind of entity this import expects
    #[must_use]
    pub fn kind(&self) -> ExternKind {
        match self {
            ImportDesc::Func(_) => ExternKind::Func,
            ImportDesc::Table(_) => ExternKind::Table,
            ImportDesc::Memory(_) => ExternKind::Memory,
            ImportDesc::Global(_) => ExternKind::Global,
        }
    }
}

/// An import declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Namespace, e.g. `env` or `wasi_snapshot_preview1`
    pub module: String,
    /// Field name within the namespace
    pub name:   String,
    /// Expected entity
    pub desc:   ImportDesc,
}

/// An export declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Export name, unique within the module
    pub name:  String,
    /// Kind of the exported entity
    pub kind:  ExternKind,
    /// Index in the index space of `kind`
    pub index: u32,
}

/// A constant initializer expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstExpr {
    /// `i32.const`
    I32(i32),
    /// `i64.const`
    I64(i64),
    /// `f32.const`
    F32(FloatBits32),
    /// `f64.const`
    F64(FloatBits64),
    /// `global.get` of an imported global
    GlobalGet(u32),
}

/// A global defined by the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    /// Type of the global
    pub ty:   GlobalType,
    /// Initial value
    pub init: ConstExpr,
}

/// An active element segment targeting a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSegment {
    /// Target table index
    pub table:  u32,
    /// Offset into the table
    pub offset: ConstExpr,
    /// Function indices to write
    pub funcs:  Vec<u32>,
}

/// An active data segment targeting a memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    /// Target memory index
    pub memory: u32,
    /// Offset into the memory
    pub offset: ConstExpr,
    /// Bytes to copy
    pub bytes:  Vec<u8>,
}

/// A decoded function body
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    /// Declared locals, expanded (parameters not included)
    pub locals: Vec<ValueType>,
    /// Instructions, ending with the function's final `end`
    pub code:   Vec<Instruction>,
}

/// Module struct representing a parsed and validated WebAssembly module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    /// Function signatures from the type section
    pub types:      Vec<FuncType>,
    /// Imports in declaration order
    pub imports:    Vec<Import>,
    /// Type index of every function defined by the module
    pub functions:  Vec<u32>,
    /// Bodies of the functions defined by the module
    pub bodies:     Vec<FunctionBody>,
    /// Tables defined by the module
    pub tables:     Vec<TableType>,
    /// Memories defined by the module
    pub memories:   Vec<MemoryType>,
    /// Globals defined by the module
    pub globals:    Vec<Global>,
    /// Exports in declaration order
    pub exports:    Vec<Export>,
    /// Start function index
    pub start:      Option<u32>,
    /// Active element segments
    pub elements:   Vec<ElementSegment>,
    /// Active data segments
    pub data:       Vec<DataSegment>,
    /// Declared data segment count, if the data count section is present
    pub data_count: Option<u32>,
}

impl Module {
    /// Number of imported functions
    #[must_use]
    pub fn num_imported_funcs(&self) -> u32 {
        self.count_imports(ExternKind::Func)
    }

    /// Number of imported globals
    #[must_use]
    pub fn num_imported_globals(&self) -> u32 {
        self.count_imports(ExternKind::Global)
    }

    fn count_imports(&self, kind: ExternKind) -> u32 {
        self.imports.iter().filter(|i| i.desc.kind() == kind).count() as u32
    }

    /// Total size of the function index space
    #[must_use]
    pub fn num_funcs(&self) -> u32 {
        self.num_imported_funcs() + self.functions.len() as u32
    }

    /// Type of function `func_idx` in the function index space
    #[must_use]
    pub fn func_type(&self, func_idx: u32) -> Option<&FuncType> {
        let type_idx = self.func_type_idx(func_idx)?;
        self.types.get(type_idx as usize)
    }

    /// Type index of function `func_idx` in the function index space
    #[must_use]
    pub fn func_type_idx(&self, func_idx: u32) -> Option<u32> {
        let mut imported = self.imports.iter().filter_map(|i| match i.desc {
            ImportDesc::Func(ty) => Some(ty),
            _ => None,
        });
        let num_imported = self.num_imported_funcs();
        if func_idx < num_imported {
            imported.nth(func_idx as usize)
        } else {
            self.functions.get((func_idx - num_imported) as usize).copied()
        }
    }

    /// Type of global `global_idx` in the global index space
    #[must_use]
    pub fn global_type(&self, global_idx: u32) -> Option<GlobalType> {
        let mut imported = self.imports.iter().filter_map(|i| match i.desc {
            ImportDesc::Global(ty) => Some(ty),
            _ => None,
        });
        let num_imported = self.num_imported_globals();
        if global_idx < num_imported {
            imported.nth(global_idx as usize)
        } else {
            self.globals.get((global_idx - num_imported) as usize).map(|g| g.ty)
        }
    }

    /// Total size of the global index space
    #[must_use]
    pub fn num_globals(&self) -> u32 {
        self.num_imported_globals() + self.globals.len() as u32
    }

    /// Type of memory 0, whether imported or defined
    #[must_use]
    pub fn memory_type(&self) -> Option<MemoryType> {
        self.imports
            .iter()
            .find_map(|i| match i.desc {
                ImportDesc::Memory(ty) => Some(ty),
                _ => None,
            })
            .or_else(|| self.memories.first().copied())
    }

    /// Number of memories, imported and defined
    #[must_use]
    pub fn num_memories(&self) -> u32 {
        self.count_imports(ExternKind::Memory) + self.memories.len() as u32
    }

    /// Type of table 0, whether imported or defined
    #[must_use]
    pub fn table_type(&self) -> Option<TableType> {
        self.imports
            .iter()
            .find_map(|i| match i.desc {
                ImportDesc::Table(ty) => Some(ty),
                _ => None,
            })
            .or_else(|| self.tables.first().copied())
    }

    /// Number of tables, imported and defined
    #[must_use]
    pub fn num_tables(&self) -> u32 {
        self.count_imports(ExternKind::Table) + self.tables.len() as u32
    }

    /// Look up an export by name
    #[must_use]
    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Module {
        Module {
            types: vec![
                FuncType::new([ValueType::I32], []),
                FuncType::new([], [ValueType::I64]),
            ],
            imports: vec![
                Import {
                    module: "env".into(),
                    name:   "log".into(),
                    desc:   ImportDesc::Func(0),
                },
                Import {
                    module: "env".into(),
                    name:   "base".into(),
                    desc:   ImportDesc::Global(GlobalType {
                        value_type: ValueType::I32,
                        mutable:    false,
                    }),
                },
            ],
            functions: vec![1],
            globals: vec![Global {
                ty:   GlobalType {
                    value_type: ValueType::F64,
                    mutable:    true,
                },
                init: ConstExpr::F64(FloatBits64(0)),
            }],
            ..Module::default()
        }
    }

    #[test]
    fn test_function_index_space_puts_imports_first() {
        let module = sample();
        assert_eq!(module.num_funcs(), 2);
        assert_eq!(module.func_type_idx(0), Some(0));
        assert_eq!(module.func_type_idx(1), Some(1));
        assert_eq!(module.func_type(2), None);
    }

    #[test]
    fn test_global_index_space_puts_imports_first() {
        let module = sample();
        assert_eq!(module.num_globals(), 2);
        assert_eq!(module.global_type(0).map(|g| g.value_type), Some(ValueType::I32));
        assert_eq!(module.global_type(1).map(|g| g.mutable), Some(true));
        assert_eq!(module.global_type(2), None);
    }
}
