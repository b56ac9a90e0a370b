// LWRT - lwrt-foundation
// Module: Core WebAssembly Types
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Core WebAssembly type definitions.
//!
//! Value types, function signatures and the descriptors for memories,
//! tables and globals, together with the subtyping rules the linker uses to
//! decide whether an export satisfies an import.

use core::fmt;

use lwrt_error::{codes, Error, ErrorCategory, Result};

/// Size of a WebAssembly page in bytes
pub const WASM_PAGE_SIZE: usize = 65_536;

/// Maximum number of pages a 32-bit memory can address
pub const MAX_MEMORY_PAGES: u32 = 65_536;

/// Number type of a WebAssembly value
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    /// 32-bit integer
    #[default]
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ValueType {
    /// Create a value type from its binary encoding.
    ///
    /// # Errors
    ///
    /// Returns a parse error for any byte that is not a number type.
    pub fn from_binary(byte: u8) -> Result<Self> {
        match byte {
            0x7F => Ok(ValueType::I32),
            0x7E => Ok(ValueType::I64),
            0x7D => Ok(ValueType::F32),
            0x7C => Ok(ValueType::F64),
            _ => Err(Error::new(
                ErrorCategory::Parse,
                codes::MALFORMED_ENCODING,
                "Invalid value type",
            )),
        }
    }

    /// Binary encoding of this value type
    #[must_use]
    pub const fn to_binary(self) -> u8 {
        match self {
            ValueType::I32 => 0x7F,
            ValueType::I64 => 0x7E,
            ValueType::F32 => 0x7D,
            ValueType::F64 => 0x7C,
        }
    }

    /// Size of the value in bytes
    #[must_use]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            ValueType::I32 | ValueType::F32 => 4,
            ValueType::I64 | ValueType::F64 => 8,
        }
    }
}

/// Reference type of table elements. Only `funcref` is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefType {
    /// Function reference
    #[default]
    FuncRef,
}

impl RefType {
    /// Create a reference type from its binary encoding.
    ///
    /// # Errors
    ///
    /// Returns a parse error for anything but `0x70`.
    pub fn from_binary(byte: u8) -> Result<Self> {
        match byte {
            0x70 => Ok(RefType::FuncRef),
            _ => Err(Error::new(
                ErrorCategory::Parse,
                codes::MALFORMED_ENCODING,
                "Invalid reference type",
            )),
        }
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    /// Parameter types, in order
    pub params:  Vec<ValueType>,
    /// Result types, in order
    pub results: Vec<ValueType>,
}

impl FuncType {
    /// Create a new function type.
    pub fn new(
        params: impl IntoIterator<Item = ValueType>,
        results: impl IntoIterator<Item = ValueType>,
    ) -> Self {
        Self {
            params:  params.into_iter().collect(),
            results: results.into_iter().collect(),
        }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.params, self.results)
    }
}

/// Represents the size limits of a table or memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Limits {
    /// Initial size
    pub min: u32,
    /// Optional maximum size
    pub max: Option<u32>,
}

impl Limits {
    /// Create new limits
    #[must_use]
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Whether an entity with limits `self` may satisfy an import declaring
    /// `import`: at least as large, and no less constrained.
    #[must_use]
    pub fn is_subtype_of(&self, import: &Limits) -> bool {
        if self.min < import.min {
            return false;
        }
        match (self.max, import.max) {
            (_, None) => true,
            (Some(actual), Some(required)) => actual <= required,
            (None, Some(_)) => false,
        }
    }
}

/// Linear memory descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryType {
    /// Size limits in pages
    pub limits: Limits,
}

impl MemoryType {
    /// Create a memory type with the given page limits
    #[must_use]
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self {
            limits: Limits::new(min, max),
        }
    }
}

/// Table descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TableType {
    /// Element type
    pub element: RefType,
    /// Size limits in elements
    pub limits:  Limits,
}

/// Global descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GlobalType {
    /// Type of the stored value
    pub value_type: ValueType,
    /// Whether `global.set` is permitted
    pub mutable:    bool,
}

/// Kind of an import or export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternKind {
    /// Function
    Func,
    /// Table
    Table,
    /// Linear memory
    Memory,
    /// Global
    Global,
}

impl ExternKind {
    /// Create an extern kind from its binary encoding.
    ///
    /// # Errors
    ///
    /// Returns a parse error for unknown kind bytes.
    pub fn from_binary(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(ExternKind::Func),
            0x01 => Ok(ExternKind::Table),
            0x02 => Ok(ExternKind::Memory),
            0x03 => Ok(ExternKind::Global),
            _ => Err(Error::new(
                ErrorCategory::Parse,
                codes::MALFORMED_ENCODING,
                "Invalid external kind",
            )),
        }
    }
}

impl fmt::Display for ExternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExternKind::Func => "func",
            ExternKind::Table => "table",
            ExternKind::Memory => "memory",
            ExternKind::Global => "global",
        })
    }
}
