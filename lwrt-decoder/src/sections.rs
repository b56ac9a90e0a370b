// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Section payload decoders.
//!
//! Each function consumes exactly one section's payload from a reader that
//! is bounded to that section, so reading past the declared size surfaces
//! as `MalformedEncoding` rather than silently spilling into the next
//! section.

use lwrt_format::FUNC_TYPE_FORM;

use crate::{
    instructions::decode_body,
    module::{ConstExpr, DataSegment, ElementSegment, Export, FunctionBody, Global, Import, ImportDesc},
    prelude::*,
    reader::BinaryReader,
};

/// Upper bound on declared locals per function
const MAX_LOCALS: u64 = 50_000;

/// Decode the type section.
///
/// # Errors
///
/// `MalformedEncoding` for anything but `0x60` function types.
pub fn parse_type_section(reader: &mut BinaryReader<'_>) -> Result<Vec<FuncType>> {
    reader.vec(|r| {
        let pos = r.pos();
        if r.u8()? != FUNC_TYPE_FORM {
            return Err(LoadError::malformed(pos, "malformed function type"));
        }
        let params = r.vec(BinaryReader::value_type)?;
        let results = r.vec(BinaryReader::value_type)?;
        Ok(FuncType { params, results })
    })
}

fn parse_limits(reader: &mut BinaryReader<'_>) -> Result<Limits> {
    let pos = reader.pos();
    match reader.u8()? {
        0x00 => Ok(Limits::new(reader.u32()?, None)),
        0x01 => {
            let min = reader.u32()?;
            let max = reader.u32()?;
            Ok(Limits::new(min, Some(max)))
        },
        _ => Err(LoadError::malformed(pos, "malformed limits flags")),
    }
}

fn parse_table_type(reader: &mut BinaryReader<'_>) -> Result<TableType> {
    let pos = reader.pos();
    let element = RefType::from_binary(reader.u8()?)
        .map_err(|e| LoadError::malformed(pos, e.message))?;
    let limits = parse_limits(reader)?;
    Ok(TableType { element, limits })
}

fn parse_memory_type(reader: &mut BinaryReader<'_>) -> Result<MemoryType> {
    Ok(MemoryType {
        limits: parse_limits(reader)?,
    })
}

fn parse_global_type(reader: &mut BinaryReader<'_>) -> Result<GlobalType> {
    let value_type = reader.value_type()?;
    let pos = reader.pos();
    let mutable = match reader.u8()? {
        0x00 => false,
        0x01 => true,
        _ => return Err(LoadError::malformed(pos, "malformed mutability")),
    };
    Ok(GlobalType {
        value_type,
        mutable,
    })
}

/// Decode the import section.
///
/// # Errors
///
/// `MalformedEncoding` for truncation or unknown import kinds.
pub fn parse_import_section(reader: &mut BinaryReader<'_>) -> Result<Vec<Import>> {
    reader.vec(|r| {
        let module = r.name()?;
        let name = r.name()?;
        let pos = r.pos();
        let kind = ExternKind::from_binary(r.u8()?)
            .map_err(|_| LoadError::malformed(pos, "malformed import kind"))?;
        let desc = match kind {
            ExternKind::Func => ImportDesc::Func(r.u32()?),
            ExternKind::Table => ImportDesc::Table(parse_table_type(r)?),
            ExternKind::Memory => ImportDesc::Memory(parse_memory_type(r)?),
            ExternKind::Global => ImportDesc::Global(parse_global_type(r)?),
        };
        Ok(Import { module, name, desc })
    })
}

/// Decode the function section (type index per defined function).
///
/// # Errors
///
/// `MalformedEncoding` for truncation.
pub fn parse_function_section(reader: &mut BinaryReader<'_>) -> Result<Vec<u32>> {
    reader.vec(BinaryReader::u32)
}

/// Decode the table section.
///
/// # Errors
///
/// `MalformedEncoding` for truncation or non-funcref tables.
pub fn parse_table_section(reader: &mut BinaryReader<'_>) -> Result<Vec<TableType>> {
    reader.vec(parse_table_type)
}

/// Decode the memory section.
///
/// # Errors
///
/// `MalformedEncoding` for truncation or bad limit flags.
pub fn parse_memory_section(reader: &mut BinaryReader<'_>) -> Result<Vec<MemoryType>> {
    reader.vec(parse_memory_type)
}

/// Decode a constant expression terminated by `end`.
///
/// # Errors
///
/// `MalformedEncoding` for truncation, `ValidationFailed` for instructions
/// that are not constant.
pub fn parse_const_expr(reader: &mut BinaryReader<'_>) -> Result<ConstExpr> {
    use lwrt_format::opcodes as op;

    let expr = match reader.u8()? {
        op::I32_CONST => ConstExpr::I32(reader.i32()?),
        op::I64_CONST => ConstExpr::I64(reader.i64()?),
        op::F32_CONST => ConstExpr::F32(FloatBits32(reader.read(lwrt_format::read_f32_bits)?)),
        op::F64_CONST => ConstExpr::F64(FloatBits64(reader.read(lwrt_format::read_f64_bits)?)),
        op::GLOBAL_GET => ConstExpr::GlobalGet(reader.u32()?),
        _ => return Err(LoadError::invalid("constant expression required")),
    };
    if reader.u8()? != op::END {
        return Err(LoadError::invalid("constant expression required"));
    }
    Ok(expr)
}

/// Decode the global section.
///
/// # Errors
///
/// As [`parse_const_expr`].
pub fn parse_global_section(reader: &mut BinaryReader<'_>) -> Result<Vec<Global>> {
    reader.vec(|r| {
        let ty = parse_global_type(r)?;
        let init = parse_const_expr(r)?;
        Ok(Global { ty, init })
    })
}

/// Decode the export section.
///
/// # Errors
///
/// `MalformedEncoding` for truncation or unknown export kinds.
pub fn parse_export_section(reader: &mut BinaryReader<'_>) -> Result<Vec<Export>> {
    reader.vec(|r| {
        let name = r.name()?;
        let pos = r.pos();
        let kind = ExternKind::from_binary(r.u8()?)
            .map_err(|_| LoadError::malformed(pos, "malformed export kind"))?;
        let index = r.u32()?;
        Ok(Export { name, kind, index })
    })
}

/// Decode the element section. Only the active, table 0, function index
/// form (flag 0) is supported.
///
/// # Errors
///
/// `MalformedEncoding` for truncation or unsupported segment forms.
pub fn parse_element_section(reader: &mut BinaryReader<'_>) -> Result<Vec<ElementSegment>> {
    reader.vec(|r| {
        let pos = r.pos();
        let flags = r.u32()?;
        if flags != 0 {
            return Err(LoadError::malformed(pos, "unsupported element segment form"));
        }
        let offset = parse_const_expr(r)?;
        let funcs = r.vec(BinaryReader::u32)?;
        Ok(ElementSegment {
            table: 0,
            offset,
            funcs,
        })
    })
}

/// Decode the code section. `first_func` is the function index of the first
/// body (the number of imported functions).
///
/// # Errors
///
/// `MalformedEncoding` for truncation, size mismatches and bad locals;
/// errors from [`decode_body`].
pub fn parse_code_section(
    reader: &mut BinaryReader<'_>,
    first_func: u32,
) -> Result<Vec<FunctionBody>> {
    let mut func = first_func;
    reader.vec(|r| {
        let size = r.u32()? as usize;
        let mut body = r.sub_reader(size)?;

        let groups = body.vec(|b| {
            let count = b.u32()?;
            let ty = b.value_type()?;
            Ok((count, ty))
        })?;
        let total: u64 = groups.iter().map(|(count, _)| u64::from(*count)).sum();
        if total > MAX_LOCALS {
            return Err(LoadError::malformed(body.pos(), "too many locals"));
        }
        let locals = groups
            .into_iter()
            .flat_map(|(count, ty)| core::iter::repeat_n(ty, count as usize))
            .collect();

        let code = decode_body(&mut body, func)?;
        func += 1;
        Ok(FunctionBody { locals, code })
    })
}

/// Decode the data section. Only the active, memory 0 form (flag 0) is
/// supported.
///
/// # Errors
///
/// `MalformedEncoding` for truncation or unsupported segment forms.
pub fn parse_data_section(reader: &mut BinaryReader<'_>) -> Result<Vec<DataSegment>> {
    reader.vec(|r| {
        let pos = r.pos();
        let flags = r.u32()?;
        if flags != 0 {
            return Err(LoadError::malformed(pos, "unsupported data segment form"));
        }
        let offset = parse_const_expr(r)?;
        let len = r.u32()? as usize;
        let bytes = r.bytes(len)?.to_vec();
        Ok(DataSegment {
            memory: 0,
            offset,
            bytes,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_section_requires_func_form() {
        let mut reader = BinaryReader::new(&[0x01, 0x5F, 0x00, 0x00], 0);
        assert!(matches!(
            parse_type_section(&mut reader),
            Err(LoadError::MalformedEncoding { offset: 1, .. })
        ));
    }

    #[test]
    fn test_code_section_expands_locals() -> Result<()> {
        // one body: size 6, two local groups (2 x i32, 1 x f64), end
        let bytes = [0x01, 0x06, 0x02, 0x02, 0x7F, 0x01, 0x7C, 0x0B];
        let bodies = parse_code_section(&mut BinaryReader::new(&bytes, 0), 0)?;
        assert_eq!(bodies[0].locals, vec![ValueType::I32, ValueType::I32, ValueType::F64]);
        Ok(())
    }

    #[test]
    fn test_excessive_locals_are_rejected() {
        let bytes = [0x01, 0x08, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x7F, 0x0B];
        assert!(matches!(
            parse_code_section(&mut BinaryReader::new(&bytes, 0), 0),
            Err(LoadError::MalformedEncoding {
                reason: "too many locals",
                ..
            })
        ));
    }

    #[test]
    fn test_const_expr_rejects_non_constant() {
        let mut reader = BinaryReader::new(&[0x6A, 0x0B], 0);
        assert!(matches!(
            parse_const_expr(&mut reader),
            Err(LoadError::ValidationFailed { .. })
        ));
    }
}
