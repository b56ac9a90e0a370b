// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Module parser: header, section sequence and cross-section counts.
//!
//! Produces an unvalidated [`Module`]. Only encoding-level problems are
//! reported here (as `MalformedEncoding`); semantic checks live in
//! [`crate::validation`].

use lwrt_format::binary::{self, section_order, HEADER_LEN, WASM_MAGIC, WASM_VERSION};
use lwrt_foundation::tracing::ModuleTrace;

use crate::{module::Module, prelude::*, reader::BinaryReader, sections};

/// Parse a binary module image into a [`Module`] without validating it.
///
/// # Errors
///
/// `MalformedEncoding` for a bad header, truncated or oversized sections,
/// out-of-order or duplicate sections, unknown section ids, and function or
/// data counts that disagree between sections.
pub fn parse_module(bytes: &[u8]) -> Result<Module> {
    if bytes.len() < HEADER_LEN {
        return Err(LoadError::malformed(bytes.len(), "unexpected end"));
    }
    if bytes[..4] != WASM_MAGIC {
        return Err(LoadError::malformed(0, "magic header not detected"));
    }
    if bytes[4..HEADER_LEN] != WASM_VERSION {
        return Err(LoadError::malformed(4, "unknown binary version"));
    }

    let mut module = Module::default();
    let mut reader = BinaryReader::new(bytes, HEADER_LEN);
    let mut last_order = 0u8;
    let mut function_section_seen = false;

    while !reader.is_at_end() {
        let section_start = reader.pos();
        let id = reader.u8()?;
        let size = reader.u32()?;
        let mut payload = reader.sub_reader(size as usize)?;

        let span = ModuleTrace::section(id, size);
        let _guard = span.enter();

        if id != binary::CUSTOM_SECTION_ID {
            let order = section_order(id)
                .ok_or(LoadError::malformed(section_start, "malformed section id"))?;
            if order <= last_order {
                return Err(LoadError::malformed(section_start, "unexpected content after last section"));
            }
            last_order = order;
        }

        match id {
            binary::CUSTOM_SECTION_ID => {
                let name = payload.name()?;
                debug!(name = %name, "skipping custom section");
                payload.bytes(payload.remaining())?;
            },
            binary::TYPE_SECTION_ID => module.types = sections::parse_type_section(&mut payload)?,
            binary::IMPORT_SECTION_ID => {
                module.imports = sections::parse_import_section(&mut payload)?;
            },
            binary::FUNCTION_SECTION_ID => {
                module.functions = sections::parse_function_section(&mut payload)?;
                function_section_seen = true;
            },
            binary::TABLE_SECTION_ID => module.tables = sections::parse_table_section(&mut payload)?,
            binary::MEMORY_SECTION_ID => {
                module.memories = sections::parse_memory_section(&mut payload)?;
            },
            binary::GLOBAL_SECTION_ID => {
                module.globals = sections::parse_global_section(&mut payload)?;
            },
            binary::EXPORT_SECTION_ID => {
                module.exports = sections::parse_export_section(&mut payload)?;
            },
            binary::START_SECTION_ID => module.start = Some(payload.u32()?),
            binary::ELEMENT_SECTION_ID => {
                module.elements = sections::parse_element_section(&mut payload)?;
            },
            binary::DATA_COUNT_SECTION_ID => module.data_count = Some(payload.u32()?),
            binary::CODE_SECTION_ID => {
                let count_pos = payload.pos();
                let count = payload.clone().u32()?;
                if count as usize != module.functions.len() {
                    return Err(LoadError::malformed(
                        count_pos,
                        "function and code section have inconsistent lengths",
                    ));
                }
                let first = module.num_imported_funcs();
                module.bodies = sections::parse_code_section(&mut payload, first)?;
            },
            binary::DATA_SECTION_ID => {
                let count_pos = payload.pos();
                let count = payload.clone().u32()?;
                if module.data_count.is_some_and(|declared| declared != count) {
                    return Err(LoadError::malformed(
                        count_pos,
                        "data count and data section have inconsistent lengths",
                    ));
                }
                module.data = sections::parse_data_section(&mut payload)?;
            },
            _ => return Err(LoadError::malformed(section_start, "malformed section id")),
        }
        payload.expect_end("section size mismatch")?;
        trace!(id, size, "section decoded");
    }

    if function_section_seen && module.bodies.len() != module.functions.len() {
        return Err(LoadError::malformed(
            bytes.len(),
            "function and code section have inconsistent lengths",
        ));
    }
    if let Some(declared) = module.data_count {
        if declared as usize != module.data.len() {
            return Err(LoadError::malformed(
                bytes.len(),
                "data count and data section have inconsistent lengths",
            ));
        }
    }

    Ok(module)
}
