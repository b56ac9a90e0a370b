// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly binary format constants and primitive readers.

use lwrt_error::LoadError;

use crate::Result;

/// Magic bytes for WebAssembly modules: \0asm
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// WebAssembly binary format version
pub const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Length of magic plus version
pub const HEADER_LEN: usize = 8;

// Section IDs
/// Custom section
pub const CUSTOM_SECTION_ID: u8 = 0x00;
/// Type section
pub const TYPE_SECTION_ID: u8 = 0x01;
/// Import section
pub const IMPORT_SECTION_ID: u8 = 0x02;
/// Function section
pub const FUNCTION_SECTION_ID: u8 = 0x03;
/// Table section
pub const TABLE_SECTION_ID: u8 = 0x04;
/// Memory section
pub const MEMORY_SECTION_ID: u8 = 0x05;
/// Global section
pub const GLOBAL_SECTION_ID: u8 = 0x06;
/// Export section
pub const EXPORT_SECTION_ID: u8 = 0x07;
/// Start section
pub const START_SECTION_ID: u8 = 0x08;
/// Element section
pub const ELEMENT_SECTION_ID: u8 = 0x09;
/// Code section
pub const CODE_SECTION_ID: u8 = 0x0A;
/// Data section
pub const DATA_SECTION_ID: u8 = 0x0B;
/// Data count section
pub const DATA_COUNT_SECTION_ID: u8 = 0x0C;

// Value types
/// i32
pub const I32_TYPE: u8 = 0x7F;
/// i64
pub const I64_TYPE: u8 = 0x7E;
/// f32
pub const F32_TYPE: u8 = 0x7D;
/// f64
pub const F64_TYPE: u8 = 0x7C;
/// funcref
pub const FUNCREF_TYPE: u8 = 0x70;
/// Function type constructor in the type section
pub const FUNC_TYPE_FORM: u8 = 0x60;
/// Empty block type
pub const BLOCK_TYPE_EMPTY: u8 = 0x40;

/// Position in the section order required by the binary format, or `None`
/// for custom sections which may appear anywhere. The data count section
/// sits between the element and code sections.
#[must_use]
pub const fn section_order(id: u8) -> Option<u8> {
    match id {
        TYPE_SECTION_ID => Some(1),
        IMPORT_SECTION_ID => Some(2),
        FUNCTION_SECTION_ID => Some(3),
        TABLE_SECTION_ID => Some(4),
        MEMORY_SECTION_ID => Some(5),
        GLOBAL_SECTION_ID => Some(6),
        EXPORT_SECTION_ID => Some(7),
        START_SECTION_ID => Some(8),
        ELEMENT_SECTION_ID => Some(9),
        DATA_COUNT_SECTION_ID => Some(10),
        CODE_SECTION_ID => Some(11),
        DATA_SECTION_ID => Some(12),
        _ => None,
    }
}

fn unexpected_end(offset: usize) -> LoadError {
    LoadError::malformed(offset, "unexpected end")
}

/// Read a single byte.
///
/// # Errors
///
/// `MalformedEncoding` at `pos` if the buffer ends.
pub fn read_u8(bytes: &[u8], pos: usize) -> Result<(u8, usize)> {
    bytes.get(pos).map(|b| (*b, 1)).ok_or_else(|| unexpected_end(pos))
}

/// Read an unsigned LEB128 integer of at most `bits` bits.
fn read_unsigned(bytes: &[u8], pos: usize, bits: u32) -> Result<(u64, usize)> {
    let max_bytes = bits.div_ceil(7) as usize;
    let mut result = 0u64;
    let mut shift = 0u32;

    for i in 0..max_bytes {
        let byte = *bytes.get(pos + i).ok_or_else(|| unexpected_end(pos + i))?;
        result |= u64::from(byte & 0x7F) << shift;

        if i == max_bytes - 1 {
            if byte & 0x80 != 0 {
                return Err(LoadError::malformed(pos + i, "integer representation too long"));
            }
            let used_bits = bits - shift;
            if u32::from(byte & 0x7F) >> used_bits != 0 {
                return Err(LoadError::malformed(pos + i, "integer too large"));
            }
        }
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    // The last permitted byte always returns above
    Err(LoadError::malformed(pos, "integer representation too long"))
}

/// Read a signed LEB128 integer of at most `bits` bits, sign-extended.
fn read_signed(bytes: &[u8], pos: usize, bits: u32) -> Result<(i64, usize)> {
    let max_bytes = bits.div_ceil(7) as usize;
    let mut result = 0i64;
    let mut shift = 0u32;

    for i in 0..max_bytes {
        let byte = *bytes.get(pos + i).ok_or_else(|| unexpected_end(pos + i))?;
        result |= i64::from(byte & 0x7F) << shift;

        if i == max_bytes - 1 {
            if byte & 0x80 != 0 {
                return Err(LoadError::malformed(pos + i, "integer representation too long"));
            }
            // Unused high bits of the final byte must repeat the sign bit
            let used_bits = bits - shift;
            let unused_mask = (0x7Fu8 << used_bits) & 0x7F;
            let sign_set = byte & (1 << (used_bits - 1)) != 0;
            let expected = if sign_set { unused_mask } else { 0 };
            if byte & unused_mask != expected {
                return Err(LoadError::malformed(pos + i, "integer too large"));
            }
        }
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                result |= -1i64 << shift;
            }
            return Ok((result, i + 1));
        }
    }
    Err(LoadError::malformed(pos, "integer representation too long"))
}

/// Read a LEB128 unsigned 32-bit integer.
///
/// # Errors
///
/// `MalformedEncoding` if the encoding is truncated, longer than five bytes
/// or carries bits beyond 32.
pub fn read_leb128_u32(bytes: &[u8], pos: usize) -> Result<(u32, usize)> {
    read_unsigned(bytes, pos, 32).map(|(v, n)| (v as u32, n))
}

/// Read a LEB128 unsigned 64-bit integer.
///
/// # Errors
///
/// As [`read_leb128_u32`], for 64 bits.
pub fn read_leb128_u64(bytes: &[u8], pos: usize) -> Result<(u64, usize)> {
    read_unsigned(bytes, pos, 64)
}

/// Read a LEB128 signed 32-bit integer.
///
/// # Errors
///
/// As [`read_leb128_u32`]; the unused bits of a maximal encoding must be
/// a sign extension.
pub fn read_leb128_i32(bytes: &[u8], pos: usize) -> Result<(i32, usize)> {
    read_signed(bytes, pos, 32).map(|(v, n)| (v as i32, n))
}

/// Read a LEB128 signed 33-bit integer, as used for block type indices.
///
/// # Errors
///
/// As [`read_leb128_i32`].
pub fn read_leb128_i33(bytes: &[u8], pos: usize) -> Result<(i64, usize)> {
    read_signed(bytes, pos, 33)
}

/// Read a LEB128 signed 64-bit integer.
///
/// # Errors
///
/// As [`read_leb128_i32`], for 64 bits.
pub fn read_leb128_i64(bytes: &[u8], pos: usize) -> Result<(i64, usize)> {
    read_signed(bytes, pos, 64)
}

/// Borrow `len` raw bytes starting at `pos`.
///
/// # Errors
///
/// `MalformedEncoding` if fewer than `len` bytes remain.
pub fn read_bytes(bytes: &[u8], pos: usize, len: usize) -> Result<(&[u8], usize)> {
    let end = pos.checked_add(len).ok_or_else(|| unexpected_end(pos))?;
    bytes
        .get(pos..end)
        .map(|slice| (slice, len))
        .ok_or_else(|| unexpected_end(bytes.len()))
}

/// Read the raw bits of an `f32` (4 bytes, little-endian).
///
/// # Errors
///
/// `MalformedEncoding` if fewer than 4 bytes remain.
pub fn read_f32_bits(bytes: &[u8], pos: usize) -> Result<(u32, usize)> {
    let (raw, n) = read_bytes(bytes, pos, 4)?;
    let mut arr = [0u8; 4];
    arr.copy_from_slice(raw);
    Ok((u32::from_le_bytes(arr), n))
}

/// Read the raw bits of an `f64` (8 bytes, little-endian).
///
/// # Errors
///
/// `MalformedEncoding` if fewer than 8 bytes remain.
pub fn read_f64_bits(bytes: &[u8], pos: usize) -> Result<(u64, usize)> {
    let (raw, n) = read_bytes(bytes, pos, 8)?;
    let mut arr = [0u8; 8];
    arr.copy_from_slice(raw);
    Ok((u64::from_le_bytes(arr), n))
}

/// Read a length-prefixed UTF-8 name.
///
/// # Errors
///
/// `MalformedEncoding` if the length or bytes are truncated, or the bytes
/// are not valid UTF-8.
pub fn read_string(bytes: &[u8], pos: usize) -> Result<(String, usize)> {
    let (len, len_size) = read_leb128_u32(bytes, pos)?;
    let (raw, _) = read_bytes(bytes, pos + len_size, len as usize)?;
    let text = core::str::from_utf8(raw)
        .map_err(|_| LoadError::malformed(pos + len_size, "malformed UTF-8 encoding"))?;
    Ok((text.to_string(), len_size + len as usize))
}

/// Read a vector: a `u32` count followed by that many elements read by
/// `read_elem`.
///
/// # Errors
///
/// Propagates any element error; `MalformedEncoding` if the count is
/// truncated.
pub fn read_vector<T>(
    bytes: &[u8],
    pos: usize,
    mut read_elem: impl FnMut(&[u8], usize) -> Result<(T, usize)>,
) -> Result<(Vec<T>, usize)> {
    let (count, mut offset) = read_leb128_u32(bytes, pos)?;
    // Every element takes at least one byte, so a count past the end of the
    // buffer is already known to be truncated.
    let remaining = bytes.len().saturating_sub(pos + offset);
    let mut items = Vec::with_capacity((count as usize).min(remaining));
    for _ in 0..count {
        let (item, used) = read_elem(bytes, pos + offset)?;
        items.push(item);
        offset += used;
    }
    Ok((items, offset))
}
