// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Cursor over a bounded region of the module image.
//!
//! The reader keeps the whole buffer (truncated to the end of the current
//! region) so that every position it reports is an absolute offset into the
//! original module, which is what [`LoadError::MalformedEncoding`] carries.

use lwrt_format::binary;

use crate::prelude::*;

/// A forward-only cursor over `bytes[..end]`.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    bytes: &'a [u8],
    pos:   usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a reader over `bytes` starting at `pos`.
    #[must_use]
    pub fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    /// Current absolute position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Whether the region has been fully consumed
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Bytes left in the region
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    /// A reader over the next `len` bytes; this reader skips past them.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` if fewer than `len` bytes remain.
    pub fn sub_reader(&mut self, len: usize) -> Result<BinaryReader<'a>> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| LoadError::malformed(self.bytes.len(), "unexpected end"))?;
        let sub = BinaryReader::new(&self.bytes[..end], self.pos);
        self.pos = end;
        Ok(sub)
    }

    /// Apply one of the `lwrt_format` primitive readers and advance.
    ///
    /// # Errors
    ///
    /// Whatever the primitive reader reports.
    pub fn read<T>(&mut self, f: impl FnOnce(&'a [u8], usize) -> Result<(T, usize)>) -> Result<T> {
        let (value, used) = f(self.bytes, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// Read one byte
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` at the end of the region.
    pub fn u8(&mut self) -> Result<u8> {
        self.read(binary::read_u8)
    }

    /// Look at the next byte without consuming it
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` at the end of the region.
    pub fn peek_u8(&self) -> Result<u8> {
        binary::read_u8(self.bytes, self.pos).map(|(b, _)| b)
    }

    /// Read a LEB128 `u32`
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` for truncated or oversized encodings.
    pub fn u32(&mut self) -> Result<u32> {
        self.read(binary::read_leb128_u32)
    }

    /// Read a LEB128 `i32`
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` for truncated or oversized encodings.
    pub fn i32(&mut self) -> Result<i32> {
        self.read(binary::read_leb128_i32)
    }

    /// Read a LEB128 `i64`
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` for truncated or oversized encodings.
    pub fn i64(&mut self) -> Result<i64> {
        self.read(binary::read_leb128_i64)
    }

    /// Read a length-prefixed name
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` for truncation or invalid UTF-8.
    pub fn name(&mut self) -> Result<String> {
        self.read(binary::read_string)
    }

    /// Read `len` raw bytes
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` if fewer than `len` bytes remain.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.read(|bytes, pos| binary::read_bytes(bytes, pos, len))
    }

    /// Read a value type
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` for unknown type bytes.
    pub fn value_type(&mut self) -> Result<ValueType> {
        let pos = self.pos;
        let byte = self.u8()?;
        ValueType::from_binary(byte).map_err(|e| LoadError::malformed(pos, e.message))
    }

    /// Read a vector count followed by `count` items.
    ///
    /// # Errors
    ///
    /// Propagates item errors.
    pub fn vec<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let count = self.u32()?;
        let mut items = Vec::with_capacity((count as usize).min(self.remaining()));
        for _ in 0..count {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// Fail unless the region has been consumed exactly.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` with `reason` if bytes remain.
    pub fn expect_end(&self, reason: &'static str) -> Result<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(LoadError::malformed(self.pos, reason))
        }
    }
}
