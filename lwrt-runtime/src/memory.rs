// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly Memory Implementation
//!
//! Linear memory is one contiguous, byte-addressable range starting at
//! offset 0. It is backed by a resizable buffer behind a mutex; callers only
//! ever see offsets, so growing (which may move the buffer) never
//! invalidates an address, it only raises the bounds-check ceiling.
//!
//! - Every access is bounds checked and all or nothing: an access that
//!   does not fit fails with [`Trap::OutOfBounds`] and touches no bytes.
//! - Growth zero-fills the new pages. A failed growth leaves size and
//!   contents untouched.
//!
//! # Usage
//!
//! ```
//! use lwrt_foundation::MemoryType;
//! use lwrt_runtime::Memory;
//!
//! let memory = Memory::new(MemoryType::new(1, Some(2)), 65536).unwrap();
//! memory.write(0, &[1, 2, 3, 4]).unwrap();
//!
//! let mut buffer = [0; 4];
//! memory.read(0, &mut buffer).unwrap();
//! assert_eq!(buffer, [1, 2, 3, 4]);
//!
//! assert_eq!(memory.grow(1), Some(1)); // previous size
//! assert_eq!(memory.grow(1), None);    // above the declared maximum
//! assert_eq!(memory.size(), 2);
//! ```

use core::{
    ops::Range,
    sync::atomic::{AtomicU32, Ordering},
};

use lwrt_foundation::tracing::MemoryTrace;

use crate::prelude::*;

/// WebAssembly page size (64KB)
pub const PAGE_SIZE: usize = WASM_PAGE_SIZE;

/// Byte range `[offset, offset + len)` if it lies within `size` bytes.
fn checked_range(offset: u64, len: usize, size: usize) -> Result<Range<usize>, Trap> {
    let start = usize::try_from(offset).map_err(|_| Trap::OutOfBounds)?;
    let end = start.checked_add(len).ok_or(Trap::OutOfBounds)?;
    if end > size {
        return Err(Trap::OutOfBounds);
    }
    Ok(start..end)
}

/// Represents a WebAssembly memory instance
#[derive(Debug)]
pub struct Memory {
    /// Declared type
    ty:            MemoryType,
    /// The memory data
    data:          Mutex<Vec<u8>>,
    /// Current number of pages
    current_pages: AtomicU32,
    /// Effective maximum: the declared maximum capped by the host ceiling
    max_pages:     u32,
}

impl Memory {
    /// Create a memory of `ty.limits.min` zeroed pages.
    ///
    /// # Errors
    ///
    /// [`LinkError::LimitExceeded`] if the minimum is above
    /// `host_max_pages` or cannot be allocated.
    pub fn new(ty: MemoryType, host_max_pages: u32) -> Result<Self, LinkError> {
        let exceeded = LinkError::LimitExceeded { what: "memory" };
        if ty.limits.min > host_max_pages {
            warn!(min = ty.limits.min, ceiling = host_max_pages, "memory minimum above host ceiling");
            return Err(exceeded);
        }
        let bytes = ty.limits.min as usize * PAGE_SIZE;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes).map_err(|_| exceeded.clone())?;
        data.resize(bytes, 0);

        let max_pages = ty.limits.max.map_or(host_max_pages, |max| max.min(host_max_pages));
        Ok(Self {
            ty,
            data: Mutex::new(data),
            current_pages: AtomicU32::new(ty.limits.min),
            max_pages,
        })
    }

    /// The memory's type as seen by an importer: the current size as
    /// minimum and the declared maximum.
    #[must_use]
    pub fn ty(&self) -> MemoryType {
        MemoryType {
            limits: Limits {
                min: self.size(),
                max: self.ty.limits.max,
            },
        }
    }

    /// Current size in pages
    #[must_use]
    pub fn size(&self) -> u32 {
        self.current_pages.load(Ordering::Acquire)
    }

    /// Current size in bytes
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.size() as usize * PAGE_SIZE
    }

    /// Largest size growth may reach, in pages
    #[must_use]
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Grow by `delta` pages.
    ///
    /// Returns the previous size in pages, or `None` if the result would
    /// exceed the maximum or the host cannot supply the bytes. On `None`
    /// nothing changes.
    pub fn grow(&self, delta: u32) -> Option<u32> {
        let mut data = lock(&self.data);
        let old_pages = self.size();
        let span = MemoryTrace::growing(old_pages, delta);
        let _guard = span.enter();

        let new_pages = old_pages.checked_add(delta).filter(|&pages| pages <= self.max_pages);
        let Some(new_pages) = new_pages else {
            debug!(max = self.max_pages, "memory growth refused");
            return None;
        };
        let new_len = new_pages as usize * PAGE_SIZE;
        let extra = new_len - data.len();
        if data.try_reserve_exact(extra).is_err() {
            debug!(bytes = new_len, "memory growth allocation failed");
            return None;
        }
        data.resize(new_len, 0);
        self.current_pages.store(new_pages, Ordering::Release);
        debug!(pages = new_pages, "memory grown");
        Some(old_pages)
    }

    /// Read data from memory into a buffer
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if the range exceeds the current size.
    pub fn read(&self, offset: u32, buffer: &mut [u8]) -> Result<(), Trap> {
        let data = lock(&self.data);
        let range = checked_range(u64::from(offset), buffer.len(), data.len())?;
        buffer.copy_from_slice(&data[range]);
        Ok(())
    }

    /// Write data from a buffer into memory
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if the range exceeds the current size.
    pub fn write(&self, offset: u32, buffer: &[u8]) -> Result<(), Trap> {
        let mut data = lock(&self.data);
        let range = checked_range(u64::from(offset), buffer.len(), data.len())?;
        data[range].copy_from_slice(buffer);
        Ok(())
    }

    /// Read `N` bytes at the effective address `addr + offset`.
    ///
    /// The sum is computed without wrapping, so an address near `u32::MAX`
    /// with a non-zero offset is out of bounds rather than aliasing low
    /// memory.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if the access does not fit.
    pub fn load<const N: usize>(&self, addr: u32, offset: u32) -> Result<[u8; N], Trap> {
        let data = lock(&self.data);
        let range = checked_range(u64::from(addr) + u64::from(offset), N, data.len())?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&data[range]);
        Ok(bytes)
    }

    /// Write `bytes` at the effective address `addr + offset`.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if the access does not fit.
    pub fn store(&self, addr: u32, offset: u32, bytes: &[u8]) -> Result<(), Trap> {
        let mut data = lock(&self.data);
        let range = checked_range(u64::from(addr) + u64::from(offset), bytes.len(), data.len())?;
        data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Set `len` bytes starting at `dst` to `value`.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if the range does not fit.
    pub fn fill(&self, dst: u32, value: u8, len: u32) -> Result<(), Trap> {
        let mut data = lock(&self.data);
        let range = checked_range(u64::from(dst), len as usize, data.len())?;
        data[range].fill(value);
        Ok(())
    }

    /// Copy `len` bytes from `src` to `dst`; the ranges may overlap.
    ///
    /// # Errors
    ///
    /// [`Trap::OutOfBounds`] if either range does not fit.
    pub fn copy_within(&self, src: u32, dst: u32, len: u32) -> Result<(), Trap> {
        let mut data = lock(&self.data);
        let size = data.len();
        let from = checked_range(u64::from(src), len as usize, size)?;
        let to = checked_range(u64::from(dst), len as usize, size)?;
        data.copy_within(from, to.start);
        Ok(())
    }

    /// Whether `[offset, offset + len)` currently fits
    #[must_use]
    pub fn fits(&self, offset: u64, len: usize) -> bool {
        checked_range(offset, len, self.size_in_bytes()).is_ok()
    }
}

impl MemoryAccessor for Memory {
    fn read_bytes(&self, offset: u32, buf: &mut [u8]) -> Result<(), Trap> {
        let span = MemoryTrace::accessing(offset, buf.len());
        let _guard = span.enter();
        self.read(offset, buf)
    }

    fn write_bytes(&self, offset: u32, bytes: &[u8]) -> Result<(), Trap> {
        let span = MemoryTrace::accessing(offset, bytes.len());
        let _guard = span.enter();
        self.write(offset, bytes)
    }

    fn size(&self) -> usize {
        self.size_in_bytes()
    }
}

/// A handle to a memory that does not keep it alive.
///
/// Once every owner of the memory is gone, each access fails with
/// `Trap::Host(Error::INSTANCE_DROPPED)`.
#[derive(Debug, Clone)]
pub struct MemoryView {
    memory: Weak<Memory>,
}

impl MemoryView {
    /// Create a view of `memory`
    #[must_use]
    pub fn new(memory: &Arc<Memory>) -> Self {
        Self {
            memory: Arc::downgrade(memory),
        }
    }

    fn upgrade(&self) -> Result<Arc<Memory>, Trap> {
        self.memory.upgrade().ok_or(Trap::Host(Error::INSTANCE_DROPPED))
    }

    /// Whether the memory still exists
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.memory.strong_count() > 0
    }

    /// Current size in pages
    ///
    /// # Errors
    ///
    /// `Trap::Host(Error::INSTANCE_DROPPED)` if the memory is gone.
    pub fn size(&self) -> Result<u32, Trap> {
        Ok(self.upgrade()?.size())
    }

    /// Copy `len` bytes starting at `offset` out of memory.
    ///
    /// # Errors
    ///
    /// `Trap::Host(Error::INSTANCE_DROPPED)` if the memory is gone,
    /// [`Trap::OutOfBounds`] if the range does not fit.
    pub fn read(&self, offset: u32, len: usize) -> Result<Vec<u8>, Trap> {
        let memory = self.upgrade()?;
        if !memory.fits(u64::from(offset), len) {
            return Err(Trap::OutOfBounds);
        }
        let mut buf = vec![0; len];
        memory.read(offset, &mut buf)?;
        Ok(buf)
    }

    /// Write `bytes` at `offset`.
    ///
    /// # Errors
    ///
    /// As for [`MemoryView::read`].
    pub fn write(&self, offset: u32, bytes: &[u8]) -> Result<(), Trap> {
        self.upgrade()?.write(offset, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(min: u32, max: Option<u32>) -> Memory {
        Memory::new(MemoryType::new(min, max), 65536).expect("memory should allocate")
    }

    #[test]
    fn test_grow_within_declared_maximum() {
        let mem = memory(1, Some(2));
        assert_eq!(mem.grow(1), Some(1));
        assert_eq!(mem.size(), 2);
        assert_eq!(mem.grow(1), None);
        assert_eq!(mem.size(), 2);
        assert_eq!(mem.grow(0), Some(2));
    }

    #[test]
    fn test_failed_grow_keeps_contents() -> Result<(), Trap> {
        let mem = memory(1, Some(1));
        mem.write(100, &[9, 8, 7])?;
        assert_eq!(mem.grow(1), None);
        let mut buf = [0; 3];
        mem.read(100, &mut buf)?;
        assert_eq!(buf, [9, 8, 7]);
        Ok(())
    }

    #[test]
    fn test_host_ceiling_caps_growth() {
        let mem = Memory::new(MemoryType::new(1, None), 3).expect("memory should allocate");
        assert_eq!(mem.max_pages(), 3);
        assert_eq!(mem.grow(2), Some(1));
        assert_eq!(mem.grow(1), None);
    }

    #[test]
    fn test_minimum_above_ceiling() {
        assert_eq!(
            Memory::new(MemoryType::new(4, None), 3).err(),
            Some(LinkError::LimitExceeded { what: "memory" })
        );
    }

    #[test]
    fn test_access_at_the_edge() -> Result<(), Trap> {
        let mem = memory(1, None);
        let last = (PAGE_SIZE - 4) as u32;
        mem.store(last, 0, &[1, 2, 3, 4])?;
        assert_eq!(mem.load::<4>(last, 0)?, [1, 2, 3, 4]);
        assert_eq!(mem.load::<4>(last, 1), Err(Trap::OutOfBounds));
        assert_eq!(mem.store(last + 1, 0, &[0; 4]), Err(Trap::OutOfBounds));
        // No partial write happened
        assert_eq!(mem.load::<4>(last, 0)?, [1, 2, 3, 4]);
        assert_eq!(mem.load::<1>(u32::MAX, 1), Err(Trap::OutOfBounds));
        Ok(())
    }

    #[test]
    fn test_fill_and_copy() -> Result<(), Trap> {
        let mem = memory(1, None);
        mem.fill(0, 0xAB, 4)?;
        mem.copy_within(0, 2, 4)?;
        assert_eq!(mem.load::<6>(0, 0)?, [0xAB; 6]);
        assert_eq!(mem.fill(PAGE_SIZE as u32, 0, 1), Err(Trap::OutOfBounds));
        assert_eq!(mem.fill(PAGE_SIZE as u32, 0, 0), Ok(()));
        Ok(())
    }

    #[test]
    fn test_view_fails_after_drop() -> Result<(), Trap> {
        let mem = Arc::new(memory(1, None));
        let view = MemoryView::new(&mem);
        view.write(0, b"hi")?;
        assert_eq!(view.read(0, 2)?, b"hi".to_vec());
        drop(mem);
        assert!(!view.is_alive());
        assert_eq!(view.read(0, 2), Err(Trap::Host(Error::INSTANCE_DROPPED)));
        assert_eq!(view.size(), Err(Trap::Host(Error::INSTANCE_DROPPED)));
        Ok(())
    }
}
