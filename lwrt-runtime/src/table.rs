// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly table implementation
//!
//! A table holds nullable function references. Slots start out null and
//! are filled by active element segments; `call_indirect` reads them.

use crate::prelude::*;

/// A function table
pub struct Table {
    ty:       TableType,
    elements: Mutex<Vec<Option<Arc<FuncInstance>>>>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("ty", &self.ty).field("size", &self.size()).finish()
    }
}

impl Table {
    /// Create a table with `ty.limits.min` null slots.
    ///
    /// # Errors
    ///
    /// [`LinkError::LimitExceeded`] if the minimum is above
    /// `host_max_elements`.
    pub fn new(ty: TableType, host_max_elements: u32) -> Result<Self, LinkError> {
        if ty.limits.min > host_max_elements {
            warn!(min = ty.limits.min, ceiling = host_max_elements, "table minimum above host ceiling");
            return Err(LinkError::LimitExceeded { what: "table" });
        }
        Ok(Self {
            ty,
            elements: Mutex::new(vec![None; ty.limits.min as usize]),
        })
    }

    /// The table's type as seen by an importer
    #[must_use]
    pub fn ty(&self) -> TableType {
        TableType {
            element: self.ty.element,
            limits:  Limits {
                min: self.size(),
                max: self.ty.limits.max,
            },
        }
    }

    /// Number of slots
    #[must_use]
    pub fn size(&self) -> u32 {
        lock(&self.elements).len() as u32
    }

    /// Read slot `idx`.
    ///
    /// # Errors
    ///
    /// [`Trap::UndefinedElement`] if `idx` is past the end.
    pub fn get(&self, idx: u32) -> Result<Option<Arc<FuncInstance>>, Trap> {
        lock(&self.elements)
            .get(idx as usize)
            .cloned()
            .ok_or(Trap::UndefinedElement)
    }

    /// Write slot `idx`.
    ///
    /// # Errors
    ///
    /// [`Trap::UndefinedElement`] if `idx` is past the end.
    pub fn set(&self, idx: u32, func: Option<Arc<FuncInstance>>) -> Result<(), Trap> {
        let mut elements = lock(&self.elements);
        let slot = elements.get_mut(idx as usize).ok_or(Trap::UndefinedElement)?;
        *slot = func;
        Ok(())
    }

    /// Live instances that own a function stored in the table
    #[must_use]
    pub fn owners(&self) -> Vec<Arc<ModuleInstance>> {
        let elements = lock(&self.elements);
        let mut owners: Vec<Arc<ModuleInstance>> = Vec::new();
        for func in elements.iter().flatten() {
            if let FuncInstance::Wasm { instance, .. } = func.as_ref() {
                if let Some(owner) = instance.upgrade() {
                    if !owners.iter().any(|known| Arc::ptr_eq(known, &owner)) {
                        owners.push(owner);
                    }
                }
            }
        }
        owners
    }

    /// Whether `len` slots starting at `offset` exist
    #[must_use]
    pub fn fits(&self, offset: u32, len: usize) -> bool {
        (offset as usize).checked_add(len).is_some_and(|end| end <= self.size() as usize)
    }

    /// Write `funcs` into consecutive slots starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`Trap::UndefinedElement`] if the range does not fit; no slot is
    /// written in that case.
    pub fn init(&self, offset: u32, funcs: &[Arc<FuncInstance>]) -> Result<(), Trap> {
        let mut elements = lock(&self.elements);
        let start = offset as usize;
        let slots = start
            .checked_add(funcs.len())
            .and_then(|end| elements.get_mut(start..end))
            .ok_or(Trap::UndefinedElement)?;
        for (slot, func) in slots.iter_mut().zip(funcs) {
            *slot = Some(Arc::clone(func));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lwrt_foundation::RefType;

    use super::*;

    fn func_ref() -> Arc<FuncInstance> {
        Arc::new(FuncInstance::Host(HostFunc::new(FuncType::new([], []), |_, _| Ok(Vec::new()))))
    }

    fn table(min: u32) -> Table {
        let ty = TableType {
            element: RefType::FuncRef,
            limits:  Limits { min, max: None },
        };
        Table::new(ty, 100).expect("table should fit")
    }

    #[test]
    fn test_slots_start_null() -> Result<(), Trap> {
        let table = table(2);
        assert_eq!(table.size(), 2);
        assert!(table.get(0)?.is_none());
        assert!(matches!(table.get(2), Err(Trap::UndefinedElement)));
        Ok(())
    }

    #[test]
    fn test_init_is_all_or_nothing() -> Result<(), Trap> {
        let table = table(2);
        let f = func_ref();
        assert!(matches!(table.init(1, &[f.clone(), f.clone()]), Err(Trap::UndefinedElement)));
        assert!(table.get(1)?.is_none());

        table.init(0, &[f.clone(), f])?;
        assert!(table.get(1)?.is_some());
        table.set(1, None)?;
        assert!(table.get(1)?.is_none());
        Ok(())
    }

    #[test]
    fn test_minimum_above_ceiling() {
        let ty = TableType {
            element: RefType::FuncRef,
            limits:  Limits { min: 101, max: None },
        };
        assert_eq!(Table::new(ty, 100).err(), Some(LinkError::LimitExceeded { what: "table" }));
    }
}
