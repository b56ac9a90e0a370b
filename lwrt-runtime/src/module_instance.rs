// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Module instance implementation for WebAssembly runtime
//!
//! An instance is a module plus everything its code touches at run time:
//! the resolved import table, its memory, table and globals, and the export
//! map. Instantiation either produces a complete instance or fails without
//! any side effect visible outside the linker.

use core::sync::atomic::{AtomicUsize, Ordering};

use lwrt_decoder::{module::FunctionBody, ConstExpr, ImportDesc};
use lwrt_foundation::tracing::{ExecutionTrace, ImportTrace, ModuleTrace};

use crate::{execution::ExecutionStats, linker::Linker, prelude::*, stackless::StacklessEngine};

static NEXT_INSTANCE_ID: AtomicUsize = AtomicUsize::new(1);

/// Anything that can be imported or exported
#[derive(Debug, Clone)]
pub enum Extern {
    /// A function
    Func(Arc<FuncInstance>),
    /// A table
    Table(Arc<Table>),
    /// A linear memory
    Memory(Arc<Memory>),
    /// A global
    Global(Arc<Global>),
}

impl Extern {
    /// Kind of entity
    #[must_use]
    pub fn kind(&self) -> ExternKind {
        match self {
            Self::Func(_) => ExternKind::Func,
            Self::Table(_) => ExternKind::Table,
            Self::Memory(_) => ExternKind::Memory,
            Self::Global(_) => ExternKind::Global,
        }
    }
}

impl From<HostFunc> for Extern {
    fn from(func: HostFunc) -> Self {
        Self::Func(Arc::new(FuncInstance::Host(func)))
    }
}

impl From<Arc<Memory>> for Extern {
    fn from(memory: Arc<Memory>) -> Self {
        Self::Memory(memory)
    }
}

impl From<Arc<Table>> for Extern {
    fn from(table: Arc<Table>) -> Self {
        Self::Table(table)
    }
}

impl From<Arc<Global>> for Extern {
    fn from(global: Arc<Global>) -> Self {
        Self::Global(global)
    }
}

/// Represents a runtime instance of a WebAssembly module
#[derive(Debug)]
pub struct ModuleInstance {
    /// Instance ID for tracing
    id:           usize,
    /// The module this instance was instantiated from
    module:       Arc<Module>,
    /// Limits applied to calls into this instance
    config:       EngineConfig,
    /// Function index space, imports first
    funcs:        Vec<Arc<FuncInstance>>,
    /// `(namespace, name)` of each imported function, by function index
    import_names: Vec<(String, String)>,
    /// The instance's table, if any
    table:        Option<Arc<Table>>,
    /// The instance's memory, if any
    memory:       Option<Arc<Memory>>,
    /// Global index space, imports first
    globals:      Vec<Arc<Global>>,
    /// Exports by name
    exports:      HashMap<String, Extern>,
    /// Instances whose functions were imported directly or through a table
    dependencies: Vec<Arc<ModuleInstance>>,
    /// Statistics of the most recent call
    last_stats:   Mutex<ExecutionStats>,
}

/// Imports of one kind, in declaration order
#[derive(Default)]
struct ResolvedImports {
    funcs:        Vec<Arc<FuncInstance>>,
    names:        Vec<(String, String)>,
    tables:       Vec<Arc<Table>>,
    memories:     Vec<Arc<Memory>>,
    globals:      Vec<Arc<Global>>,
    dependencies: Vec<Arc<ModuleInstance>>,
}

impl ResolvedImports {
    fn depend_on(&mut self, owner: Arc<ModuleInstance>) {
        if !self.dependencies.iter().any(|known| Arc::ptr_eq(known, &owner)) {
            self.dependencies.push(owner);
        }
    }
}

/// Check a linker definition against an import declaration
fn check_import_type(module: &Module, desc: &ImportDesc, item: &Extern) -> Result<(), &'static str> {
    match (desc, item) {
        (ImportDesc::Func(type_idx), Extern::Func(func)) => {
            if module.types.get(*type_idx as usize) != Some(func.ty()) {
                return Err("function signature mismatch");
            }
        },
        (ImportDesc::Memory(ty), Extern::Memory(memory)) => {
            if !memory.ty().limits.is_subtype_of(&ty.limits) {
                return Err("memory limits mismatch");
            }
        },
        (ImportDesc::Table(ty), Extern::Table(table)) => {
            if !table.ty().limits.is_subtype_of(&ty.limits) {
                return Err("table limits mismatch");
            }
        },
        (ImportDesc::Global(ty), Extern::Global(global)) => {
            if global.ty() != *ty {
                return Err("global type mismatch");
            }
        },
        _ => return Err("incompatible import kind"),
    }
    Ok(())
}

fn resolve_imports(module: &Module, linker: &Linker) -> Result<ResolvedImports, LinkError> {
    let mut resolved = ResolvedImports::default();

    for (idx, import) in module.imports.iter().enumerate() {
        let span = ImportTrace::resolving(idx, &import.module, &import.name);
        let _guard = span.enter();

        let Some(item) = linker.get(&import.module, &import.name) else {
            warn!(module = %import.module, name = %import.name, "unresolved import");
            return Err(LinkError::UnresolvedImport {
                module: import.module.clone(),
                name:   import.name.clone(),
            });
        };
        if let Err(reason) = check_import_type(module, &import.desc, item) {
            warn!(module = %import.module, name = %import.name, reason, "import type mismatch");
            return Err(LinkError::TypeMismatch {
                module: import.module.clone(),
                name: import.name.clone(),
                reason,
            });
        }

        match item {
            Extern::Func(func) => {
                if let FuncInstance::Wasm { instance, .. } = func.as_ref() {
                    if let Some(owner) = instance.upgrade() {
                        resolved.depend_on(owner);
                    }
                }
                resolved.funcs.push(Arc::clone(func));
                resolved.names.push((import.module.clone(), import.name.clone()));
            },
            Extern::Table(table) => {
                // Functions already in the table stay callable through it
                for owner in table.owners() {
                    resolved.depend_on(owner);
                }
                resolved.tables.push(Arc::clone(table));
            },
            Extern::Memory(memory) => resolved.memories.push(Arc::clone(memory)),
            Extern::Global(global) => resolved.globals.push(Arc::clone(global)),
        }
        trace!("import resolved");
    }
    Ok(resolved)
}

/// Evaluate a validated constant expression
fn eval_const(expr: ConstExpr, globals: &[Arc<Global>]) -> Value {
    match expr {
        ConstExpr::I32(v) => Value::I32(v),
        ConstExpr::I64(v) => Value::I64(v),
        ConstExpr::F32(v) => Value::F32(v),
        ConstExpr::F64(v) => Value::F64(v),
        ConstExpr::GlobalGet(idx) => {
            globals.get(idx as usize).map_or(Value::I32(0), |global| global.get())
        },
    }
}

fn segment_offset(expr: ConstExpr, globals: &[Arc<Global>]) -> u32 {
    eval_const(expr, globals).as_i32().unwrap_or(0) as u32
}

impl ModuleInstance {
    /// Instantiate `module` against the definitions in `linker`.
    ///
    /// Steps, in order: resolve imports in declaration order, create the
    /// memory and table, initialise globals, check that every active
    /// segment fits, build the instance, copy segments, run the start
    /// function.
    ///
    /// # Errors
    ///
    /// The first [`LinkError`] encountered. Nothing outside the new
    /// instance has been modified when an error is returned before the
    /// start function runs.
    pub fn instantiate(
        module: Arc<Module>,
        linker: &Linker,
        config: &EngineConfig,
    ) -> Result<Arc<Self>, LinkError> {
        let span = ModuleTrace::instantiating(module.imports.len(), module.bodies.len());
        let _guard = span.enter();

        let imports = resolve_imports(&module, linker)?;

        let memory = match imports.memories.into_iter().next() {
            Some(memory) => Some(memory),
            None => match module.memories.first() {
                Some(ty) => Some(Arc::new(Memory::new(*ty, config.max_memory_pages)?)),
                None => None,
            },
        };
        let table = match imports.tables.into_iter().next() {
            Some(table) => Some(table),
            None => match module.tables.first() {
                Some(ty) => Some(Arc::new(Table::new(*ty, config.max_table_elements)?)),
                None => None,
            },
        };

        let mut globals = imports.globals;
        for global in &module.globals {
            let value = eval_const(global.init, &globals);
            globals.push(Arc::new(Global::with_value(global.ty, value)));
        }

        for (index, segment) in module.data.iter().enumerate() {
            let offset = segment_offset(segment.offset, &globals);
            let fits = memory.as_ref().is_some_and(|m| m.fits(u64::from(offset), segment.bytes.len()));
            if !fits {
                warn!(index, offset, "data segment does not fit");
                return Err(LinkError::SegmentOutOfBounds {
                    kind:  "data",
                    index: index as u32,
                });
            }
        }
        for (index, segment) in module.elements.iter().enumerate() {
            let offset = segment_offset(segment.offset, &globals);
            if !table.as_ref().is_some_and(|t| t.fits(offset, segment.funcs.len())) {
                warn!(index, offset, "element segment does not fit");
                return Err(LinkError::SegmentOutOfBounds {
                    kind:  "element",
                    index: index as u32,
                });
            }
        }

        let num_imported = module.num_imported_funcs();
        let instance = Arc::new_cyclic(|weak: &Weak<Self>| {
            let mut funcs = imports.funcs;
            for (i, &type_idx) in module.functions.iter().enumerate() {
                let ty = module.types.get(type_idx as usize).cloned().unwrap_or_default();
                funcs.push(Arc::new(FuncInstance::Wasm {
                    ty,
                    instance: weak.clone(),
                    index: num_imported + i as u32,
                }));
            }

            let exports = module
                .exports
                .iter()
                .filter_map(|export| {
                    let item = match export.kind {
                        ExternKind::Func => funcs.get(export.index as usize).cloned().map(Extern::Func),
                        ExternKind::Table => table.clone().map(Extern::Table),
                        ExternKind::Memory => memory.clone().map(Extern::Memory),
                        ExternKind::Global => {
                            globals.get(export.index as usize).cloned().map(Extern::Global)
                        },
                    };
                    item.map(|item| (export.name.clone(), item))
                })
                .collect();

            Self {
                id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
                module: Arc::clone(&module),
                config: config.clone(),
                funcs,
                import_names: imports.names,
                table,
                memory,
                globals,
                exports,
                dependencies: imports.dependencies,
                last_stats: Mutex::new(ExecutionStats::default()),
            }
        });

        instance.initialize_segments().map_err(LinkError::StartFailed)?;

        if let Some(start) = module.start {
            let func = instance
                .func(start)
                .cloned()
                .ok_or(LinkError::StartFailed(Trap::Host(Error::engine_invariant("Missing start function"))))?;
            if let Err(trap) = instance.invoke(&func, &[]) {
                warn!(%trap, "start function failed");
                return Err(LinkError::StartFailed(trap));
            }
        }

        debug!(instance = instance.id, exports = instance.exports.len(), "module instantiated");
        Ok(instance)
    }

    /// Copy active segments; bounds were checked before the instance was
    /// built.
    fn initialize_segments(&self) -> Result<(), Trap> {
        for segment in &self.module.data {
            let offset = segment_offset(segment.offset, &self.globals);
            let memory = self.memory.as_ref().ok_or(Trap::Host(Error::MISSING_MEMORY))?;
            memory.write(offset, &segment.bytes)?;
        }
        for segment in &self.module.elements {
            let offset = segment_offset(segment.offset, &self.globals);
            let funcs: Vec<Arc<FuncInstance>> =
                segment.funcs.iter().filter_map(|&idx| self.func(idx).cloned()).collect();
            if let Some(table) = &self.table {
                table.init(offset, &funcs)?;
            }
        }
        Ok(())
    }

    /// Instance ID, unique within the process
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The module this instance was created from
    #[must_use]
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Limits applied to calls into this instance
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The instance's memory
    #[must_use]
    pub fn memory(&self) -> Option<&Arc<Memory>> {
        self.memory.as_ref()
    }

    /// The instance's table
    #[must_use]
    pub fn table(&self) -> Option<&Arc<Table>> {
        self.table.as_ref()
    }

    /// Global by index
    #[must_use]
    pub fn global(&self, idx: u32) -> Option<&Arc<Global>> {
        self.globals.get(idx as usize)
    }

    /// Function by index
    #[must_use]
    pub fn func(&self, idx: u32) -> Option<&Arc<FuncInstance>> {
        self.funcs.get(idx as usize)
    }

    /// Namespace and name of an imported function
    #[must_use]
    pub fn import_name(&self, func_idx: u32) -> Option<(&str, &str)> {
        self.import_names.get(func_idx as usize).map(|(m, n)| (m.as_str(), n.as_str()))
    }

    /// Body of a function defined by this instance's module
    pub(crate) fn body(&self, func_idx: u32) -> Option<&FunctionBody> {
        let local = func_idx.checked_sub(self.module.num_imported_funcs())?;
        self.module.bodies.get(local as usize)
    }

    /// Export by name
    #[must_use]
    pub fn export(&self, name: &str) -> Option<&Extern> {
        self.exports.get(name)
    }

    /// All exports, sorted by name
    #[must_use]
    pub fn exports(&self) -> Vec<(&str, &Extern)> {
        let mut exports: Vec<(&str, &Extern)> =
            self.exports.iter().map(|(name, item)| (name.as_str(), item)).collect();
        exports.sort_unstable_by_key(|(name, _)| *name);
        exports
    }

    /// Number of instances this one keeps alive through its imports
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Statistics of the most recent call into this instance
    #[must_use]
    pub fn last_call_stats(&self) -> ExecutionStats {
        lock(&self.last_stats).clone()
    }

    /// Run `func` to completion with already type-checked `args`.
    ///
    /// # Errors
    ///
    /// The trap that ended execution.
    pub fn invoke(&self, func: &Arc<FuncInstance>, args: &[Value]) -> Result<Vec<Value>, Trap> {
        let mut engine = StacklessEngine::new(&self.config);
        let result = engine.invoke(func, args);
        *lock(&self.last_stats) = engine.stats().clone();
        if let Err(trap) = &result {
            debug!(instance = self.id, %trap, "call trapped");
        }
        result
    }

    /// Call an exported function by name.
    ///
    /// Arguments are checked against the declared parameters before any
    /// instruction runs.
    ///
    /// # Errors
    ///
    /// [`CallError::NoSuchExport`], [`CallError::NotAFunction`],
    /// [`CallError::ArityOrTypeMismatch`], or [`CallError::Trap`] wrapping
    /// the trap that ended execution.
    pub fn call_export(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, CallError> {
        let span = ExecutionTrace::export_call(name, args.len());
        let _guard = span.enter();

        let func = match self.exports.get(name) {
            Some(Extern::Func(func)) => func,
            Some(_) => return Err(CallError::NotAFunction(name.to_string())),
            None => return Err(CallError::NoSuchExport(name.to_string())),
        };
        check_arguments(func.ty(), args)?;
        self.invoke(func, args).map_err(CallError::Trap)
    }
}

/// Check call arguments against a signature
///
/// # Errors
///
/// [`CallError::ArityOrTypeMismatch`] describing the first problem.
pub fn check_arguments(ty: &FuncType, args: &[Value]) -> Result<(), CallError> {
    let mismatch = |first_bad_arg| CallError::ArityOrTypeMismatch {
        expected_params: ty.params.len(),
        given: args.len(),
        first_bad_arg,
    };
    if ty.params.len() != args.len() {
        return Err(mismatch(None));
    }
    if let Some(bad) = args.iter().zip(&ty.params).position(|(arg, param)| !arg.matches_type(*param)) {
        return Err(mismatch(Some(bad)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_arguments() {
        let ty = FuncType::new([ValueType::I32, ValueType::I64], []);
        assert!(check_arguments(&ty, &[Value::I32(1), Value::I64(2)]).is_ok());
        assert_eq!(
            check_arguments(&ty, &[Value::I32(1)]),
            Err(CallError::ArityOrTypeMismatch {
                expected_params: 2,
                given:           1,
                first_bad_arg:   None,
            })
        );
        assert_eq!(
            check_arguments(&ty, &[Value::I32(1), Value::I32(2)]),
            Err(CallError::ArityOrTypeMismatch {
                expected_params: 2,
                given:           2,
                first_bad_arg:   Some(1),
            })
        );
    }

    #[test]
    fn test_extern_kinds() {
        let func = Extern::from(HostFunc::new(FuncType::default(), |_, _| Ok(Vec::new())));
        assert_eq!(func.kind(), ExternKind::Func);
        let memory = Memory::new(MemoryType::new(0, None), 1).expect("empty memory");
        assert_eq!(Extern::from(Arc::new(memory)).kind(), ExternKind::Memory);
    }
}
