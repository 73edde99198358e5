//! The backend facade.
//!
//! [`Backend`] is the per-compilation-unit context a front end talks to. It
//! owns the type cache, the node arena, the instruction store and every
//! function and variable, and exposes one method per front-end operation:
//!
//! - **types** (`types.rs`): delegations to [`TypeCache`]
//! - **expressions** (`exprs.rs`): expression nodes with their instructions
//! - **statements** (`stmts.rs`): statement nodes, blocks and labels
//! - **variables** (`vars.rs`): globals, locals, parameters, temporaries
//! - **functions** (`functions.rs`): declaration, lowering, final hand-off
//!
//! # Error sentinels
//!
//! Every category has one error value: [`TypeId::ERROR`],
//! [`Backend::error_expression`], [`Backend::error_statement`],
//! [`Backend::error_variable`] and [`Backend::error_function`]. A
//! constructor that receives a sentinel returns the sentinel of its own
//! category instead of building anything.

mod config;
mod exprs;
mod functions;
mod stmts;
mod types;
mod vars;

use dragon_ir::{Name, Span, StringInterner};
use dragon_types::{TypeCache, TypeId};

use crate::arena::{DestroyMode, NodeArena};
use crate::dump::dump_tree;
use crate::function::{Function, FunctionFlags, SplitStack};
use crate::integrity::{check_tree_integrity, IntegrityReport};
use crate::llir::{FuncId, GlobalId, InstKind, InstStore, Value};
use crate::node::{CompositeState, NodeFlags, NodeId};
use crate::variable::{GlobalData, VarId, Variable};

pub use self::config::BackendConfig;

/// Code-generation context for one compilation unit.
pub struct Backend {
    config: BackendConfig,
    interner: StringInterner,
    types: TypeCache,
    arena: NodeArena,
    insts: InstStore,
    /// Indexed by `FuncId`; entry 0 is the error function.
    functions: Vec<Function>,
    /// Indexed by `VarId`; entry 0 is the error variable.
    variables: Vec<Variable>,
    /// Indexed by `GlobalId`.
    globals: Vec<GlobalData>,
}

impl Default for Backend {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

impl Backend {
    pub fn new(config: BackendConfig) -> Self {
        let error_function = Function::new(
            FuncId::new(0),
            Name::EMPTY,
            Name::EMPTY,
            TypeId::ERROR,
            FunctionFlags::empty(),
            SplitStack::No,
            Span::DUMMY,
        );
        Backend {
            types: TypeCache::new(config.target),
            config,
            interner: StringInterner::new(),
            arena: NodeArena::new(),
            insts: InstStore::new(),
            functions: vec![error_function],
            variables: vec![Variable::error()],
            globals: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    #[inline]
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Intern a name, for struct fields and parameter lists.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    #[inline]
    pub fn type_cache(&self) -> &TypeCache {
        &self.types
    }

    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Direct access for structural edits (`replace_child`,
    /// `remove_all_children`, composite updates).
    #[inline]
    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    #[inline]
    pub fn insts(&self) -> &InstStore {
        &self.insts
    }

    /// Destroy the tree under `root` in the given mode.
    pub fn destroy(&mut self, root: NodeId, mode: DestroyMode) {
        self.arena.destroy(root, mode, &mut self.insts);
    }

    pub fn function_data(&self, func: FuncId) -> &Function {
        &self.functions[func.index()]
    }

    pub fn variable_data(&self, var: VarId) -> &Variable {
        &self.variables[var.index()]
    }

    pub fn global_data(&self, global: GlobalId) -> &GlobalData {
        &self.globals[global.index()]
    }

    // Sentinels

    #[inline]
    pub fn error_expression(&self) -> NodeId {
        NodeArena::ERROR_EXPR
    }

    #[inline]
    pub fn error_statement(&self) -> NodeId {
        NodeArena::ERROR_STMT
    }

    #[inline]
    pub fn error_variable(&self) -> VarId {
        VarId::new(0)
    }

    #[inline]
    pub fn error_function(&self) -> FuncId {
        FuncId::new(0)
    }

    #[inline]
    fn is_error_expr(&self, expr: NodeId) -> bool {
        expr == NodeArena::ERROR_EXPR || self.types.is_error(self.arena.get(expr).ty())
    }

    #[inline]
    fn is_error_stmt(&self, stmt: NodeId) -> bool {
        stmt == NodeArena::ERROR_STMT
    }

    // Diagnostics

    /// Run the single-parent check on the tree under `root`.
    pub fn check_tree_integrity(&self, root: NodeId) -> IntegrityReport {
        check_tree_integrity(&self.arena, root)
    }

    /// Skip the integrity check in [`function_set_body`](Self::function_set_body).
    pub fn disable_integrity_checks(&mut self) {
        self.config.integrity_checks = false;
    }

    /// Indented rendering of the tree under `root`.
    pub fn dump_tree(&self, root: NodeId) -> String {
        dump_tree(&self.arena, &self.insts, &self.types, &self.interner, root)
    }

    // Values

    /// Value of an expression for use as an operand.
    ///
    /// A building composite is finalized with an `Aggregate` of its
    /// children. An expression whose value is still an address gets a
    /// `Load` appended to its own instructions.
    pub(crate) fn rvalue(&mut self, expr: NodeId) -> Value {
        if self.arena.get(expr).composite_state() == Some(CompositeState::Building) {
            let kids = self.arena.get(expr).kids().to_vec();
            let elems: Vec<Value> = kids.into_iter().map(|kid| self.rvalue(kid)).collect();
            let ty = self.arena.get(expr).ty();
            let agg = self.insts.create(InstKind::Aggregate { elems }, ty);
            self.arena.append_instruction(expr, agg);
            self.arena.finish_composite(expr, Value::Inst(agg));
        }

        let node = self.arena.get(expr);
        let Some(value) = node.value() else {
            panic!("{} node {} has no value", node.kind().flavor(), expr.raw());
        };
        if !node.is_address() {
            return value;
        }

        let flags = node.flags() - NodeFlags::ADDRESS;
        let load = self.insts.create(InstKind::Load { ptr: value }, node.ty());
        self.arena.append_instruction(expr, load);
        self.arena.set_value(expr, Value::Inst(load));
        self.arena.set_flags(expr, flags);
        Value::Inst(load)
    }

    /// Address denoted by an addressable expression.
    pub(crate) fn lvalue(&self, expr: NodeId) -> Value {
        let node = self.arena.get(expr);
        assert!(
            node.is_address(),
            "{} node {} is not addressable",
            node.kind().flavor(),
            expr.raw()
        );
        match node.value() {
            Some(addr) => addr,
            None => panic!("{} node {} has no address", node.kind().flavor(), expr.raw()),
        }
    }
}
