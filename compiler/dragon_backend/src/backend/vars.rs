//! Variables: globals, locals, parameters and temporaries.

use dragon_ir::{Name, Span};
use dragon_types::TypeId;

use super::Backend;
use crate::arena::DestroyMode;
use crate::llir::{next_raw, FuncId, GlobalId, InstKind, Value};
use crate::node::{NodeId, NodeKind};
use crate::variable::{GlobalData, GlobalFlags, GlobalInit, VarId, VarKind, Variable};

impl Backend {
    fn push_variable(&mut self, var: Variable) -> VarId {
        let id = VarId::new(next_raw(self.variables.len(), "variables"));
        self.variables.push(var);
        id
    }

    fn new_global(&mut self, name: &str, asm_name: &str, ty: TypeId, flags: GlobalFlags, span: Span) -> VarId {
        let name = self.interner.intern(name);
        let asm_name = self.interner.intern(asm_name);
        let global = GlobalId::new(next_raw(self.globals.len(), "globals"));
        let var = self.push_variable(Variable {
            kind: VarKind::Global,
            name,
            ty,
            span,
            func: None,
            address_taken: true,
            storage: Value::Global(global),
        });
        self.globals.push(GlobalData {
            var,
            asm_name,
            flags,
            init: None,
        });
        var
    }

    /// Stack variable of `func`. Its slot goes into the entry block when the
    /// body is lowered.
    pub(crate) fn new_local(
        &mut self,
        func: FuncId,
        kind: VarKind,
        name: Name,
        ty: TypeId,
        address_taken: bool,
        span: Span,
    ) -> VarId {
        let ptr_ty = self.types.pointer_type(ty);
        let slot = self
            .insts
            .create(InstKind::Alloca { allocated: ty, name }, ptr_ty);
        self.functions[func.index()].add_pending_local(slot);
        self.push_variable(Variable {
            kind,
            name,
            ty,
            span,
            func: Some(func),
            address_taken,
            storage: Value::Inst(slot),
        })
    }

    /// Package-level variable. An empty `asm_name` means the plain name.
    #[allow(
        clippy::too_many_arguments,
        reason = "one argument per front-end attribute of the declaration"
    )]
    pub fn global_variable(
        &mut self,
        name: &str,
        asm_name: &str,
        ty: TypeId,
        is_external: bool,
        is_hidden: bool,
        in_unique_section: bool,
        span: Span,
    ) -> VarId {
        if self.types.is_error(ty) {
            return self.error_variable();
        }
        let mut flags = GlobalFlags::empty();
        flags.set(GlobalFlags::EXTERNAL, is_external);
        flags.set(GlobalFlags::HIDDEN, is_hidden);
        flags.set(GlobalFlags::UNIQUE_SECTION, in_unique_section);
        self.new_global(name, asm_name, ty, flags, span)
    }

    /// Give a global its constant initial value. `init` is consumed.
    ///
    /// # Panics
    /// Panics if `var` is not a global or `init` is not built from
    /// constants.
    pub fn global_variable_set_init(&mut self, var: VarId, init: NodeId) {
        if self.variables[var.index()].is_error() || self.is_error_expr(init) {
            return;
        }
        let Value::Global(global) = self.variables[var.index()].storage else {
            panic!("variable {} is not a global", var.raw());
        };
        let value = self.const_init(init);
        let data = &mut self.globals[global.index()];
        assert!(
            data.init.is_none(),
            "global {} already has an initializer",
            var.raw()
        );
        data.init = Some(value);
        self.arena.destroy(init, DestroyMode::All, &mut self.insts);
    }

    /// Read-only global holding a struct, for type descriptors and similar
    /// compiler-generated tables.
    ///
    /// # Panics
    /// Panics if both `is_hidden` and `is_common` are set.
    pub fn immutable_struct(
        &mut self,
        name: &str,
        asm_name: &str,
        is_hidden: bool,
        is_common: bool,
        ty: TypeId,
        span: Span,
    ) -> VarId {
        if self.types.is_error(ty) {
            return self.error_variable();
        }
        assert!(
            !(is_hidden && is_common),
            "immutable struct {name} cannot be both hidden and common"
        );
        let mut flags = GlobalFlags::CONSTANT;
        flags.set(GlobalFlags::HIDDEN, is_hidden);
        flags.set(GlobalFlags::COMMON, is_common);
        self.new_global(name, asm_name, ty, flags, span)
    }

    pub fn immutable_struct_set_init(&mut self, var: VarId, init: NodeId) {
        self.global_variable_set_init(var, init);
    }

    pub(super) fn const_init(&self, expr: NodeId) -> GlobalInit {
        let node = self.arena.get(expr);
        match node.kind() {
            NodeKind::Const => match node.value() {
                Some(Value::Const(c)) => GlobalInit::Scalar(c),
                other => panic!("constant node {} has value {other:?}", expr.raw()),
            },
            NodeKind::Composite(_) => {
                GlobalInit::Aggregate(node.kids().iter().map(|&kid| self.const_init(kid)).collect())
            }
            kind => panic!("initializer must be constant, got {} node", kind.flavor()),
        }
    }

    pub fn local_variable(
        &mut self,
        func: FuncId,
        name: &str,
        ty: TypeId,
        is_address_taken: bool,
        span: Span,
    ) -> VarId {
        if func == self.error_function() || self.types.is_error(ty) {
            return self.error_variable();
        }
        let name = self.interner.intern(name);
        self.new_local(func, VarKind::Local, name, ty, is_address_taken, span)
    }

    /// Next parameter of `func`. The first reference to it spills the
    /// incoming value to a stack slot on entry, after which the parameter
    /// is addressable like any local.
    pub fn parameter_variable(
        &mut self,
        func: FuncId,
        name: &str,
        ty: TypeId,
        is_address_taken: bool,
        span: Span,
    ) -> VarId {
        if func == self.error_function() || self.types.is_error(ty) {
            return self.error_variable();
        }
        let name = self.interner.intern(name);
        let var = VarId::new(next_raw(self.variables.len(), "variables"));
        let index = self.functions[func.index()].push_param(var);

        self.push_variable(Variable {
            kind: VarKind::Param(index),
            name,
            ty,
            span,
            func: Some(func),
            address_taken: is_address_taken,
            storage: Value::Param(index),
        })
    }

    /// Address of `var`'s storage, spilling a parameter on first use.
    pub(crate) fn variable_address(&mut self, var: VarId) -> Value {
        let data = &self.variables[var.index()];
        let (VarKind::Param(index), Value::Param(_), Some(func)) =
            (data.kind, data.storage, data.func)
        else {
            return data.storage;
        };
        let (ty, name) = (data.ty, data.name);
        let ptr_ty = self.types.pointer_type(ty);
        let insts = &mut self.insts;
        let slot = self.functions[func.index()].spill_slot_for(index, || {
            insts.create(InstKind::Alloca { allocated: ty, name }, ptr_ty)
        });
        self.variables[var.index()].storage = Value::Inst(slot);
        Value::Inst(slot)
    }

    /// Unnamed local, optionally initialized. Returns the variable and the
    /// statement performing the initialization (`EmptyStmt` without one).
    ///
    /// With a `block`, the variable's lifetime is recorded as starting
    /// there.
    pub fn temporary_variable(
        &mut self,
        func: FuncId,
        block: Option<NodeId>,
        ty: TypeId,
        init: Option<NodeId>,
        is_address_taken: bool,
        span: Span,
    ) -> (VarId, NodeId) {
        if func == self.error_function()
            || self.types.is_error(ty)
            || init.is_some_and(|e| self.is_error_expr(e))
        {
            return (self.error_variable(), self.error_statement());
        }
        let var = self.new_local(func, VarKind::Temporary, Name::EMPTY, ty, is_address_taken, span);
        if let Some(block) = block {
            self.functions[func.index()].add_block_var(block, var);
        }
        let stmt = match init {
            Some(init) => self.init_statement(func, var, init),
            None => self.arena.mk_empty_stmt(span),
        };
        (var, stmt)
    }
}
