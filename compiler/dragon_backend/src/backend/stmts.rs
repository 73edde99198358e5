//! Statement constructors, blocks and labels.

use dragon_ir::Span;
use dragon_types::TypeId;

use super::Backend;
use crate::function::Label;
use crate::llir::{Constant, FuncId, InstKind, Value};
use crate::node::{CompositeState, NodeId, SwitchDescriptor};
use crate::variable::VarId;

impl Backend {
    #[inline]
    fn is_error_function(&self, func: FuncId) -> bool {
        func == self.error_function()
    }

    /// Statement evaluating `expr` for its effect.
    pub fn expression_statement(&mut self, func: FuncId, expr: NodeId) -> NodeId {
        if self.is_error_function(func) || self.is_error_expr(expr) {
            return self.error_statement();
        }
        let span = self.arena.get(expr).span();
        self.arena.mk_expr_stmt(&[expr], span)
    }

    /// Initialize `var` with `init`.
    ///
    /// A composite literal still under construction is stored field by field
    /// straight into the variable, without building the aggregate value.
    pub fn init_statement(&mut self, func: FuncId, var: VarId, init: NodeId) -> NodeId {
        if self.is_error_function(func)
            || self.variables[var.index()].is_error()
            || self.is_error_expr(init)
        {
            return self.error_statement();
        }
        let (ty, span) = {
            let data = &self.variables[var.index()];
            (data.ty, data.span)
        };

        if self.arena.get(init).composite_state() != Some(CompositeState::Building) {
            let lhs = self.var_expression(var, span);
            return self.assignment_statement(func, lhs, init, span);
        }

        let storage = self.variable_address(var);
        let is_array = self.types.array_element(ty).is_some();
        let kids = self.arena.get(init).kids().to_vec();
        for (index, kid) in (0u32..).zip(kids) {
            let value = self.rvalue(kid);
            let field_ty = self.arena.get(kid).ty();
            let ptr_ty = self.types.pointer_type(field_ty);
            let addr = if is_array {
                InstKind::ElemAddr {
                    base: storage,
                    index: Value::Const(Constant::Int {
                        ty: TypeId::I64,
                        value: i128::from(index),
                    }),
                }
            } else {
                InstKind::FieldAddr {
                    base: storage,
                    index,
                }
            };
            let addr = self.insts.create(addr, ptr_ty);
            let store = self.insts.create(
                InstKind::Store {
                    ptr: Value::Inst(addr),
                    value,
                },
                TypeId::VOID,
            );
            self.arena.append_instruction(init, addr);
            self.arena.append_instruction(init, store);
        }
        self.arena.finish_composite(init, Value::Const(Constant::Void));
        self.arena.mk_expr_stmt(&[init], span)
    }

    /// `lhs = rhs`.
    ///
    /// # Panics
    /// Panics if `lhs` is not addressable.
    pub fn assignment_statement(&mut self, func: FuncId, lhs: NodeId, rhs: NodeId, span: Span) -> NodeId {
        if self.is_error_function(func) || self.is_error_expr(lhs) || self.is_error_expr(rhs) {
            return self.error_statement();
        }
        let ptr = self.lvalue(lhs);
        let value = self.rvalue(rhs);
        let node = self.arena.mk_assign(&[lhs, rhs], span);
        let store = self.insts.create(InstKind::Store { ptr, value }, TypeId::VOID);
        self.arena.append_instruction(node, store);
        self.arena.mk_expr_stmt(&[node], span)
    }

    /// Return from `func`. Several values are returned as one struct of the
    /// function's result type.
    pub fn return_statement(&mut self, func: FuncId, vals: &[NodeId], span: Span) -> NodeId {
        if self.is_error_function(func) || vals.iter().any(|&v| self.is_error_expr(v)) {
            return self.error_statement();
        }
        let fntype = self.functions[func.index()].fntype();
        let Some(result) = self.types.function_result(fntype) else {
            panic!("function {} has non-function type", func.raw());
        };

        let (child, value) = match vals {
            [] => {
                let void = self.arena.mk_const(TypeId::VOID, Constant::Void, span);
                (void, None)
            }
            [single] => (*single, Some(self.rvalue(*single))),
            _ => {
                let tuple = self.arena.mk_composite(result, vals, span);
                (tuple, Some(self.rvalue(tuple)))
            }
        };
        let node = self.arena.mk_return(&[child], span);
        let ret = self.insts.create(InstKind::Ret { value }, TypeId::VOID);
        self.arena.append_instruction(node, ret);
        self.arena.mk_expr_stmt(&[node], span)
    }

    /// `if cond { then_block } else { else_block }`.
    pub fn if_statement(
        &mut self,
        func: FuncId,
        cond: NodeId,
        then_block: NodeId,
        else_block: Option<NodeId>,
        span: Span,
    ) -> NodeId {
        if self.is_error_function(func)
            || self.is_error_expr(cond)
            || self.is_error_stmt(then_block)
            || else_block.is_some_and(|e| self.is_error_stmt(e))
        {
            return self.error_statement();
        }
        self.rvalue(cond);
        let else_block = match else_block {
            Some(e) => e,
            None => self.arena.mk_empty_stmt(span),
        };
        self.arena.mk_if_stmt(&[cond, then_block, else_block], span)
    }

    /// `switch value { ... }`. `cases[i]` lists the values selecting
    /// `stmts[i]`; an empty list marks the default case. Bodies fall through
    /// to the next one.
    pub fn switch_statement(
        &mut self,
        func: FuncId,
        value: NodeId,
        cases: &[Vec<NodeId>],
        stmts: &[NodeId],
        span: Span,
    ) -> NodeId {
        assert_eq!(cases.len(), stmts.len(), "one statement per switch case");
        if self.is_error_function(func)
            || self.is_error_expr(value)
            || cases.iter().flatten().any(|&v| self.is_error_expr(v))
            || stmts.iter().any(|&s| self.is_error_stmt(s))
        {
            return self.error_statement();
        }

        self.rvalue(value);
        let counts: Vec<usize> = cases.iter().map(Vec::len).collect();
        let desc = SwitchDescriptor::new(&counts);
        let mut kids = Vec::with_capacity(desc.child_count());
        kids.push(value);
        for &case_value in cases.iter().flatten() {
            self.rvalue(case_value);
            kids.push(case_value);
        }
        kids.extend_from_slice(stmts);
        self.arena.mk_switch_stmt(desc, &kids, span)
    }

    /// `s1` followed by `s2`.
    pub fn compound_statement(&mut self, s1: NodeId, s2: NodeId) -> NodeId {
        if self.is_error_stmt(s1) || self.is_error_stmt(s2) {
            return self.error_statement();
        }
        let span = self.arena.get(s1).span();
        self.arena.mk_block_stmt(&[s1, s2], span)
    }

    pub fn statement_list(&mut self, stmts: &[NodeId]) -> NodeId {
        if stmts.iter().any(|&s| self.is_error_stmt(s)) {
            return self.error_statement();
        }
        let span = stmts
            .first()
            .map_or(Span::DUMMY, |&s| self.arena.get(s).span());
        self.arena.mk_block_stmt(stmts, span)
    }

    // Blocks

    /// New empty block of `func` in which `vars` come into scope.
    ///
    /// # Panics
    /// Panics if `enclosing` is not a block of the same function.
    pub fn block(&mut self, func: FuncId, enclosing: Option<NodeId>, vars: &[VarId], span: Span) -> NodeId {
        if self.is_error_function(func) {
            return self.error_statement();
        }
        let function = &self.functions[func.index()];
        if let Some(outer) = enclosing {
            assert!(
                function.blocks().iter().any(|(b, _)| *b == outer),
                "enclosing block {} does not belong to function {}",
                outer.raw(),
                func.raw()
            );
        }
        let node = self.arena.mk_block_stmt(&[], span);
        self.functions[func.index()].add_block(node, vars.to_vec());
        node
    }

    /// Append `stmts` to `block`. Does nothing if any input is an error.
    pub fn block_add_statements(&mut self, block: NodeId, stmts: &[NodeId]) {
        if self.is_error_stmt(block) || stmts.iter().any(|&s| self.is_error_stmt(s)) {
            return;
        }
        for &stmt in stmts {
            self.arena.append_child(block, stmt);
        }
    }

    /// A block used as a statement. Blocks are statements already.
    #[inline]
    pub fn block_statement(&self, block: NodeId) -> NodeId {
        block
    }

    // Labels

    pub fn label(&mut self, func: FuncId, span: Span) -> Label {
        self.functions[func.index()].new_label(span)
    }

    /// The statement placing `label`. Each label is defined exactly once.
    ///
    /// # Panics
    /// Panics if `label` is already defined.
    pub fn label_definition_statement(&mut self, label: Label) -> NodeId {
        if self.is_error_function(label.func) {
            return self.error_statement();
        }
        let node = self.arena.mk_label_stmt(label.func, label.id, label.span);
        self.functions[label.func.index()].define_label(label, node);
        node
    }

    /// Jump to `label`, which may be defined later.
    pub fn goto_statement(&mut self, label: Label, span: Span) -> NodeId {
        if self.is_error_function(label.func) {
            return self.error_statement();
        }
        self.arena.mk_goto_stmt(label.func, label.id, span)
    }
}
