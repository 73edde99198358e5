//! Expression constructors.
//!
//! Each constructor computes its operands' values (appending loads to the
//! operands where needed), builds the node, and attaches the instructions
//! computing the node's own value. Nothing is folded: `2 + 3` is a `Binary`
//! instruction over two constants.

use dragon_ir::{Operator, OperatorClass, Span};
use dragon_types::{TypeData, TypeId};

use super::Backend;
use crate::llir::{Constant, FuncId, InstKind, Value};
use crate::node::{NodeFlags, NodeId};
use crate::variable::{VarId, VarKind};

/// Whether `value` is representable in an integer of the given shape.
fn int_fits(value: i128, bits: u16, signed: bool) -> bool {
    if signed {
        if bits >= 128 {
            return true;
        }
        let half = 1i128 << (bits - 1);
        (-half..half).contains(&value)
    } else {
        value >= 0 && (bits >= 127 || value < (1i128 << bits))
    }
}

impl Backend {
    /// Create an instruction, attach it to `node`, and make it the node's
    /// value.
    fn attach(&mut self, node: NodeId, kind: InstKind, ty: TypeId) -> Value {
        let inst = self.insts.create(kind, ty);
        self.arena.append_instruction(node, inst);
        let value = Value::Inst(inst);
        self.arena.set_value(node, value);
        value
    }

    #[inline]
    fn expr_ty(&self, expr: NodeId) -> TypeId {
        self.arena.get(expr).ty()
    }

    // Constants

    pub fn zero_expression(&mut self, ty: TypeId) -> NodeId {
        if self.types.is_error(ty) {
            return self.error_expression();
        }
        self.arena.mk_const(ty, Constant::Zero(ty), Span::DUMMY)
    }

    pub fn nil_pointer_expression(&mut self) -> NodeId {
        let ty = self.types.pointer_type(TypeId::VOID);
        self.arena.mk_const(ty, Constant::Null(ty), Span::DUMMY)
    }

    /// Integer constant of type `ty`.
    ///
    /// # Panics
    /// Panics if `ty` is not an integer type or `value` does not fit it.
    pub fn integer_constant_expression(&mut self, ty: TypeId, value: i128) -> NodeId {
        if self.types.is_error(ty) {
            return self.error_expression();
        }
        let Some((bits, signed)) = self.int_info(ty) else {
            panic!("integer constant of non-integer type {}", self.type_name(ty));
        };
        assert!(
            int_fits(value, bits, signed),
            "constant {value} does not fit {}",
            self.type_name(ty)
        );
        self.arena
            .mk_const(ty, Constant::Int { ty, value }, Span::DUMMY)
    }

    /// Float constant of type `ty`, rounded to the type's precision.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "rounding to f32 is the point for 32-bit float constants"
    )]
    pub fn float_constant_expression(&mut self, ty: TypeId, value: f64) -> NodeId {
        if self.types.is_error(ty) {
            return self.error_expression();
        }
        let value = match *self.types.data(self.types.underlying(ty)) {
            TypeData::Float { bits: 32 } => f64::from(value as f32),
            TypeData::Float { .. } => value,
            _ => panic!("float constant of non-float type {}", self.type_name(ty)),
        };
        self.arena.mk_const(
            ty,
            Constant::Float {
                ty,
                bits: value.to_bits(),
            },
            Span::DUMMY,
        )
    }

    /// Complex constant: a composite of two float constants.
    pub fn complex_constant_expression(&mut self, ty: TypeId, real: f64, imag: f64) -> NodeId {
        if self.types.is_error(ty) {
            return self.error_expression();
        }
        let component = self.types.complex_component_type(ty);
        let re = self.float_constant_expression(component, real);
        let im = self.float_constant_expression(component, imag);
        self.arena.mk_composite(ty, &[re, im], Span::DUMMY)
    }

    pub fn boolean_constant_expression(&mut self, value: bool) -> NodeId {
        self.arena
            .mk_const(TypeId::BOOL, Constant::Bool(value), Span::DUMMY)
    }

    /// Pointer to the bytes of a string literal.
    pub fn string_constant_expression(&mut self, value: &str) -> NodeId {
        let data = self.interner.intern(value);
        let ty = self.types.pointer_type(TypeId::U8);
        self.arena.mk_const(ty, Constant::Str(data), Span::DUMMY)
    }

    // References

    /// Reference to a variable. The result is addressable; a load is added
    /// only when the value is used.
    pub fn var_expression(&mut self, var: VarId, span: Span) -> NodeId {
        if self.variables[var.index()].is_error() {
            return self.error_expression();
        }
        let ty = self.variables[var.index()].ty;
        let storage = self.variable_address(var);
        self.arena.mk_var(var, ty, storage, span)
    }

    /// `*ptr`, as an addressable expression of type `ty`.
    pub fn indirect_expression(&mut self, ty: TypeId, ptr: NodeId, span: Span) -> NodeId {
        if self.types.is_error(ty) || self.is_error_expr(ptr) {
            return self.error_expression();
        }
        let addr = self.rvalue(ptr);
        let node = self.arena.mk_deref(ty, &[ptr], span);
        self.arena.set_value(node, addr);
        self.arena.set_flags(node, NodeFlags::ADDRESS);
        node
    }

    /// `&expr`.
    ///
    /// # Panics
    /// Panics if `expr` is not addressable.
    pub fn address_expression(&mut self, expr: NodeId, span: Span) -> NodeId {
        if self.is_error_expr(expr) {
            return self.error_expression();
        }
        let addr = self.lvalue(expr);
        let ty = self.types.pointer_type(self.expr_ty(expr));
        let node = self.arena.mk_address(ty, &[expr], span);
        self.arena.set_value(node, addr);
        node
    }

    pub fn function_code_expression(&mut self, func: FuncId, span: Span) -> NodeId {
        if func == self.error_function() {
            return self.error_expression();
        }
        let fntype = self.functions[func.index()].fntype();
        let ty = self.types.pointer_type(fntype);
        self.arena.mk_fcn_address(func, ty, span)
    }

    // Conversions and operators

    /// `expr` converted to `ty`. Returns `expr` itself when the types agree.
    pub fn convert_expression(&mut self, ty: TypeId, expr: NodeId, span: Span) -> NodeId {
        if self.types.is_error(ty) || self.is_error_expr(expr) {
            return self.error_expression();
        }
        if self.types.same_type(ty, self.expr_ty(expr)) {
            return expr;
        }
        let value = self.rvalue(expr);
        let node = self.arena.mk_conversion(ty, &[expr], span);
        self.attach(node, InstKind::Cast { value }, ty);
        node
    }

    /// Unary `-`, `!` or `^` (bitwise complement).
    pub fn unary_expression(&mut self, op: Operator, expr: NodeId, span: Span) -> NodeId {
        if self.is_error_expr(expr) {
            return self.error_expression();
        }
        assert!(op.is_unary(), "{op} is not a unary operator");
        let operand = self.rvalue(expr);
        let ty = self.expr_ty(expr);
        let node = self.arena.mk_unary_op(op, ty, &[expr], span);
        self.attach(node, InstKind::Unary { op, operand }, ty);
        node
    }

    /// `lhs op rhs`. Comparisons produce `bool`; `&&` and `||` evaluate both
    /// operands.
    pub fn binary_expression(&mut self, op: Operator, lhs: NodeId, rhs: NodeId, span: Span) -> NodeId {
        if self.is_error_expr(lhs) || self.is_error_expr(rhs) {
            return self.error_expression();
        }
        assert!(op.is_binary(), "{op} is not a binary operator");
        let lhs_ty = self.expr_ty(lhs);
        let rhs_ty = self.expr_ty(rhs);
        assert!(
            op.class() == OperatorClass::Shift || self.types.same_type(lhs_ty, rhs_ty),
            "operands of {op} have different types: {} and {}",
            self.type_name(lhs_ty),
            self.type_name(rhs_ty)
        );

        let l = self.rvalue(lhs);
        let r = self.rvalue(rhs);
        let (kind, ty) = if op.class() == OperatorClass::Comparison {
            (InstKind::Compare { op, lhs: l, rhs: r }, TypeId::BOOL)
        } else {
            (InstKind::Binary { op, lhs: l, rhs: r }, lhs_ty)
        };
        let node = self.arena.mk_binary_op(op, ty, &[lhs, rhs], span);
        self.attach(node, kind, ty);
        node
    }

    // Aggregates

    /// Field `index` of a struct. Addressable when the struct is.
    pub fn struct_field_expression(&mut self, expr: NodeId, index: u32, span: Span) -> NodeId {
        if self.is_error_expr(expr) {
            return self.error_expression();
        }
        let ty = self.expr_ty(expr);
        let field_ty = match self.types.struct_fields(ty) {
            Some(fields) => match fields.get(index as usize) {
                Some(&field) => field,
                None => panic!("field {index} out of range for {}", self.type_name(ty)),
            },
            None => panic!("field access on non-struct {}", self.type_name(ty)),
        };
        self.field_access(expr, index, field_ty, span)
    }

    pub fn real_part_expression(&mut self, expr: NodeId, span: Span) -> NodeId {
        self.complex_part(expr, 0, span)
    }

    pub fn imag_part_expression(&mut self, expr: NodeId, span: Span) -> NodeId {
        self.complex_part(expr, 1, span)
    }

    fn complex_part(&mut self, expr: NodeId, index: u32, span: Span) -> NodeId {
        if self.is_error_expr(expr) {
            return self.error_expression();
        }
        let component = self.types.complex_component_type(self.expr_ty(expr));
        self.field_access(expr, index, component, span)
    }

    fn field_access(&mut self, expr: NodeId, index: u32, field_ty: TypeId, span: Span) -> NodeId {
        if self.arena.get(expr).is_address() {
            let base = self.lvalue(expr);
            let ptr_ty = self.types.pointer_type(field_ty);
            let node = self.arena.mk_struct_field(index, field_ty, &[expr], span);
            self.attach(node, InstKind::FieldAddr { base, index }, ptr_ty);
            self.arena.set_flags(node, NodeFlags::ADDRESS);
            node
        } else {
            let aggregate = self.rvalue(expr);
            let node = self.arena.mk_struct_field(index, field_ty, &[expr], span);
            self.attach(node, InstKind::ExtractField { aggregate, index }, field_ty);
            node
        }
    }

    /// Complex value from its two parts.
    pub fn complex_expression(&mut self, real: NodeId, imag: NodeId, span: Span) -> NodeId {
        if self.is_error_expr(real) || self.is_error_expr(imag) {
            return self.error_expression();
        }
        let bits = match *self.types.data(self.types.underlying(self.expr_ty(real))) {
            TypeData::Float { bits } => bits,
            _ => panic!("complex part of non-float type {}", self.type_name(self.expr_ty(real))),
        };
        let ty = self.types.complex_type(bits * 2);
        self.arena.mk_composite(ty, &[real, imag], span)
    }

    /// `array[index]`. Addressable when the array is.
    pub fn array_index_expression(&mut self, array: NodeId, index: NodeId, span: Span) -> NodeId {
        if self.is_error_expr(array) || self.is_error_expr(index) {
            return self.error_expression();
        }
        let ty = self.expr_ty(array);
        let Some(elem) = self.types.array_element(ty) else {
            panic!("index into non-array {}", self.type_name(ty));
        };
        let idx = self.rvalue(index);
        if self.arena.get(array).is_address() {
            let base = self.lvalue(array);
            let ptr_ty = self.types.pointer_type(elem);
            let node = self.arena.mk_array_index(elem, &[array, index], span);
            self.attach(node, InstKind::ElemAddr { base, index: idx }, ptr_ty);
            self.arena.set_flags(node, NodeFlags::ADDRESS);
            node
        } else {
            let aggregate = self.rvalue(array);
            let node = self.arena.mk_array_index(elem, &[array, index], span);
            self.attach(
                node,
                InstKind::ExtractElem {
                    aggregate,
                    index: idx,
                },
                elem,
            );
            node
        }
    }

    /// `base + index` in units of the pointee.
    pub fn pointer_offset_expression(&mut self, base: NodeId, index: NodeId, span: Span) -> NodeId {
        if self.is_error_expr(base) || self.is_error_expr(index) {
            return self.error_expression();
        }
        let ty = self.expr_ty(base);
        let b = self.rvalue(base);
        let i = self.rvalue(index);
        let node = self.arena.mk_array_index(ty, &[base, index], span);
        self.attach(node, InstKind::ElemAddr { base: b, index: i }, ty);
        node
    }

    /// Struct (or complex) literal. Stays a building composite until its
    /// value is needed, so an initializer can store the fields directly.
    ///
    /// # Panics
    /// Panics if a struct literal has the wrong number of values.
    pub fn constructor_expression(&mut self, ty: TypeId, vals: &[NodeId], span: Span) -> NodeId {
        if self.types.is_error(ty) || vals.iter().any(|&v| self.is_error_expr(v)) {
            return self.error_expression();
        }
        if let Some(fields) = self.types.struct_fields(ty) {
            assert_eq!(
                fields.len(),
                vals.len(),
                "struct literal of {} needs {} values",
                self.type_name(ty),
                fields.len()
            );
        }
        self.arena.mk_composite(ty, vals, span)
    }

    /// Array literal. `indexes[i]` is the position of `vals[i]`; positions
    /// not mentioned are zero.
    pub fn array_constructor_expression(
        &mut self,
        ty: TypeId,
        indexes: &[u64],
        vals: &[NodeId],
        span: Span,
    ) -> NodeId {
        if self.types.is_error(ty) || vals.iter().any(|&v| self.is_error_expr(v)) {
            return self.error_expression();
        }
        assert_eq!(indexes.len(), vals.len(), "one index per array literal value");
        let (elem, len) = match *self.types.data(self.types.underlying(ty)) {
            TypeData::Array { elem, len } => (elem, len),
            _ => panic!("array literal of non-array {}", self.type_name(ty)),
        };
        let Ok(len) = usize::try_from(len) else {
            panic!("array literal of {len} elements");
        };

        let mut slots: Vec<Option<NodeId>> = vec![None; len];
        for (&index, &val) in indexes.iter().zip(vals) {
            let slot = usize::try_from(index)
                .ok()
                .and_then(|i| slots.get_mut(i));
            let Some(slot) = slot else {
                panic!("array literal index {index} out of range for length {len}");
            };
            assert!(slot.is_none(), "array literal index {index} given twice");
            *slot = Some(val);
        }
        let kids: Vec<NodeId> = slots
            .into_iter()
            .map(|slot| match slot {
                Some(val) => val,
                None => self.zero_expression(elem),
            })
            .collect();
        self.arena.mk_composite(ty, &kids, span)
    }

    // Control

    /// Evaluate `stmt`, then `expr`. Takes the value of `expr`.
    pub fn compound_expression(&mut self, stmt: NodeId, expr: NodeId, span: Span) -> NodeId {
        if self.is_error_stmt(stmt) || self.is_error_expr(expr) {
            return self.error_expression();
        }
        let inner = self.arena.get(expr);
        let (ty, value, flags) = (inner.ty(), inner.value(), inner.flags());
        let value = match value {
            Some(value) => value,
            None => self.rvalue(expr),
        };
        let node = self.arena.mk_compound(ty, &[stmt, expr], span);
        self.arena.set_value(node, value);
        self.arena.set_flags(node, flags);
        node
    }

    /// `cond ? then_expr : else_expr`.
    ///
    /// A non-void conditional stores either arm into a fresh temporary and
    /// yields the temporary. A void one needs no else arm.
    pub fn conditional_expression(
        &mut self,
        func: FuncId,
        ty: TypeId,
        cond: NodeId,
        then_expr: NodeId,
        else_expr: Option<NodeId>,
        span: Span,
    ) -> NodeId {
        if func == self.error_function()
            || self.types.is_error(ty)
            || self.is_error_expr(cond)
            || self.is_error_expr(then_expr)
            || else_expr.is_some_and(|e| self.is_error_expr(e))
        {
            return self.error_expression();
        }

        if ty == TypeId::VOID {
            let then_stmt = self.expression_statement(func, then_expr);
            let else_stmt = match else_expr {
                Some(e) => self.expression_statement(func, e),
                None => self.arena.mk_empty_stmt(span),
            };
            let if_stmt = self.if_statement(func, cond, then_stmt, Some(else_stmt), span);
            let void = self.arena.mk_const(TypeId::VOID, Constant::Void, span);
            return self.compound_expression(if_stmt, void, span);
        }

        let Some(else_expr) = else_expr else {
            panic!("conditional of type {} needs an else arm", self.type_name(ty));
        };
        let name = self.interner.intern("cond.tmp");
        let temp = self.new_local(func, VarKind::Temporary, name, ty, false, span);
        let then_lhs = self.var_expression(temp, span);
        let then_stmt = self.assignment_statement(func, then_lhs, then_expr, span);
        let else_lhs = self.var_expression(temp, span);
        let else_stmt = self.assignment_statement(func, else_lhs, else_expr, span);
        let if_stmt = self.if_statement(func, cond, then_stmt, Some(else_stmt), span);
        let result = self.var_expression(temp, span);
        self.compound_expression(if_stmt, result, span)
    }

    /// Call of the function `callee` points to (or names).
    pub fn call_expression(&mut self, callee: NodeId, args: &[NodeId], span: Span) -> NodeId {
        if self.is_error_expr(callee) || args.iter().any(|&a| self.is_error_expr(a)) {
            return self.error_expression();
        }
        let callee_ty = self.expr_ty(callee);
        let fntype = self.types.pointee(callee_ty).unwrap_or(callee_ty);
        let Some(result) = self.types.function_result(fntype) else {
            panic!("call of non-function {}", self.type_name(callee_ty));
        };

        let callee_value = self.rvalue(callee);
        let arg_values: Vec<Value> = args.iter().map(|&a| self.rvalue(a)).collect();
        let mut kids = Vec::with_capacity(args.len() + 1);
        kids.push(callee);
        kids.extend_from_slice(args);
        let node = self.arena.mk_call(result, &kids, span);
        self.attach(
            node,
            InstKind::Call {
                callee: callee_value,
                args: arg_values,
            },
            result,
        );
        node
    }
}
