//! End-to-end checks of the backend facade: tree integrity, variables and
//! whole-function lowering.

use dragon_backend::{
    Backend, BackendConfig, DestroyMode, FuncId, FunctionFlags, InstKind, NodeId, SplitStack,
    Terminator, Value, VarKind,
};
use dragon_ir::{Operator, Span};
use dragon_types::{TypeId, TypedField};
use pretty_assertions::assert_eq;

/// Function taking an `i32` and returning an `i64`.
fn mk_func_i32_o64(be: &mut Backend, name: &str) -> FuncId {
    let param = TypedField::new(be.intern("param1"), TypeId::I32);
    let result = TypedField::new(be.intern("result"), TypeId::I64);
    let fnty = be.function_type(None, &[param], &[result], TypeId::ERROR);
    be.function(fnty, name, "", FunctionFlags::VISIBLE, SplitStack::Yes, Span::DUMMY)
}

fn mk_block_from_stmt(be: &mut Backend, func: FuncId, stmt: NodeId) -> NodeId {
    let block = be.block(func, None, &[], Span::DUMMY);
    be.block_add_statements(block, &[stmt]);
    block
}

fn three_field_struct(be: &mut Backend) -> TypeId {
    let a = TypedField::new(be.intern("a"), TypeId::BOOL);
    let b = TypedField::new(be.intern("b"), TypeId::I64);
    let c = TypedField::new(be.intern("c"), TypeId::F32);
    be.struct_type(&[a, b, c])
}

fn int64(be: &mut Backend, value: i128) -> NodeId {
    be.integer_constant_expression(TypeId::I64, value)
}

#[test]
fn shared_instruction_is_reported() {
    let mut be = Backend::new(BackendConfig::default());
    be.disable_integrity_checks();
    let func = mk_func_i32_o64(&mut be, "foo");

    // 2 + 3
    let l = int64(&mut be, 2);
    let r = int64(&mut be, 3);
    let add = be.binary_expression(Operator::Plus, l, r, Span::DUMMY);
    let es = be.expression_statement(func, add);
    let block = mk_block_from_stmt(&mut be, func, es);

    // 4
    let four = int64(&mut be, 4);
    let es2 = be.expression_statement(func, four);
    be.block_add_statements(block, &[es2]);

    let shared = be.arena().get(add).insts().to_vec();
    for &inst in &shared {
        be.arena_mut().append_instruction(four, inst);
    }

    let report = be.check_tree_integrity(block);
    assert!(!report.ok());
    assert!(report.text().contains("instruction has multiple parents"));

    be.arena_mut().take_instructions(four);
    assert!(be.check_tree_integrity(block).ok());
    assert!(be.function_set_body(func, block));
}

#[test]
fn shared_expression_is_reported() {
    let mut be = Backend::new(BackendConfig::default());
    be.disable_integrity_checks();
    let func = mk_func_i32_o64(&mut be, "foo");
    let loc1 = be.local_variable(func, "loc1", TypeId::I64, true, Span::DUMMY);

    let ve = be.var_expression(loc1, Span::DUMMY);
    let es1 = be.expression_statement(func, ve);
    let block = mk_block_from_stmt(&mut be, func, es1);
    let es2 = be.expression_statement(func, ve);
    be.block_add_statements(block, &[es2]);

    let report = be.check_tree_integrity(block);
    assert!(!report.ok());
    assert!(report.text().contains("expression has multiple parents"));

    be.destroy(block, DestroyMode::All);
    assert!(!be.arena().is_live(ve));

    let ve3 = be.var_expression(loc1, Span::DUMMY);
    let es3 = be.expression_statement(func, ve3);
    let block2 = mk_block_from_stmt(&mut be, func, es3);
    assert!(be.function_set_body(func, block2));
}

#[test]
fn shared_statement_is_reported() {
    let mut be = Backend::new(BackendConfig::default());
    be.disable_integrity_checks();
    let func = mk_func_i32_o64(&mut be, "foo");

    let two = int64(&mut be, 2);
    let es = be.expression_statement(func, two);
    let block = mk_block_from_stmt(&mut be, func, es);
    be.block_add_statements(block, &[es]);

    let report = be.check_tree_integrity(block);
    assert!(!report.ok());
    assert!(report.text().contains("statement has multiple parents"));

    let detached = be.arena_mut().remove_all_children(block);
    assert_eq!(detached.as_slice(), &[es, es]);
    be.destroy(block, DestroyMode::All);
    be.destroy(es, DestroyMode::All);

    let three = int64(&mut be, 3);
    let es2 = be.expression_statement(func, three);
    let block2 = mk_block_from_stmt(&mut be, func, es2);
    assert!(be.function_set_body(func, block2));
}

#[test]
fn local_variables() {
    let mut be = Backend::default();
    let func1 = mk_func_i32_o64(&mut be, "foo");
    let func2 = mk_func_i32_o64(&mut be, "bar");
    let bst = three_field_struct(&mut be);

    let loc1 = be.local_variable(func1, "loc1", TypeId::I64, true, Span::DUMMY);
    let loc2 = be.local_variable(func1, "loc2", bst, false, Span::DUMMY);
    let loc3 = be.local_variable(func2, "loc3", bst, false, Span::DUMMY);
    for var in [loc1, loc2, loc3] {
        assert_ne!(var, be.error_variable());
        assert_eq!(be.variable_data(var).kind, VarKind::Local);
    }

    let slot = |var| match be.variable_data(var).storage {
        Value::Inst(inst) => inst,
        other => panic!("local stored in {other:?}"),
    };
    assert!(matches!(
        be.insts().get(slot(loc1)).kind,
        InstKind::Alloca { allocated: TypeId::I64, .. }
    ));
    assert!(matches!(
        be.insts().get(slot(loc2)).kind,
        InstKind::Alloca { allocated, .. } if allocated == bst
    ));
    assert_ne!(slot(loc1), slot(loc2));
    assert!(be.function_data(func1).has_pending_slots());

    let err_ty = be.error_type();
    assert_eq!(
        be.local_variable(func1, "", err_ty, true, Span::DUMMY),
        be.error_variable()
    );
}

#[test]
fn parameter_variables() {
    let mut be = Backend::default();
    let func = mk_func_i32_o64(&mut be, "foo");
    let u32_ty = be.integer_type(true, 32);

    let p1 = be.parameter_variable(func, "p1", u32_ty, false, Span::DUMMY);
    let p2 = be.parameter_variable(func, "p2", u32_ty, false, Span::DUMMY);
    assert_ne!(p1, p2);
    assert_ne!(p1, be.error_variable());
    assert_eq!(be.variable_data(p1).kind, VarKind::Param(0));
    assert_eq!(be.variable_data(p2).kind, VarKind::Param(1));
    assert_eq!(be.function_data(func).params(), &[p1, p2]);

    // Slots appear on first reference, and only once.
    assert_eq!(be.function_data(func).spill_slot(0), None);
    assert_eq!(be.variable_data(p2).storage, Value::Param(1));
    be.var_expression(p2, Span::DUMMY);
    be.var_expression(p1, Span::DUMMY);
    be.var_expression(p2, Span::DUMMY);
    for (index, var) in [(0, p1), (1, p2)] {
        let Some(slot) = be.function_data(func).spill_slot(index) else {
            panic!("parameter {index} has no spill slot");
        };
        assert_eq!(be.variable_data(var).storage, Value::Inst(slot));
    }

    let func2 = mk_func_i32_o64(&mut be, "bar");
    let err_ty = be.error_type();
    assert_eq!(
        be.parameter_variable(func2, "p3", err_ty, false, Span::DUMMY),
        be.error_variable()
    );
}

#[test]
fn global_variables() {
    let mut be = Backend::default();
    let i32_ty = be.integer_type(false, 32);

    let g1 = be.global_variable("varname", "asmname", i32_ty, false, false, false, Span::DUMMY);
    let Value::Global(global) = be.variable_data(g1).storage else {
        panic!("global not stored in a global");
    };
    let data = be.global_data(global);
    assert_eq!(data.var, g1);
    assert_eq!(be.interner().lookup(data.asm_name), "asmname");

    let err_ty = be.error_type();
    assert_eq!(
        be.global_variable("", "", err_ty, false, false, false, Span::DUMMY),
        be.error_variable()
    );
}

#[test]
fn immutable_structs() {
    let mut be = Backend::default();
    let i32_ty = be.integer_type(false, 32);
    let x = TypedField::new(be.intern("x"), i32_ty);
    let y = TypedField::new(be.intern("y"), i32_ty);
    let bst = be.struct_type(&[x, y]);

    for hidden in [true, false] {
        for common in [true, false] {
            if hidden && common {
                continue;
            }
            let ims = be.immutable_struct("name", "asmname", hidden, common, bst, Span::DUMMY);
            assert_ne!(ims, be.error_variable());
            assert!(matches!(be.variable_data(ims).storage, Value::Global(_)));
        }
    }

    let err_ty = be.error_type();
    assert_eq!(
        be.immutable_struct("", "", false, false, err_ty, Span::DUMMY),
        be.error_variable()
    );
}

#[test]
fn if_else_with_returns() {
    // fn foo(param1 i32) i64 { if param1 < 10 { return 1 } else { return 2 } }
    let mut be = Backend::default();
    let func = mk_func_i32_o64(&mut be, "foo");
    let p = be.parameter_variable(func, "param1", TypeId::I32, false, Span::DUMMY);

    let pv = be.var_expression(p, Span::DUMMY);
    let ten = be.integer_constant_expression(TypeId::I32, 10);
    let cond = be.binary_expression(Operator::Lt, pv, ten, Span::DUMMY);
    let one = int64(&mut be, 1);
    let ret1 = be.return_statement(func, &[one], Span::DUMMY);
    let then_block = mk_block_from_stmt(&mut be, func, ret1);
    let two = int64(&mut be, 2);
    let ret2 = be.return_statement(func, &[two], Span::DUMMY);
    let else_block = mk_block_from_stmt(&mut be, func, ret2);
    let ifst = be.if_statement(func, cond, then_block, Some(else_block), Span::DUMMY);
    let body = mk_block_from_stmt(&mut be, func, ifst);
    assert!(be.function_set_body(func, body));

    let Some(lowered) = be.function_data(func).body() else {
        panic!("no body after lowering");
    };
    let entry = lowered.block(lowered.entry);
    assert!(matches!(entry.terminator, Terminator::Branch { .. }));
    for name in ["then.0", "else.0"] {
        let Some(block) = lowered.block_named(name) else {
            panic!("missing block {name}");
        };
        assert!(matches!(block.terminator, Terminator::Return { value: Some(_) }));
    }
    // Both arms return; only the dead blocks after the returns reach the
    // join point.
    let Some(join) = lowered.block_named("fallthrough.0") else {
        panic!("missing fallthrough block");
    };
    let preds = lowered.predecessors();
    assert_eq!(preds[join.id.index()].len(), 2);
    for &pred in &preds[join.id.index()] {
        assert!(lowered.block(pred).name.starts_with("orphan."));
        assert!(preds[pred.index()].is_empty());
    }
    assert_eq!(join.terminator, Terminator::Unreachable);
}

#[test]
fn composite_two_phase_through_arena() {
    let mut be = Backend::default();
    let bst = three_field_struct(&mut be);
    let t = be.boolean_constant_expression(true);
    let n = int64(&mut be, 5);
    let f = be.float_constant_expression(TypeId::F32, 1.0);
    let lit = be.constructor_expression(bst, &[t, n, f], Span::DUMMY);

    let n2 = int64(&mut be, 6);
    let old = be.arena_mut().update_composite_child(lit, 1, n2);
    assert_eq!(old, Ok(n));

    let func = mk_func_i32_o64(&mut be, "foo");
    let v = be.local_variable(func, "v", bst, false, Span::DUMMY);
    let init = be.init_statement(func, v, lit);
    assert!(be.arena().is_finished(lit));
    assert!(be.arena_mut().update_composite_child(lit, 1, n).is_err());
    assert!(be.arena().get(init).is_stmt());
}
