use dragon_ir::{Operator, Span};
use dragon_types::TypeId;
use pretty_assertions::assert_eq;

use super::*;
use crate::llir::InstKind;

fn int(arena: &mut NodeArena, value: i128) -> NodeId {
    arena.mk_const(
        TypeId::I32,
        Constant::Int {
            ty: TypeId::I32,
            value,
        },
        Span::DUMMY,
    )
}

#[test]
fn sentinels_are_preallocated() {
    let arena = NodeArena::new();
    assert_eq!(arena.live_count(), 2);
    assert_eq!(arena.get(NodeArena::ERROR_EXPR).kind(), &NodeKind::Error);
    assert_eq!(arena.get(NodeArena::ERROR_EXPR).ty(), TypeId::ERROR);
    assert_eq!(arena.get(NodeArena::ERROR_STMT).kind(), &NodeKind::ErrorStmt);
}

#[test]
fn ids_are_assigned_in_archive_order() {
    let mut arena = NodeArena::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    assert_eq!(a, NodeId::new(2));
    assert_eq!(b, NodeId::new(3));
    assert!(arena.get(a).is_constant());
}

#[test]
#[should_panic(expected = "binary node requires 2 children, got 1")]
fn arity_is_checked() {
    let mut arena = NodeArena::new();
    let a = int(&mut arena, 1);
    arena.mk_binary_op(Operator::Plus, TypeId::I32, &[a], Span::DUMMY);
}

#[test]
#[should_panic(expected = "ifstmt node requires 3 children, got 2")]
fn if_statement_arity_is_checked() {
    let mut arena = NodeArena::new();
    let cond = arena.mk_const(TypeId::BOOL, Constant::Bool(true), Span::DUMMY);
    let then_stmt = arena.mk_empty_stmt(Span::DUMMY);
    arena.mk_if_stmt(&[cond, then_stmt], Span::DUMMY);
}

#[test]
#[should_panic(expected = "exprst node requires 1 children, got 0")]
fn expression_statement_needs_its_expression() {
    let mut arena = NodeArena::new();
    arena.mk_expr_stmt(&[], Span::DUMMY);
}

#[test]
#[should_panic(expected = "child 0 of deref node must be an expression, got exprst")]
fn statement_child_of_expression_is_rejected() {
    let mut arena = NodeArena::new();
    let a = int(&mut arena, 1);
    let stmt = arena.mk_expr_stmt(&[a], Span::DUMMY);
    arena.mk_deref(TypeId::I32, &[stmt], Span::DUMMY);
}

#[test]
#[should_panic(expected = "switch node layout expects 4 children, got 3")]
fn switch_layout_is_checked() {
    let mut arena = NodeArena::new();
    let v = int(&mut arena, 0);
    let c = int(&mut arena, 1);
    let s = arena.mk_empty_stmt(Span::DUMMY);
    arena.mk_switch_stmt(SwitchDescriptor::new(&[1, 0]), &[v, c, s], Span::DUMMY);
}

#[test]
fn append_child_extends_blocks() {
    let mut arena = NodeArena::new();
    let block = arena.mk_block_stmt(&[], Span::DUMMY);
    let s = arena.mk_empty_stmt(Span::DUMMY);
    arena.append_child(block, s);
    assert_eq!(arena.get(block).kids(), &[s]);
}

#[test]
fn destroy_all_frees_nodes_and_instructions() {
    let mut arena = NodeArena::new();
    let mut insts = InstStore::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    let sum = arena.mk_binary_op(Operator::Plus, TypeId::I32, &[a, b], Span::DUMMY);
    let inst = insts.create(
        InstKind::Binary {
            op: Operator::Plus,
            lhs: Value::Const(Constant::Bool(true)),
            rhs: Value::Const(Constant::Bool(true)),
        },
        TypeId::I32,
    );
    arena.append_instruction(sum, inst);

    arena.destroy(sum, DestroyMode::All, &mut insts);
    assert!(!arena.is_live(sum));
    assert!(!arena.is_live(a));
    assert!(!insts.is_live(inst));
    assert_eq!(arena.live_count(), 2);

    // Second destroy is a no-op.
    arena.destroy(sum, DestroyMode::All, &mut insts);
    assert_eq!(arena.live_count(), 2);
}

#[test]
fn destroy_modes_split_ownership() {
    let mut arena = NodeArena::new();
    let mut insts = InstStore::new();
    let a = int(&mut arena, 1);
    let neg = arena.mk_unary_op(Operator::Minus, TypeId::I32, &[a], Span::DUMMY);
    let inst = insts.create(
        InstKind::Unary {
            op: Operator::Minus,
            operand: Value::Const(Constant::Bool(false)),
        },
        TypeId::I32,
    );
    arena.append_instruction(neg, inst);

    arena.destroy(neg, DestroyMode::Instructions, &mut insts);
    assert!(arena.is_live(neg));
    assert!(arena.get(neg).insts().is_empty());
    assert!(!insts.is_live(inst));

    let kept = insts.create(
        InstKind::Unary {
            op: Operator::Minus,
            operand: Value::Const(Constant::Bool(false)),
        },
        TypeId::I32,
    );
    arena.append_instruction(neg, kept);
    arena.destroy(neg, DestroyMode::Wrappers, &mut insts);
    assert!(!arena.is_live(neg));
    assert!(insts.is_live(kept));
}

#[test]
fn sentinels_survive_destroy() {
    let mut arena = NodeArena::new();
    let mut insts = InstStore::new();
    let stmt = arena.mk_expr_stmt(&[NodeArena::ERROR_EXPR], Span::DUMMY);
    arena.destroy(stmt, DestroyMode::All, &mut insts);
    arena.destroy(NodeArena::ERROR_STMT, DestroyMode::All, &mut insts);
    assert!(arena.is_live(NodeArena::ERROR_EXPR));
    assert!(arena.is_live(NodeArena::ERROR_STMT));
}

#[test]
fn composite_two_phase() {
    let mut arena = NodeArena::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    let comp = arena.mk_composite(TypeId::I32, &[a], Span::DUMMY);
    assert!(!arena.is_finished(comp));

    assert_eq!(arena.update_composite_child(comp, 0, b), Ok(a));
    assert_eq!(arena.get(comp).kids(), &[b]);

    let flag = arena.mk_const(TypeId::BOOL, Constant::Bool(true), Span::DUMMY);
    assert_eq!(
        arena.update_composite_child(comp, 0, flag),
        Err(EditError::TypeMismatch {
            expected: TypeId::I32,
            found: TypeId::BOOL,
        })
    );
    assert_eq!(
        arena.update_composite_child(comp, 3, a),
        Err(EditError::NoSuchChild {
            node: comp,
            index: 3,
        })
    );

    arena.finish_composite(comp, Value::Const(Constant::Zero(TypeId::I32)));
    assert!(arena.is_finished(comp));
    assert_eq!(
        arena.update_composite_child(comp, 0, a),
        Err(EditError::Finalized(comp))
    );
    assert_eq!(
        arena.update_composite_child(a, 0, b),
        Err(EditError::NotComposite(a))
    );
}

#[test]
fn replace_child_keeps_categories() {
    let mut arena = NodeArena::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    let stmt = arena.mk_expr_stmt(&[a], Span::DUMMY);
    let block = arena.mk_block_stmt(&[stmt], Span::DUMMY);

    assert_eq!(arena.replace_child(stmt, 0, b), Ok(a));
    assert_eq!(arena.get(stmt).kids(), &[b]);
    assert_eq!(
        arena.replace_child(block, 0, a),
        Err(EditError::CategoryMismatch {
            node: block,
            index: 0,
        })
    );
}

#[test]
fn replace_child_requires_matching_type() {
    let mut arena = NodeArena::new();
    let one = arena.mk_const(
        TypeId::I64,
        Constant::Int {
            ty: TypeId::I64,
            value: 1,
        },
        Span::DUMMY,
    );
    let comp = arena.mk_composite(TypeId::I64, &[one], Span::DUMMY);
    let flag = arena.mk_const(TypeId::BOOL, Constant::Bool(false), Span::DUMMY);
    assert_eq!(
        arena.replace_child(comp, 0, flag),
        Err(EditError::TypeMismatch {
            expected: TypeId::I64,
            found: TypeId::BOOL,
        })
    );
    assert_eq!(arena.get(comp).kids(), &[one]);
}

#[test]
fn replace_child_rejects_valued_expressions() {
    let mut arena = NodeArena::new();
    let mut insts = InstStore::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    let c = int(&mut arena, 3);
    let sum = arena.mk_binary_op(Operator::Plus, TypeId::I32, &[a, b], Span::DUMMY);
    let add = insts.create(
        InstKind::Binary {
            op: Operator::Plus,
            lhs: Value::Const(Constant::Int {
                ty: TypeId::I32,
                value: 1,
            }),
            rhs: Value::Const(Constant::Int {
                ty: TypeId::I32,
                value: 2,
            }),
        },
        TypeId::I32,
    );
    arena.append_instruction(sum, add);
    arena.set_value(sum, Value::Inst(add));

    assert_eq!(arena.replace_child(sum, 0, c), Err(EditError::HasValue(sum)));
    assert_eq!(arena.get(sum).kids(), &[a, b]);
}

#[test]
#[should_panic(expected = "already finalized")]
fn composite_cannot_finish_twice() {
    let mut arena = NodeArena::new();
    let comp = arena.mk_composite(TypeId::I32, &[], Span::DUMMY);
    arena.finish_composite(comp, Value::Const(Constant::Zero(TypeId::I32)));
    arena.finish_composite(comp, Value::Const(Constant::Zero(TypeId::I32)));
}

#[test]
fn remove_all_children_detaches() {
    let mut arena = NodeArena::new();
    let a = int(&mut arena, 1);
    let stmt = arena.mk_expr_stmt(&[a], Span::DUMMY);
    let kids = arena.remove_all_children(stmt);
    assert_eq!(kids.as_slice(), &[a]);
    assert!(arena.get(stmt).kids().is_empty());
    assert!(arena.remove_all_children(stmt).is_empty());
}
