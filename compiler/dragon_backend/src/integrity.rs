//! Single-parent check over a node tree.
//!
//! Every node except the root must have exactly one parent, and every
//! instruction must be owned by exactly one expression. Sharing breaks
//! both lowering (instructions would be emitted twice) and destruction
//! (a shared subtree would be freed through two owners).

use std::fmt;

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use crate::arena::NodeArena;
use crate::llir::InstId;
use crate::node::NodeId;

/// One sharing violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// An instruction attached to more than one expression.
    SharedInstruction {
        inst: InstId,
        first: NodeId,
        second: NodeId,
    },
    /// An expression reachable through more than one child list.
    SharedExpression { node: NodeId, parent: NodeId },
    /// A statement reachable through more than one child list.
    SharedStatement { node: NodeId, parent: NodeId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SharedInstruction {
                inst,
                first,
                second,
            } => write!(
                f,
                "instruction has multiple parents: inst {} owned by node {} and node {}",
                inst.raw(),
                first.raw(),
                second.raw()
            ),
            Violation::SharedExpression { node, parent } => write!(
                f,
                "expression has multiple parents: node {} reached again from node {}",
                node.raw(),
                parent.raw()
            ),
            Violation::SharedStatement { node, parent } => write!(
                f,
                "statement has multiple parents: node {} reached again from node {}",
                node.raw(),
                parent.raw()
            ),
        }
    }
}

/// Result of [`check_tree_integrity`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    violations: Vec<Violation>,
}

impl IntegrityReport {
    /// Whether the tree passed.
    #[inline]
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }

    #[inline]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Diagnostic text, one violation per line. Empty when the tree passed.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for violation in &self.violations {
            writeln!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Check that no node or instruction under `root` is shared.
///
/// The sentinels are exempt: they stand in for any number of erroneous
/// subtrees. A shared node is reported once per extra parent and not
/// descended into again.
pub fn check_tree_integrity(arena: &NodeArena, root: NodeId) -> IntegrityReport {
    let mut violations = Vec::new();
    let mut seen: FxHashSet<NodeId> = FxHashSet::default();
    let mut owners: FxHashMap<InstId, NodeId> = FxHashMap::default();

    seen.insert(root);
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = arena.get(id);
        for &inst in node.insts() {
            if let Some(&first) = owners.get(&inst) {
                violations.push(Violation::SharedInstruction {
                    inst,
                    first,
                    second: id,
                });
            } else {
                owners.insert(inst, id);
            }
        }
        for &kid in node.kids().iter().rev() {
            if arena.is_sentinel(kid) {
                continue;
            }
            if seen.insert(kid) {
                stack.push(kid);
            } else if arena.get(kid).is_stmt() {
                violations.push(Violation::SharedStatement {
                    node: kid,
                    parent: id,
                });
            } else {
                violations.push(Violation::SharedExpression {
                    node: kid,
                    parent: id,
                });
            }
        }
    }

    tracing::trace!(
        root = root.raw(),
        nodes = seen.len(),
        violations = violations.len(),
        "tree integrity checked"
    );
    IntegrityReport { violations }
}

#[cfg(test)]
mod tests {
    use dragon_ir::{Operator, Span};
    use dragon_types::TypeId;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::llir::{Constant, InstKind, InstStore, Value};

    fn int(arena: &mut NodeArena, value: i128) -> NodeId {
        arena.mk_const(
            TypeId::I64,
            Constant::Int {
                ty: TypeId::I64,
                value,
            },
            Span::DUMMY,
        )
    }

    #[test]
    fn clean_tree_passes() {
        let mut arena = NodeArena::new();
        let a = int(&mut arena, 1);
        let s = arena.mk_expr_stmt(&[a], Span::DUMMY);
        let e = arena.mk_expr_stmt(&[NodeArena::ERROR_EXPR], Span::DUMMY);
        let block = arena.mk_block_stmt(&[s, e, NodeArena::ERROR_STMT], Span::DUMMY);
        let report = check_tree_integrity(&arena, block);
        assert!(report.ok());
        assert_eq!(report.text(), "");
    }

    #[test]
    fn shared_instruction_is_reported() {
        let mut arena = NodeArena::new();
        let mut insts = InstStore::new();
        let a = int(&mut arena, 2);
        let b = int(&mut arena, 3);
        let sum = arena.mk_binary_op(Operator::Plus, TypeId::I64, &[a, b], Span::DUMMY);
        let inst = insts.create(
            InstKind::Binary {
                op: Operator::Plus,
                lhs: Value::Const(Constant::Bool(true)),
                rhs: Value::Const(Constant::Bool(true)),
            },
            TypeId::I64,
        );
        arena.append_instruction(sum, inst);
        let c = int(&mut arena, 4);
        arena.append_instruction(c, inst);
        let s1 = arena.mk_expr_stmt(&[sum], Span::DUMMY);
        let s2 = arena.mk_expr_stmt(&[c], Span::DUMMY);
        let block = arena.mk_block_stmt(&[s1, s2], Span::DUMMY);

        let report = check_tree_integrity(&arena, block);
        assert!(!report.ok());
        assert_eq!(report.violations().len(), 1);
        assert!(report.text().contains("instruction has multiple parents"));
    }

    #[test]
    fn shared_nodes_are_classified() {
        let mut arena = NodeArena::new();
        let a = int(&mut arena, 2);
        let s1 = arena.mk_expr_stmt(&[a], Span::DUMMY);
        let s2 = arena.mk_expr_stmt(&[a], Span::DUMMY);
        let block = arena.mk_block_stmt(&[s1, s2, s1], Span::DUMMY);

        let report = check_tree_integrity(&arena, block);
        assert_eq!(
            report.violations(),
            &[
                Violation::SharedStatement {
                    node: s1,
                    parent: block,
                },
                Violation::SharedExpression {
                    node: a,
                    parent: s1,
                },
            ]
        );
    }
}
