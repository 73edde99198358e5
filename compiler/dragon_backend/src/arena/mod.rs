//! Node arena: sole owner of every node in a compilation unit.
//!
//! Nodes are archived into a growable store and referenced by [`NodeId`].
//! Slots of destroyed nodes stay allocated, so IDs are never reused and a
//! stale ID is detected instead of aliasing a newer node.

use dragon_ir::{Operator, Span};
use dragon_types::TypeId;
use smallvec::SmallVec;

use crate::function::LabelId;
use crate::llir::{next_raw, Constant, FuncId, InstId, InstStore, Value};
use crate::node::{Arity, CompositeState, Node, NodeFlags, NodeId, NodeKind, SwitchDescriptor};
use crate::stack::ensure_sufficient_stack;
use crate::variable::VarId;

/// What [`NodeArena::destroy`] frees.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DestroyMode {
    /// Node wrappers and their instructions.
    All,
    /// Node wrappers only. Used once instructions have been moved into
    /// basic blocks.
    Wrappers,
    /// Instructions only; the nodes stay, with empty instruction lists.
    Instructions,
}

/// Rejected structural edit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("node {} is not a composite", .0.raw())]
    NotComposite(NodeId),

    #[error("composite {} is finalized; its children are frozen", .0.raw())]
    Finalized(NodeId),

    #[error("node {} already has its value; its operands are fixed", .0.raw())]
    HasValue(NodeId),

    #[error("node {} has no child {index}", .node.raw())]
    NoSuchChild { node: NodeId, index: usize },

    #[error("child {index} of node {} cannot change between expression and statement", .node.raw())]
    CategoryMismatch { node: NodeId, index: usize },

    #[error("replacement type {found:?} does not match child type {expected:?}")]
    TypeMismatch { expected: TypeId, found: TypeId },
}

/// Owner of all nodes.
#[derive(Debug)]
pub struct NodeArena {
    nodes: Vec<Option<Node>>,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    /// The error expression sentinel.
    pub const ERROR_EXPR: NodeId = NodeId::new(0);
    /// The error statement sentinel.
    pub const ERROR_STMT: NodeId = NodeId::new(1);

    /// Create an arena holding only the two sentinels.
    pub fn new() -> Self {
        let mut arena = NodeArena {
            nodes: Vec::with_capacity(256),
        };
        let expr = arena.archive(Node::new(NodeKind::Error, &[], TypeId::ERROR, Span::DUMMY));
        let stmt = arena.archive(Node::new(
            NodeKind::ErrorStmt,
            &[],
            TypeId::VOID,
            Span::DUMMY,
        ));
        debug_assert_eq!((expr, stmt), (Self::ERROR_EXPR, Self::ERROR_STMT));
        arena
    }

    /// Take ownership of `node` and assign it the next ID.
    pub fn archive(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(next_raw(self.nodes.len(), "nodes"));
        self.nodes.push(Some(node));
        id
    }

    /// Whether `id` is one of the sentinels.
    #[inline]
    pub fn is_sentinel(&self, id: NodeId) -> bool {
        id == Self::ERROR_EXPR || id == Self::ERROR_STMT
    }

    /// Get a live node.
    ///
    /// # Panics
    /// Panics if the node has been destroyed.
    pub fn get(&self, id: NodeId) -> &Node {
        match self.try_get(id) {
            Some(node) => node,
            None => panic!("use of destroyed node {}", id.raw()),
        }
    }

    pub fn try_get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("use of destroyed node {}", id.raw()),
        }
    }

    #[inline]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.try_get(id).is_some()
    }

    /// Number of nodes that have not been destroyed, sentinels included.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    // Construction

    /// Validate arity and child categories, then archive.
    fn make(&mut self, kind: NodeKind, kids: &[NodeId], ty: TypeId, span: Span) -> NodeId {
        if let Arity::Fixed(n) = kind.arity() {
            assert!(
                n == kids.len(),
                "{} node requires {n} children, got {}",
                kind.flavor(),
                kids.len()
            );
        }
        self.check_kid_categories(&kind, kids);
        self.archive(Node::new(kind, kids, ty, span))
    }

    fn check_kid_categories(&self, kind: &NodeKind, kids: &[NodeId]) {
        let wants_stmt = |i: usize| -> bool {
            match kind {
                NodeKind::Compound => i == 0,
                NodeKind::IfStmt => i > 0,
                NodeKind::BlockStmt => true,
                NodeKind::SwitchStmt(desc) => i >= desc.child_count() - desc.cases().len(),
                _ => false,
            }
        };
        for (i, &kid) in kids.iter().enumerate() {
            let child = self.get(kid);
            let expected = if wants_stmt(i) { "a statement" } else { "an expression" };
            assert!(
                child.is_stmt() == wants_stmt(i),
                "child {i} of {} node must be {expected}, got {}",
                kind.flavor(),
                child.kind.flavor()
            );
        }
    }

    fn make_value(&mut self, kind: NodeKind, ty: TypeId, value: Value, flags: NodeFlags, span: Span) -> NodeId {
        let id = self.make(kind, &[], ty, span);
        let node = self.get_mut(id);
        node.value = Some(value);
        node.flags = flags;
        id
    }

    pub fn mk_const(&mut self, ty: TypeId, value: Constant, span: Span) -> NodeId {
        self.make_value(NodeKind::Const, ty, Value::Const(value), NodeFlags::CONSTANT, span)
    }

    /// Reference to a variable. The value is the variable's address.
    pub fn mk_var(&mut self, var: VarId, ty: TypeId, storage: Value, span: Span) -> NodeId {
        self.make_value(NodeKind::Var(var), ty, storage, NodeFlags::ADDRESS, span)
    }

    pub fn mk_fcn_address(&mut self, func: FuncId, ty: TypeId, span: Span) -> NodeId {
        self.make_value(NodeKind::FcnAddress(func), ty, Value::Func(func), NodeFlags::CONSTANT, span)
    }

    pub fn mk_conversion(&mut self, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::Conversion, kids, ty, span)
    }

    pub fn mk_deref(&mut self, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::Deref, kids, ty, span)
    }

    pub fn mk_address(&mut self, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::Address, kids, ty, span)
    }

    pub fn mk_unary_op(&mut self, op: Operator, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::UnaryOp(op), kids, ty, span)
    }

    pub fn mk_return(&mut self, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::Return, kids, TypeId::VOID, span)
    }

    pub fn mk_struct_field(&mut self, index: u32, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::StructField(index), kids, ty, span)
    }

    pub fn mk_binary_op(&mut self, op: Operator, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::BinaryOp(op), kids, ty, span)
    }

    pub fn mk_compound(&mut self, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::Compound, kids, ty, span)
    }

    pub fn mk_array_index(&mut self, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::ArrayIndex, kids, ty, span)
    }

    pub fn mk_assign(&mut self, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::Assign, kids, TypeId::VOID, span)
    }

    /// Composite literal in the `Building` state.
    pub fn mk_composite(&mut self, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::Composite(CompositeState::Building), kids, ty, span)
    }

    /// Call node: callee first, then arguments.
    pub fn mk_call(&mut self, ty: TypeId, kids: &[NodeId], span: Span) -> NodeId {
        assert!(!kids.is_empty(), "call node needs a callee child");
        self.make(NodeKind::Call, kids, ty, span)
    }

    pub fn mk_empty_stmt(&mut self, span: Span) -> NodeId {
        self.make(NodeKind::EmptyStmt, &[], TypeId::VOID, span)
    }

    pub fn mk_label_stmt(&mut self, func: FuncId, label: LabelId, span: Span) -> NodeId {
        self.make(NodeKind::LabelStmt(func, label), &[], TypeId::VOID, span)
    }

    pub fn mk_goto_stmt(&mut self, func: FuncId, label: LabelId, span: Span) -> NodeId {
        self.make(NodeKind::GotoStmt(func, label), &[], TypeId::VOID, span)
    }

    pub fn mk_expr_stmt(&mut self, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::ExprStmt, kids, TypeId::VOID, span)
    }

    /// If statement: condition, then-statement, else-statement.
    pub fn mk_if_stmt(&mut self, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::IfStmt, kids, TypeId::VOID, span)
    }

    pub fn mk_block_stmt(&mut self, kids: &[NodeId], span: Span) -> NodeId {
        self.make(NodeKind::BlockStmt, kids, TypeId::VOID, span)
    }

    /// Switch statement laid out as described by `desc`.
    pub fn mk_switch_stmt(&mut self, desc: SwitchDescriptor, kids: &[NodeId], span: Span) -> NodeId {
        assert_eq!(
            kids.len(),
            desc.child_count(),
            "switch node layout expects {} children, got {}",
            desc.child_count(),
            kids.len()
        );
        self.make(NodeKind::SwitchStmt(desc), kids, TypeId::VOID, span)
    }

    // Mutation

    /// Attach an instruction to an expression node.
    pub fn append_instruction(&mut self, node: NodeId, inst: InstId) {
        let node = self.get_mut(node);
        debug_assert!(node.is_expr(), "instructions belong to expressions");
        node.insts.push(inst);
    }

    /// Detach and return all instructions of `node`.
    pub fn take_instructions(&mut self, node: NodeId) -> Vec<InstId> {
        std::mem::take(&mut self.get_mut(node).insts)
    }

    pub(crate) fn set_value(&mut self, node: NodeId, value: Value) {
        self.get_mut(node).value = Some(value);
    }

    pub(crate) fn set_flags(&mut self, node: NodeId, flags: NodeFlags) {
        self.get_mut(node).flags = flags;
    }

    /// Append a statement to a block statement.
    pub fn append_child(&mut self, block: NodeId, stmt: NodeId) {
        assert!(
            self.get(stmt).is_stmt(),
            "only statements can be added to a block"
        );
        let node = self.get_mut(block);
        assert!(
            node.kind == NodeKind::BlockStmt,
            "cannot append children to a {} node",
            node.kind.flavor()
        );
        node.kids.push(stmt);
    }

    /// Replace child `index` of `node` with `new_child`.
    ///
    /// Only nodes whose value has not been computed can be edited: building
    /// composites, statements, and expressions assembled directly in the
    /// arena. An expression with a value already has instructions reading
    /// its operands. The replacement must be in the same category
    /// (expression or statement) and, for expressions, of the same type as
    /// the child it replaces. Returns the detached child, which the caller
    /// now owns.
    pub fn replace_child(
        &mut self,
        node: NodeId,
        index: usize,
        new_child: NodeId,
    ) -> Result<NodeId, EditError> {
        let parent = self.get(node);
        if parent.composite_state() == Some(CompositeState::Finalized) {
            return Err(EditError::Finalized(node));
        }
        if parent.value.is_some() {
            return Err(EditError::HasValue(node));
        }
        let Some(&old) = parent.kids.get(index) else {
            return Err(EditError::NoSuchChild { node, index });
        };
        let (old_node, new_node) = (self.get(old), self.get(new_child));
        if old_node.is_stmt() != new_node.is_stmt() {
            return Err(EditError::CategoryMismatch { node, index });
        }
        if old_node.is_expr() && old_node.ty != new_node.ty {
            return Err(EditError::TypeMismatch {
                expected: old_node.ty,
                found: new_node.ty,
            });
        }
        self.get_mut(node).kids[index] = new_child;
        Ok(old)
    }

    /// Replace child `index` of a building composite.
    pub fn update_composite_child(
        &mut self,
        node: NodeId,
        index: usize,
        new_child: NodeId,
    ) -> Result<NodeId, EditError> {
        if self.get(node).composite_state().is_none() {
            return Err(EditError::NotComposite(node));
        }
        self.replace_child(node, index, new_child)
    }

    /// Attach the resolved value of a building composite and freeze it.
    ///
    /// # Panics
    /// Panics if `node` is not a composite or is already finalized.
    pub fn finish_composite(&mut self, node: NodeId, value: Value) {
        let n = self.get_mut(node);
        match n.kind {
            NodeKind::Composite(CompositeState::Building) => {
                n.kind = NodeKind::Composite(CompositeState::Finalized);
                n.value = Some(value);
            }
            NodeKind::Composite(CompositeState::Finalized) => {
                panic!("composite {} is already finalized", node.raw())
            }
            ref other => panic!("finish_composite on a {} node", other.flavor()),
        }
    }

    /// Whether an expression has its final value. Building composites do
    /// not.
    pub fn is_finished(&self, node: NodeId) -> bool {
        let n = self.get(node);
        n.composite_state() != Some(CompositeState::Building) && n.value.is_some()
    }

    /// Detach every child of `node`. Safe to call on a childless node.
    pub fn remove_all_children(&mut self, node: NodeId) -> SmallVec<[NodeId; 3]> {
        std::mem::take(&mut self.get_mut(node).kids)
    }

    // Destruction

    /// Destroy the subtree rooted at `root`.
    ///
    /// Already-destroyed nodes and sentinels are skipped, so destroying a
    /// tree that shares a subtree, or destroying twice, is harmless.
    pub fn destroy(&mut self, root: NodeId, mode: DestroyMode, insts: &mut InstStore) {
        ensure_sufficient_stack(|| {
            if self.is_sentinel(root) || !self.is_live(root) {
                return;
            }
            if mode != DestroyMode::Wrappers {
                for inst in self.take_instructions(root) {
                    insts.free(inst);
                }
            }
            let kids = self.get(root).kids.clone();
            for kid in kids {
                self.destroy(kid, mode, insts);
            }
            if mode != DestroyMode::Instructions {
                self.nodes[root.index()] = None;
            }
        });
    }
}

#[cfg(test)]
mod tests;
