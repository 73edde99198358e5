//! Node model: the staged expression/statement tree.
//!
//! The front end builds one tree per function body, bottom-up, through the
//! [`Backend`](crate::Backend). Expression nodes carry the low-level
//! instructions that compute them; statement nodes carry structure that
//! [lowering](crate::lower) turns into basic blocks.
//!
//! Every node is owned by the [`NodeArena`](crate::NodeArena) and referred to
//! by [`NodeId`]. Tree structure is expressed only through child lists; a
//! node must never appear in two child lists at once.

use bitflags::bitflags;
use dragon_ir::{Operator, Span};
use dragon_types::TypeId;
use smallvec::SmallVec;

use crate::function::LabelId;
use crate::llir::{FuncId, InstId, Value};
use crate::variable::VarId;

/// Node ID within a [`NodeArena`](crate::NodeArena).
///
/// IDs are assigned in archive order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node ID from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Construction state of a composite literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompositeState {
    /// No value yet; children may still be replaced.
    Building,
    /// Value attached; children are frozen.
    Finalized,
}

/// Node kind and kind-specific payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    // Expressions
    /// The error expression sentinel.
    Error,
    Const,
    Var(VarId),
    FcnAddress(FuncId),
    Conversion,
    Deref,
    Address,
    UnaryOp(Operator),
    /// Return of a value out of the enclosing function; owns the `Ret`.
    Return,
    StructField(u32),
    BinaryOp(Operator),
    /// Statement evaluated for effect, then an expression for its value.
    Compound,
    ArrayIndex,
    /// Store of the right child into the address of the left child.
    Assign,
    Composite(CompositeState),
    Call,

    // Statements
    /// The error statement sentinel.
    ErrorStmt,
    EmptyStmt,
    /// Placement of a label of the given function.
    LabelStmt(FuncId, LabelId),
    GotoStmt(FuncId, LabelId),
    /// Expression evaluated for its instructions.
    ExprStmt,
    /// Condition, then-statement, else-statement (`EmptyStmt` when absent).
    IfStmt,
    /// Sequence of statements.
    BlockStmt,
    SwitchStmt(SwitchDescriptor),
}

/// Number of children a node kind takes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => n == count,
            Arity::Variadic => true,
        }
    }
}

impl NodeKind {
    pub fn arity(&self) -> Arity {
        match self {
            NodeKind::Error
            | NodeKind::Const
            | NodeKind::Var(_)
            | NodeKind::FcnAddress(_)
            | NodeKind::ErrorStmt
            | NodeKind::EmptyStmt
            | NodeKind::LabelStmt(..)
            | NodeKind::GotoStmt(..) => Arity::Fixed(0),
            NodeKind::Conversion
            | NodeKind::Deref
            | NodeKind::Address
            | NodeKind::UnaryOp(_)
            | NodeKind::Return
            | NodeKind::StructField(_)
            | NodeKind::ExprStmt => Arity::Fixed(1),
            NodeKind::BinaryOp(_) | NodeKind::Compound | NodeKind::ArrayIndex | NodeKind::Assign => {
                Arity::Fixed(2)
            }
            NodeKind::IfStmt => Arity::Fixed(3),
            NodeKind::Composite(_)
            | NodeKind::Call
            | NodeKind::BlockStmt
            | NodeKind::SwitchStmt(_) => Arity::Variadic,
        }
    }

    /// Short name used in dumps and diagnostics.
    pub fn flavor(&self) -> &'static str {
        match self {
            NodeKind::Error => "error",
            NodeKind::Const => "const",
            NodeKind::Var(_) => "var",
            NodeKind::FcnAddress(_) => "fcn",
            NodeKind::Conversion => "conv",
            NodeKind::Deref => "deref",
            NodeKind::Address => "addr",
            NodeKind::UnaryOp(_) => "unary",
            NodeKind::Return => "return",
            NodeKind::StructField(_) => "field",
            NodeKind::BinaryOp(_) => "binary",
            NodeKind::Compound => "compound",
            NodeKind::ArrayIndex => "arindex",
            NodeKind::Assign => "assign",
            NodeKind::Composite(_) => "composite",
            NodeKind::Call => "call",
            NodeKind::ErrorStmt => "errorst",
            NodeKind::EmptyStmt => "empty",
            NodeKind::LabelStmt(..) => "label",
            NodeKind::GotoStmt(..) => "goto",
            NodeKind::ExprStmt => "exprst",
            NodeKind::IfStmt => "ifstmt",
            NodeKind::BlockStmt => "block",
            NodeKind::SwitchStmt(_) => "switch",
        }
    }

    pub fn is_stmt(&self) -> bool {
        matches!(
            self,
            NodeKind::ErrorStmt
                | NodeKind::EmptyStmt
                | NodeKind::LabelStmt(..)
                | NodeKind::GotoStmt(..)
                | NodeKind::ExprStmt
                | NodeKind::IfStmt
                | NodeKind::BlockStmt
                | NodeKind::SwitchStmt(_)
        )
    }

    #[inline]
    pub fn is_expr(&self) -> bool {
        !self.is_stmt()
    }
}

// Switch descriptor

/// Child layout of one switch case.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SwitchCase {
    /// Index of the case's first value child.
    pub value_index: usize,
    /// Number of value children. Zero marks the default case.
    pub value_count: usize,
    /// Index of the case's statement child.
    pub stmt_index: usize,
}

impl SwitchCase {
    #[inline]
    pub fn is_default(&self) -> bool {
        self.value_count == 0
    }
}

/// Where each case's values and statement live among a switch node's
/// children.
///
/// Child 0 is the switch value. Case values follow, grouped by case in case
/// order, then one statement child per case.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SwitchDescriptor {
    cases: Vec<SwitchCase>,
}

impl SwitchDescriptor {
    /// Compute the layout from the number of values of each case.
    pub fn new(case_value_counts: &[usize]) -> Self {
        let total: usize = case_value_counts.iter().sum();
        let mut value_index = 1;
        let mut stmt_index = 1 + total;
        let cases = case_value_counts
            .iter()
            .map(|&value_count| {
                let case = SwitchCase {
                    value_index,
                    value_count,
                    stmt_index,
                };
                value_index += value_count;
                stmt_index += 1;
                case
            })
            .collect();
        SwitchDescriptor { cases }
    }

    #[inline]
    pub fn cases(&self) -> &[SwitchCase] {
        &self.cases
    }

    /// Number of children a switch with this layout must have.
    pub fn child_count(&self) -> usize {
        1 + self.cases.iter().map(|c| c.value_count).sum::<usize>() + self.cases.len()
    }
}

// Node

bitflags! {
    /// Per-node evaluation state.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct NodeFlags: u8 {
        /// The value is the address of an object of the node's type; a load
        /// has not been materialized.
        const ADDRESS = 1 << 0;
        /// The value is a compile-time constant.
        const CONSTANT = 1 << 1;
    }
}

/// A node of the staged tree.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) kids: SmallVec<[NodeId; 3]>,
    pub(crate) span: Span,
    /// Result type; `void` for statements.
    pub(crate) ty: TypeId,
    pub(crate) value: Option<Value>,
    /// Instructions computing this node, in execution order, emitted after
    /// those of the children.
    pub(crate) insts: Vec<InstId>,
    pub(crate) flags: NodeFlags,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, kids: &[NodeId], ty: TypeId, span: Span) -> Self {
        Node {
            kind,
            kids: SmallVec::from_slice(kids),
            span,
            ty,
            value: None,
            insts: Vec::new(),
            flags: NodeFlags::empty(),
        }
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[inline]
    pub fn kids(&self) -> &[NodeId] {
        &self.kids
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Resolved value; `None` for statements and unfinished composites.
    #[inline]
    pub fn value(&self) -> Option<Value> {
        self.value
    }

    #[inline]
    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    #[inline]
    pub fn is_address(&self) -> bool {
        self.flags.contains(NodeFlags::ADDRESS)
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.flags.contains(NodeFlags::CONSTANT)
    }

    #[inline]
    pub fn is_expr(&self) -> bool {
        self.kind.is_expr()
    }

    #[inline]
    pub fn is_stmt(&self) -> bool {
        self.kind.is_stmt()
    }

    /// Composite state, if this is a composite.
    pub fn composite_state(&self) -> Option<CompositeState> {
        match self.kind {
            NodeKind::Composite(state) => Some(state),
            _ => None,
        }
    }
}
