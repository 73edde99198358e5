//! Low-level IR: instructions, values and basic blocks.
//!
//! This is the representation handed to the emission sink. Expression nodes
//! stage instructions here while the tree is being built; lowering then
//! transplants them into [`BasicBlock`]s.
//!
//! - **[`InstStore`]**: owns every instruction of a compilation unit
//! - **[`InstKind`]**: a single instruction (load, store, arithmetic, call, ...)
//! - **[`Terminator`]**: block exit (jump, branch, return, unreachable)
//! - **[`FunctionBody`]**: the lowered block graph of one function

use dragon_ir::{Name, Operator};
use dragon_types::TypeId;

use crate::graph;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw index.
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
    };
}

define_id!(
    /// Instruction ID within a compilation unit's [`InstStore`].
    InstId
);
define_id!(
    /// Basic block ID within a single [`FunctionBody`]. Block 0 is the entry.
    BlockId
);
define_id!(
    /// Function ID within a compilation unit. ID 0 is the error function.
    FuncId
);
define_id!(
    /// Global variable ID within a compilation unit.
    GlobalId
);

/// Convert a collection length into the next `u32` ID.
pub(crate) fn next_raw(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("too many {what}: exceeded u32::MAX"))
}

// Values

/// Compile-time constant.
///
/// Floats are stored as `f64` bits so constants stay `Eq`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    Int { ty: TypeId, value: i128 },
    Float { ty: TypeId, bits: u64 },
    Bool(bool),
    /// Null pointer of the given pointer type.
    Null(TypeId),
    /// All-zero value of the given type.
    Zero(TypeId),
    /// Interned string literal data.
    Str(Name),
    /// The value of a void expression.
    Void,
}

/// An operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Result of an instruction.
    Inst(InstId),
    Const(Constant),
    /// Address of a global variable.
    Global(GlobalId),
    /// Incoming argument, by parameter index.
    Param(u32),
    /// Address of a function.
    Func(FuncId),
}

impl Value {
    /// The instruction producing this value, if any.
    pub fn as_inst(self) -> Option<InstId> {
        match self {
            Value::Inst(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_const(self) -> Option<Constant> {
        match self {
            Value::Const(c) => Some(c),
            _ => None,
        }
    }
}

// Instructions

/// A single low-level instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstKind {
    /// Stack slot holding one value of `allocated`.
    Alloca { allocated: TypeId, name: Name },
    Load { ptr: Value },
    Store { ptr: Value, value: Value },
    /// Arithmetic, bitwise, shift or eager logical operation.
    Binary { op: Operator, lhs: Value, rhs: Value },
    /// Comparison producing a `bool`.
    Compare { op: Operator, lhs: Value, rhs: Value },
    Unary { op: Operator, operand: Value },
    /// Conversion to the instruction's result type.
    Cast { value: Value },
    /// Address of field `index` of the aggregate at `base`.
    FieldAddr { base: Value, index: u32 },
    /// Field `index` of an aggregate value.
    ExtractField { aggregate: Value, index: u32 },
    /// Element `index` of an array value.
    ExtractElem { aggregate: Value, index: Value },
    /// Address of element `index` counted from `base`.
    ElemAddr { base: Value, index: Value },
    /// Aggregate value built from its members, in order.
    Aggregate { elems: Vec<Value> },
    Call { callee: Value, args: Vec<Value> },
    /// Return from the function; becomes a block terminator when lowered.
    Ret { value: Option<Value> },
}

/// An instruction and its result type (`void` for instructions without a
/// result).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstData {
    pub kind: InstKind,
    pub ty: TypeId,
}

/// Owner of every instruction in a compilation unit.
///
/// Slots of freed instructions stay allocated so IDs are never reused.
#[derive(Debug, Default)]
pub struct InstStore {
    insts: Vec<Option<InstData>>,
    live: usize,
}

impl InstStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instruction and return its ID.
    pub fn create(&mut self, kind: InstKind, ty: TypeId) -> InstId {
        let id = InstId::new(next_raw(self.insts.len(), "instructions"));
        self.insts.push(Some(InstData { kind, ty }));
        self.live += 1;
        id
    }

    /// Get a live instruction.
    ///
    /// # Panics
    /// Panics if the instruction has been freed.
    pub fn get(&self, id: InstId) -> &InstData {
        match self.try_get(id) {
            Some(data) => data,
            None => panic!("use of freed instruction {}", id.raw()),
        }
    }

    pub fn try_get(&self, id: InstId) -> Option<&InstData> {
        self.insts.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn is_live(&self, id: InstId) -> bool {
        self.try_get(id).is_some()
    }

    /// Free an instruction. Returns `false` if it was already freed.
    pub fn free(&mut self, id: InstId) -> bool {
        let Some(slot) = self.insts.get_mut(id.index()) else {
            return false;
        };
        if slot.take().is_some() {
            self.live -= 1;
            true
        } else {
            false
        }
    }

    /// Number of instructions that have not been freed.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }
}

// Blocks

/// Block exit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Terminator {
    Jump {
        target: BlockId,
    },
    Branch {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return {
        value: Option<Value>,
    },
    Unreachable,
}

/// A basic block: straight-line instructions ending in one terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasicBlock {
    pub id: BlockId,
    /// Diagnostic name (`entry`, `then.0`, `label.2`, ...).
    pub name: String,
    pub insts: Vec<InstId>,
    pub terminator: Terminator,
}

/// Lowered body of one function.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionBody {
    pub blocks: Vec<BasicBlock>,
    pub entry: BlockId,
}

impl FunctionBody {
    #[inline]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    /// Look up a block by its diagnostic name.
    pub fn block_named(&self, name: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Distinct successors of `id`, in terminator order.
    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        let mut out: Vec<BlockId> = Vec::new();
        for succ in graph::successor_block_ids(&self.block(id).terminator) {
            if !out.contains(&succ) {
                out.push(succ);
            }
        }
        out
    }

    /// Distinct predecessors of every block, indexed by block index.
    pub fn predecessors(&self) -> Vec<Vec<BlockId>> {
        graph::compute_predecessors(self)
    }
}
