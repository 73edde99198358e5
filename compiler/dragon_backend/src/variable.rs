//! Variables and global storage.

use bitflags::bitflags;
use dragon_ir::{Name, Span};
use dragon_types::TypeId;

use crate::llir::{Constant, FuncId, Value};

/// Variable ID within a compilation unit. ID 0 is the error variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Role of a variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    Global,
    Local,
    /// Function parameter at the given position.
    Param(u32),
    /// Backend- or front-end-introduced temporary.
    Temporary,
    /// The error variable sentinel.
    Error,
}

/// A named storage location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub kind: VarKind,
    pub name: Name,
    pub ty: TypeId,
    pub span: Span,
    /// Owning function, for everything but globals and the sentinel.
    pub func: Option<FuncId>,
    /// Whether the address escapes; such variables must stay in memory.
    pub address_taken: bool,
    /// Address of the storage: an `Alloca` result or a global. A parameter
    /// holds its incoming `Value::Param` until first referenced.
    pub storage: Value,
}

impl Variable {
    pub(crate) fn error() -> Self {
        Variable {
            kind: VarKind::Error,
            name: Name::EMPTY,
            ty: TypeId::ERROR,
            span: Span::DUMMY,
            func: None,
            address_taken: false,
            storage: Value::Const(Constant::Void),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind == VarKind::Error
    }
}

bitflags! {
    /// Linkage attributes of a global variable.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct GlobalFlags: u8 {
        /// Defined in another compilation unit.
        const EXTERNAL = 1 << 0;
        /// Not exported from the linked object.
        const HIDDEN = 1 << 1;
        /// May be merged with identical definitions from other units.
        const COMMON = 1 << 2;
        /// Read-only data.
        const CONSTANT = 1 << 3;
        const UNIQUE_SECTION = 1 << 4;
    }
}

/// Constant initializer of a global.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GlobalInit {
    Scalar(Constant),
    /// Members of a struct, array or complex value, in order.
    Aggregate(Vec<GlobalInit>),
}

/// Definition data of a global variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalData {
    pub var: VarId,
    pub asm_name: Name,
    pub flags: GlobalFlags,
    pub init: Option<GlobalInit>,
}
