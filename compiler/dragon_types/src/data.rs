//! Structural type descriptions.

use dragon_ir::Name;

use crate::TypeId;

/// Structure of a type.
///
/// This is the interning key: two equal `TypeData` values always map to the
/// same [`TypeId`]. Placeholders are the one exception and are never looked
/// up structurally, since each one stands for a distinct pending definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Void,
    Bool,
    Int {
        bits: u16,
        signed: bool,
    },
    Float {
        bits: u16,
    },
    /// Pair of floats, each `bits / 2` wide.
    Complex {
        bits: u16,
    },
    Pointer(TypeId),
    Struct(Box<[TypeId]>),
    Array {
        elem: TypeId,
        len: u64,
    },
    Function {
        params: Box<[TypeId]>,
        result: TypeId,
    },
    /// A nominal type. Keyed by name and underlying handle.
    Named {
        name: Name,
        underlying: TypeId,
    },
    Opaque,
    /// A not-yet-defined type of a known shape.
    Placeholder {
        shape: PlaceholderShape,
        name: Name,
    },
    Error,
}

/// What kind of definition a placeholder will eventually be resolved to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderShape {
    Pointer,
    Struct,
    Array,
    Function,
}

/// A named, typed entry of a struct or a parameter list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypedField {
    pub name: Name,
    pub ty: TypeId,
}

impl TypedField {
    #[inline]
    pub const fn new(name: Name, ty: TypeId) -> Self {
        TypedField { name, ty }
    }
}

impl TypeData {
    /// The placeholder shape this structure can resolve, if any.
    ///
    /// Named types answer for their underlying type, which the caller must
    /// look up; they return `None` here.
    pub fn shape(&self) -> Option<PlaceholderShape> {
        match self {
            TypeData::Pointer(_) => Some(PlaceholderShape::Pointer),
            TypeData::Struct(_) | TypeData::Complex { .. } => Some(PlaceholderShape::Struct),
            TypeData::Array { .. } => Some(PlaceholderShape::Array),
            TypeData::Function { .. } => Some(PlaceholderShape::Function),
            TypeData::Placeholder { shape, .. } => Some(*shape),
            _ => None,
        }
    }
}
