//! Type handle.

use std::fmt;

/// Canonical handle for an interned type.
///
/// Handles are indices into a [`TypeCache`](crate::TypeCache) and are only
/// meaningful for the cache that produced them. The low indices are fixed
/// for the primitives pre-interned by every cache.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const I8: TypeId = TypeId(2);
    pub const I16: TypeId = TypeId(3);
    pub const I32: TypeId = TypeId(4);
    pub const I64: TypeId = TypeId(5);
    pub const U8: TypeId = TypeId(6);
    pub const U16: TypeId = TypeId(7);
    pub const U32: TypeId = TypeId(8);
    pub const U64: TypeId = TypeId(9);
    pub const F32: TypeId = TypeId(10);
    pub const F64: TypeId = TypeId(11);
    /// Body-less marker type; only ever used behind a pointer.
    pub const OPAQUE: TypeId = TypeId(12);
    /// The error sentinel.
    pub const ERROR: TypeId = TypeId(13);

    /// Number of handles reserved for pre-interned primitives.
    pub const PRIMITIVE_COUNT: u32 = 14;

    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
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

    /// Whether this is the error sentinel.
    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TypeId::VOID => f.write_str("TypeId(void)"),
            TypeId::BOOL => f.write_str("TypeId(bool)"),
            TypeId::ERROR => f.write_str("TypeId(error)"),
            _ => write!(f, "TypeId({})", self.0),
        }
    }
}
