//! Type category flags.
//!
//! The backend dispatches on type categories constantly (integer vs float
//! arithmetic, signed vs unsigned compares, scalar vs aggregate loads).
//! `TypeFlags` packs those answers into one value. Named types report the
//! flags of their underlying type plus [`TypeFlags::IS_NAMED`].

use bitflags::bitflags;

bitflags! {
    /// Category properties of a type.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u16 {
        const IS_VOID = 1 << 0;
        const IS_BOOL = 1 << 1;
        const IS_INTEGER = 1 << 2;
        /// Set together with `IS_INTEGER` for signed integers.
        const IS_SIGNED = 1 << 3;
        const IS_FLOAT = 1 << 4;
        const IS_COMPLEX = 1 << 5;
        const IS_POINTER = 1 << 6;
        const IS_STRUCT = 1 << 7;
        const IS_ARRAY = 1 << 8;
        const IS_FUNCTION = 1 << 9;
        const IS_NAMED = 1 << 10;
        /// An unresolved placeholder.
        const IS_PENDING = 1 << 11;
        const IS_ERROR = 1 << 12;

        /// Fits in a register: bool, integer, float, pointer.
        const SCALAR = Self::IS_BOOL.bits()
            | Self::IS_INTEGER.bits()
            | Self::IS_FLOAT.bits()
            | Self::IS_POINTER.bits();
        /// Built from several fields or elements.
        const AGGREGATE = Self::IS_STRUCT.bits()
            | Self::IS_ARRAY.bits()
            | Self::IS_COMPLEX.bits();
    }
}

impl TypeFlags {
    #[inline]
    pub fn is_scalar(self) -> bool {
        self.intersects(Self::SCALAR)
    }

    #[inline]
    pub fn is_aggregate(self) -> bool {
        self.intersects(Self::AGGREGATE)
    }

    #[inline]
    pub fn is_unsigned_integer(self) -> bool {
        self.contains(Self::IS_INTEGER) && !self.contains(Self::IS_SIGNED)
    }
}
