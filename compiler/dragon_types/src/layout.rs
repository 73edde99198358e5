//! Size, alignment and field-offset queries.
//!
//! All answers are in bytes and follow natural C layout: each field sits at
//! the next offset aligned for it, and a struct's size is rounded up to its
//! alignment. Queries are pure functions of the handle's structure.

use crate::{PlaceholderShape, TypeCache, TypeData, TypeId};

/// Target parameters that layout depends on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TargetLayout {
    pub pointer_size: u64,
    pub pointer_align: u64,
    /// Alignment cap for wide integers.
    pub max_int_align: u64,
}

impl Default for TargetLayout {
    /// A 64-bit target.
    fn default() -> Self {
        TargetLayout {
            pointer_size: 8,
            pointer_align: 8,
            max_int_align: 16,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TypeLayout {
    pub(crate) size: u64,
    pub(crate) align: u64,
}

impl TypeLayout {
    const fn new(size: u64, align: u64) -> Self {
        TypeLayout { size, align }
    }
}

fn align_to(offset: u64, align: u64) -> u64 {
    offset.div_ceil(align) * align
}

impl TypeCache {
    /// Layout of `ty`, or `None` when it has no layout yet (an unresolved
    /// aggregate placeholder, or the opaque marker type).
    pub(crate) fn try_layout(&self, ty: TypeId) -> Option<TypeLayout> {
        let target = self.layout;
        let layout = match self.data(ty) {
            TypeData::Void => TypeLayout::new(0, 1),
            TypeData::Bool | TypeData::Error => TypeLayout::new(1, 1),
            TypeData::Int { bits, .. } => {
                let bytes = u64::from(bits.div_ceil(8)).next_power_of_two();
                TypeLayout::new(bytes, bytes.min(target.max_int_align))
            }
            TypeData::Float { bits } => {
                let bytes = u64::from(*bits / 8);
                TypeLayout::new(bytes, bytes)
            }
            TypeData::Complex { bits } => {
                let bytes = u64::from(*bits / 8);
                TypeLayout::new(bytes, bytes / 2)
            }
            TypeData::Pointer(_) | TypeData::Function { .. } => {
                TypeLayout::new(target.pointer_size, target.pointer_align)
            }
            TypeData::Placeholder { shape, .. } => match shape {
                PlaceholderShape::Pointer | PlaceholderShape::Function => {
                    TypeLayout::new(target.pointer_size, target.pointer_align)
                }
                PlaceholderShape::Struct | PlaceholderShape::Array => return None,
            },
            TypeData::Opaque => return None,
            TypeData::Named { underlying, .. } => return self.try_layout(*underlying),
            TypeData::Array { elem, len } => {
                let elem = self.try_layout(*elem)?;
                let size = elem
                    .size
                    .checked_mul(*len)
                    .unwrap_or_else(|| panic!("array type {ty:?} overflows u64 bytes"));
                TypeLayout::new(size, elem.align)
            }
            TypeData::Struct(fields) => {
                let mut offset = 0;
                let mut align = 1;
                for &field in fields.iter() {
                    let field = self.try_layout(field)?;
                    offset = align_to(offset, field.align) + field.size;
                    align = align.max(field.align);
                }
                TypeLayout::new(align_to(offset, align), align)
            }
        };
        Some(layout)
    }

    fn layout_of(&self, ty: TypeId) -> TypeLayout {
        match self.try_layout(ty) {
            Some(layout) => layout,
            None => panic!("layout query on {ty:?}, which has no layout (unresolved or opaque)"),
        }
    }

    /// Size of `ty` in bytes. The error type has size 1.
    pub fn type_size(&self, ty: TypeId) -> u64 {
        self.layout_of(ty).size
    }

    /// Alignment of `ty` in bytes. The error type has alignment 1.
    pub fn type_alignment(&self, ty: TypeId) -> u64 {
        self.layout_of(ty).align
    }

    /// Alignment of `ty` when used as a struct field.
    pub fn type_field_alignment(&self, ty: TypeId) -> u64 {
        self.type_alignment(ty)
    }

    /// Byte offset of field `index` within struct `ty`. The error type
    /// answers 0 for every index.
    ///
    /// # Panics
    /// Panics if `ty` is not a struct or `index` is out of range.
    pub fn type_field_offset(&self, ty: TypeId, index: usize) -> u64 {
        if self.is_error(ty) {
            return 0;
        }
        let Some(fields) = self.struct_fields(ty) else {
            panic!("field offset query on non-struct {ty:?}");
        };
        assert!(
            index < fields.len(),
            "field index {index} out of range for {ty:?} with {} fields",
            fields.len()
        );
        let mut offset = 0;
        for (i, &field) in fields.iter().enumerate() {
            let field = self.layout_of(field);
            offset = align_to(offset, field.align);
            if i == index {
                break;
            }
            offset += field.size;
        }
        offset
    }
}
