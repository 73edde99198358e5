//! Interning table and placeholder bookkeeping.

use dragon_ir::Name;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    PlaceholderError, PlaceholderShape, Resolution, TargetLayout, TypeData, TypeFlags, TypeId,
};

/// Per-compilation-unit type cache.
///
/// Owns every type handle for the lifetime of the unit. Handles are never
/// freed individually.
pub struct TypeCache {
    /// Type structure, indexed by `TypeId::index`.
    types: Vec<TypeData>,
    /// Deduplication map for non-placeholder types.
    map: FxHashMap<TypeData, TypeId>,
    /// Placeholders created but not yet resolved.
    pending: FxHashSet<TypeId>,
    /// Placeholders that have been resolved.
    resolved: FxHashSet<TypeId>,
    /// Names given to placeholders, kept after resolution for display.
    placeholder_names: FxHashMap<TypeId, Name>,
    pub(crate) layout: TargetLayout,
}

impl Default for TypeCache {
    fn default() -> Self {
        Self::new(TargetLayout::default())
    }
}

impl TypeCache {
    /// Create a cache with all primitives pre-interned at their fixed handles.
    pub fn new(layout: TargetLayout) -> Self {
        let mut cache = TypeCache {
            types: Vec::with_capacity(256),
            map: FxHashMap::default(),
            pending: FxHashSet::default(),
            resolved: FxHashSet::default(),
            placeholder_names: FxHashMap::default(),
            layout,
        };

        let primitives = [
            TypeData::Void,                            // TypeId::VOID
            TypeData::Bool,                            // TypeId::BOOL
            TypeData::Int { bits: 8, signed: true },   // TypeId::I8
            TypeData::Int { bits: 16, signed: true },  // TypeId::I16
            TypeData::Int { bits: 32, signed: true },  // TypeId::I32
            TypeData::Int { bits: 64, signed: true },  // TypeId::I64
            TypeData::Int { bits: 8, signed: false },  // TypeId::U8
            TypeData::Int { bits: 16, signed: false }, // TypeId::U16
            TypeData::Int { bits: 32, signed: false }, // TypeId::U32
            TypeData::Int { bits: 64, signed: false }, // TypeId::U64
            TypeData::Float { bits: 32 },              // TypeId::F32
            TypeData::Float { bits: 64 },              // TypeId::F64
            TypeData::Opaque,                          // TypeId::OPAQUE
            TypeData::Error,                           // TypeId::ERROR
        ];
        for data in primitives {
            cache.insert(data);
        }
        debug_assert_eq!(cache.types.len(), TypeId::PRIMITIVE_COUNT as usize);
        cache
    }

    /// Target layout parameters used by size and alignment queries.
    #[inline]
    pub fn target_layout(&self) -> TargetLayout {
        self.layout
    }

    /// Number of handles in the cache.
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// The cache always holds the pre-interned primitives.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn next_id(&self) -> TypeId {
        let raw = u32::try_from(self.types.len())
            .unwrap_or_else(|_| panic!("type cache exceeded u32::MAX handles"));
        TypeId::from_raw(raw)
    }

    fn insert(&mut self, data: TypeData) -> TypeId {
        let id = self.next_id();
        self.map.insert(data.clone(), id);
        self.types.push(data);
        id
    }

    /// Intern an anonymous structural type.
    ///
    /// Idempotent: structurally equal inputs always return the same handle.
    /// Structures with an error component collapse to [`TypeId::ERROR`].
    ///
    /// # Panics
    /// Panics when handed a placeholder; use the `placeholder_*` constructors.
    pub fn intern(&mut self, data: TypeData) -> TypeId {
        assert!(
            !matches!(data, TypeData::Placeholder { .. }),
            "placeholders are not interned structurally"
        );
        if self.has_error_component(&data) {
            return TypeId::ERROR;
        }
        if let Some(&id) = self.map.get(&data) {
            return id;
        }
        self.insert(data)
    }

    /// Structure of a handle.
    #[inline]
    pub fn data(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    /// Whether `id` denotes the error type: the sentinel itself, or a
    /// placeholder that was resolved with an error.
    #[inline]
    pub fn is_error(&self, id: TypeId) -> bool {
        id.is_error() || matches!(self.data(id), TypeData::Error)
    }

    fn has_error_component(&self, data: &TypeData) -> bool {
        match data {
            TypeData::Error => true,
            TypeData::Pointer(t)
            | TypeData::Array { elem: t, .. }
            | TypeData::Named { underlying: t, .. } => self.is_error(*t),
            TypeData::Struct(fields) => fields.iter().any(|&t| self.is_error(t)),
            TypeData::Function { params, result } => {
                self.is_error(*result) || params.iter().any(|&t| self.is_error(t))
            }
            TypeData::Void
            | TypeData::Bool
            | TypeData::Int { .. }
            | TypeData::Float { .. }
            | TypeData::Complex { .. }
            | TypeData::Opaque
            | TypeData::Placeholder { .. } => false,
        }
    }

    /// Follow named types down to the first non-named structure.
    pub fn underlying(&self, mut id: TypeId) -> TypeId {
        while let TypeData::Named { underlying, .. } = self.data(id) {
            id = *underlying;
        }
        id
    }

    /// Category flags of a handle, looking through named types.
    pub fn flags(&self, id: TypeId) -> TypeFlags {
        let mut flags = TypeFlags::empty();
        if matches!(self.data(id), TypeData::Named { .. }) {
            flags |= TypeFlags::IS_NAMED;
        }
        flags
            | match self.data(self.underlying(id)) {
                TypeData::Void => TypeFlags::IS_VOID,
                TypeData::Bool => TypeFlags::IS_BOOL,
                TypeData::Int { signed: true, .. } => TypeFlags::IS_INTEGER | TypeFlags::IS_SIGNED,
                TypeData::Int { signed: false, .. } => TypeFlags::IS_INTEGER,
                TypeData::Float { .. } => TypeFlags::IS_FLOAT,
                TypeData::Complex { .. } => TypeFlags::IS_COMPLEX,
                TypeData::Pointer(_) => TypeFlags::IS_POINTER,
                TypeData::Struct(_) => TypeFlags::IS_STRUCT,
                TypeData::Array { .. } => TypeFlags::IS_ARRAY,
                TypeData::Function { .. } => TypeFlags::IS_FUNCTION,
                TypeData::Placeholder { .. } => TypeFlags::IS_PENDING,
                TypeData::Error => TypeFlags::IS_ERROR,
                TypeData::Opaque | TypeData::Named { .. } => TypeFlags::empty(),
            }
    }

    /// Whether two handles denote the same structure.
    ///
    /// Equal handles always do. A resolved placeholder shares its structure
    /// with the type it was resolved from while keeping its own handle.
    pub fn same_type(&self, a: TypeId, b: TypeId) -> bool {
        a == b || (!self.is_pending(a) && !self.is_pending(b) && self.data(a) == self.data(b))
    }

    /// Pointee of a pointer type, looking through named types.
    pub fn pointee(&self, ptr: TypeId) -> Option<TypeId> {
        match self.data(self.underlying(ptr)) {
            TypeData::Pointer(to) => Some(*to),
            _ => None,
        }
    }

    /// Field types of a struct type, looking through named types.
    pub fn struct_fields(&self, id: TypeId) -> Option<&[TypeId]> {
        match self.data(self.underlying(id)) {
            TypeData::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Element type of an array type, looking through named types.
    pub fn array_element(&self, id: TypeId) -> Option<TypeId> {
        match self.data(self.underlying(id)) {
            TypeData::Array { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    /// Result type of a function type, looking through named types.
    pub fn function_result(&self, id: TypeId) -> Option<TypeId> {
        match self.data(self.underlying(id)) {
            TypeData::Function { result, .. } => Some(*result),
            _ => None,
        }
    }

    // Placeholders

    /// Create a pending placeholder of the given shape.
    pub fn make_placeholder(&mut self, shape: PlaceholderShape, name: Name) -> TypeId {
        let id = self.next_id();
        self.types.push(TypeData::Placeholder { shape, name });
        self.pending.insert(id);
        self.placeholder_names.insert(id, name);
        tracing::trace!(id = id.raw(), ?shape, "created placeholder type");
        id
    }

    /// Whether `id` is a placeholder that has not been resolved yet.
    #[inline]
    pub fn is_pending(&self, id: TypeId) -> bool {
        self.pending.contains(&id)
    }

    /// Whether `id` was created as a placeholder, resolved or not.
    #[inline]
    pub fn is_placeholder(&self, id: TypeId) -> bool {
        self.pending.contains(&id) || self.resolved.contains(&id)
    }

    /// Number of placeholders still waiting for a definition.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Name the placeholder was created with.
    pub fn placeholder_name(&self, id: TypeId) -> Option<Name> {
        self.placeholder_names.get(&id).copied()
    }

    /// Give a pending placeholder its real structure, taken from `real`.
    ///
    /// Resolving a handle that was never a placeholder is tolerated when the
    /// structures already agree, so front ends may resolve concrete types
    /// without tracking which ones they created as placeholders.
    pub fn resolve_placeholder(
        &mut self,
        placeholder: TypeId,
        real: TypeId,
    ) -> Result<Resolution, PlaceholderError> {
        if self.is_error(placeholder) || self.is_error(real) {
            if self.pending.remove(&placeholder) {
                self.types[placeholder.index()] = TypeData::Error;
                self.resolved.insert(placeholder);
            }
            return Ok(Resolution::ErrorType);
        }

        if self.resolved.contains(&placeholder) {
            return Err(PlaceholderError::AlreadyResolved(placeholder));
        }

        if !self.pending.contains(&placeholder) {
            return if self.same_type(placeholder, real) {
                Ok(Resolution::AlreadyConcrete)
            } else {
                Err(PlaceholderError::StructureMismatch {
                    handle: placeholder,
                    target: real,
                })
            };
        }

        if self.is_pending(real) {
            return Err(PlaceholderError::TargetPending {
                placeholder,
                target: real,
            });
        }

        let TypeData::Placeholder { shape: expected, .. } = *self.data(placeholder) else {
            unreachable!("pending handle without placeholder data");
        };
        if self.data(self.underlying(real)).shape() != Some(expected) {
            return Err(PlaceholderError::ShapeMismatch {
                placeholder,
                expected,
            });
        }
        if self.contains_by_value(real, placeholder) {
            return Err(PlaceholderError::InfiniteSize { placeholder });
        }

        let data = self.data(real).clone();
        self.types[placeholder.index()] = data;
        self.pending.remove(&placeholder);
        self.resolved.insert(placeholder);
        tracing::debug!(
            placeholder = placeholder.raw(),
            real = real.raw(),
            "resolved placeholder type"
        );
        Ok(Resolution::Resolved)
    }

    /// Whether `needle` is stored inline (not behind a pointer) in `ty`.
    fn contains_by_value(&self, ty: TypeId, needle: TypeId) -> bool {
        if ty == needle {
            return true;
        }
        match self.data(ty) {
            TypeData::Struct(fields) => fields.iter().any(|&f| self.contains_by_value(f, needle)),
            TypeData::Array { elem, .. } => self.contains_by_value(*elem, needle),
            TypeData::Named { underlying, .. } => self.contains_by_value(*underlying, needle),
            _ => false,
        }
    }
}
