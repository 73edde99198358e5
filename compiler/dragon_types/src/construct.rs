//! Type constructors.
//!
//! Thin wrappers over [`TypeCache::intern`] that speak the front end's
//! vocabulary. Every constructor short-circuits to [`TypeId::ERROR`] when
//! any input is the error type, including a placeholder resolved with an
//! error.

use dragon_ir::Name;

use crate::{
    PlaceholderError, PlaceholderShape, Resolution, TypeCache, TypeData, TypeId, TypedField,
};

impl TypeCache {
    #[inline]
    pub fn void_type(&self) -> TypeId {
        TypeId::VOID
    }

    #[inline]
    pub fn bool_type(&self) -> TypeId {
        TypeId::BOOL
    }

    #[inline]
    pub fn error_type(&self) -> TypeId {
        TypeId::ERROR
    }

    /// Integer type of the given width and signedness.
    ///
    /// # Panics
    /// Panics if `bits` is zero or wider than 128.
    pub fn integer_type(&mut self, is_unsigned: bool, bits: u16) -> TypeId {
        assert!(
            (1..=128).contains(&bits),
            "unsupported integer width: {bits}"
        );
        self.intern(TypeData::Int {
            bits,
            signed: !is_unsigned,
        })
    }

    /// Floating-point type; only 32 and 64 bits are supported.
    pub fn float_type(&self, bits: u16) -> TypeId {
        match bits {
            32 => TypeId::F32,
            64 => TypeId::F64,
            _ => panic!("unsupported float width: {bits}"),
        }
    }

    /// Complex type of the given total width (64 or 128).
    pub fn complex_type(&mut self, bits: u16) -> TypeId {
        assert!(
            bits == 64 || bits == 128,
            "unsupported complex width: {bits}"
        );
        self.intern(TypeData::Complex { bits })
    }

    /// Component float type of a complex type.
    pub fn complex_component_type(&self, complex: TypeId) -> TypeId {
        match *self.data(self.underlying(complex)) {
            TypeData::Complex { bits } => self.float_type(bits / 2),
            TypeData::Error => TypeId::ERROR,
            ref other => panic!("{other:?} is not a complex type"),
        }
    }

    /// Pointer to `to`. A pointer to void is modeled as a pointer to `u8`.
    pub fn pointer_type(&mut self, to: TypeId) -> TypeId {
        if self.is_error(to) {
            return TypeId::ERROR;
        }
        let to = if to == TypeId::VOID { TypeId::U8 } else { to };
        self.intern(TypeData::Pointer(to))
    }

    /// Anonymous struct with the given fields, in order.
    pub fn struct_type(&mut self, fields: &[TypedField]) -> TypeId {
        if fields.iter().any(|f| self.is_error(f.ty)) {
            return TypeId::ERROR;
        }
        let tys: Box<[TypeId]> = fields.iter().map(|f| f.ty).collect();
        self.intern(TypeData::Struct(tys))
    }

    /// Fixed-length array of `len` elements of type `elem`.
    pub fn array_type(&mut self, elem: TypeId, len: u64) -> TypeId {
        if self.is_error(elem) {
            return TypeId::ERROR;
        }
        self.intern(TypeData::Array { elem, len })
    }

    /// Function signature.
    ///
    /// The receiver, if any, becomes the first parameter. No results map to
    /// void, a single result to its own type, and several results to
    /// `result_struct`, which the caller builds. A zero-sized result is
    /// returned as void.
    pub fn function_type(
        &mut self,
        receiver: Option<TypedField>,
        params: &[TypedField],
        results: &[TypedField],
        result_struct: TypeId,
    ) -> TypeId {
        let inputs: Vec<TypeId> = receiver.iter().chain(params).map(|f| f.ty).collect();
        if inputs.iter().any(|&t| self.is_error(t)) || results.iter().any(|f| self.is_error(f.ty)) {
            return TypeId::ERROR;
        }

        let result = match results {
            [] => TypeId::VOID,
            [single] => single.ty,
            _ => result_struct,
        };
        if self.is_error(result) {
            return TypeId::ERROR;
        }
        let result = if self.is_zero_sized(result) {
            TypeId::VOID
        } else {
            result
        };

        self.intern(TypeData::Function {
            params: inputs.into_boxed_slice(),
            result,
        })
    }

    /// Nominal type over `underlying`. Distinct names yield distinct handles.
    pub fn named_type(&mut self, name: Name, underlying: TypeId) -> TypeId {
        if self.is_error(underlying) {
            return TypeId::ERROR;
        }
        self.intern(TypeData::Named { name, underlying })
    }

    /// Marker pointer used while the front end breaks a type cycle.
    pub fn circular_pointer_type(&mut self) -> TypeId {
        self.intern(TypeData::Pointer(TypeId::OPAQUE))
    }

    pub fn is_circular_pointer_type(&self, ty: TypeId) -> bool {
        matches!(self.data(ty), TypeData::Pointer(TypeId::OPAQUE))
    }

    fn is_zero_sized(&self, ty: TypeId) -> bool {
        self.try_layout(ty).is_some_and(|layout| layout.size == 0)
    }

    // Placeholder constructors

    pub fn placeholder_pointer_type(&mut self, name: Name) -> TypeId {
        self.make_placeholder(PlaceholderShape::Pointer, name)
    }

    pub fn placeholder_struct_type(&mut self, name: Name) -> TypeId {
        self.make_placeholder(PlaceholderShape::Struct, name)
    }

    pub fn placeholder_array_type(&mut self, name: Name) -> TypeId {
        self.make_placeholder(PlaceholderShape::Array, name)
    }

    pub fn placeholder_function_type(&mut self, name: Name) -> TypeId {
        self.make_placeholder(PlaceholderShape::Function, name)
    }

    /// Resolve a pointer placeholder to a pointer to `to`.
    pub fn set_placeholder_pointer_type(
        &mut self,
        placeholder: TypeId,
        to: TypeId,
    ) -> Result<Resolution, PlaceholderError> {
        let real = self.pointer_type(to);
        self.resolve_placeholder(placeholder, real)
    }

    /// Resolve a struct placeholder to a struct with `fields`.
    pub fn set_placeholder_struct_type(
        &mut self,
        placeholder: TypeId,
        fields: &[TypedField],
    ) -> Result<Resolution, PlaceholderError> {
        let real = self.struct_type(fields);
        self.resolve_placeholder(placeholder, real)
    }

    /// Resolve an array placeholder to `[len x elem]`.
    pub fn set_placeholder_array_type(
        &mut self,
        placeholder: TypeId,
        elem: TypeId,
        len: u64,
    ) -> Result<Resolution, PlaceholderError> {
        let real = self.array_type(elem, len);
        self.resolve_placeholder(placeholder, real)
    }

    /// Resolve a function placeholder to an existing function type.
    pub fn set_placeholder_function_type(
        &mut self,
        placeholder: TypeId,
        fntype: TypeId,
    ) -> Result<Resolution, PlaceholderError> {
        self.resolve_placeholder(placeholder, fntype)
    }
}
