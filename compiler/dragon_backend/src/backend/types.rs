//! Type operations.
//!
//! Mostly delegations to the [`TypeCache`](dragon_types::TypeCache), taking
//! front-end strings where the cache takes interned names.

use dragon_types::{PlaceholderError, Resolution, TypeData, TypeId, TypedField};

use super::Backend;
use crate::llir::{Constant, Value};
use crate::node::NodeId;

impl Backend {
    pub fn void_type(&self) -> TypeId {
        self.types.void_type()
    }

    pub fn bool_type(&self) -> TypeId {
        self.types.bool_type()
    }

    pub fn error_type(&self) -> TypeId {
        self.types.error_type()
    }

    pub fn integer_type(&mut self, is_unsigned: bool, bits: u16) -> TypeId {
        self.types.integer_type(is_unsigned, bits)
    }

    pub fn float_type(&self, bits: u16) -> TypeId {
        self.types.float_type(bits)
    }

    pub fn complex_type(&mut self, bits: u16) -> TypeId {
        self.types.complex_type(bits)
    }

    pub fn pointer_type(&mut self, to: TypeId) -> TypeId {
        self.types.pointer_type(to)
    }

    pub fn struct_type(&mut self, fields: &[TypedField]) -> TypeId {
        self.types.struct_type(fields)
    }

    /// Array whose length is given by a constant integer expression.
    pub fn array_type(&mut self, elem: TypeId, length: NodeId) -> TypeId {
        if self.is_error_expr(length) {
            return TypeId::ERROR;
        }
        let len = match self.arena.get(length).value() {
            Some(Value::Const(Constant::Int { value, .. })) => match u64::try_from(value) {
                Ok(len) => len,
                Err(_) => panic!("array length {value} out of range"),
            },
            other => panic!("array length must be an integer constant, got {other:?}"),
        };
        self.types.array_type(elem, len)
    }

    pub fn function_type(
        &mut self,
        receiver: Option<TypedField>,
        params: &[TypedField],
        results: &[TypedField],
        result_struct: TypeId,
    ) -> TypeId {
        self.types
            .function_type(receiver, params, results, result_struct)
    }

    pub fn placeholder_pointer_type(&mut self, name: &str) -> TypeId {
        let name = self.interner.intern(name);
        self.types.placeholder_pointer_type(name)
    }

    pub fn placeholder_struct_type(&mut self, name: &str) -> TypeId {
        let name = self.interner.intern(name);
        self.types.placeholder_struct_type(name)
    }

    pub fn placeholder_array_type(&mut self, name: &str) -> TypeId {
        let name = self.interner.intern(name);
        self.types.placeholder_array_type(name)
    }

    pub fn placeholder_function_type(&mut self, name: &str) -> TypeId {
        let name = self.interner.intern(name);
        self.types.placeholder_function_type(name)
    }

    pub fn set_placeholder_pointer_type(
        &mut self,
        placeholder: TypeId,
        to: TypeId,
    ) -> Result<Resolution, PlaceholderError> {
        self.types.set_placeholder_pointer_type(placeholder, to)
    }

    pub fn set_placeholder_struct_type(
        &mut self,
        placeholder: TypeId,
        fields: &[TypedField],
    ) -> Result<Resolution, PlaceholderError> {
        self.types.set_placeholder_struct_type(placeholder, fields)
    }

    /// Resolve an array placeholder; the length is a constant expression as
    /// for [`array_type`](Self::array_type).
    pub fn set_placeholder_array_type(
        &mut self,
        placeholder: TypeId,
        elem: TypeId,
        length: NodeId,
    ) -> Result<Resolution, PlaceholderError> {
        let real = self.array_type(elem, length);
        self.types.resolve_placeholder(placeholder, real)
    }

    pub fn set_placeholder_function_type(
        &mut self,
        placeholder: TypeId,
        fntype: TypeId,
    ) -> Result<Resolution, PlaceholderError> {
        self.types.set_placeholder_function_type(placeholder, fntype)
    }

    pub fn named_type(&mut self, name: &str, underlying: TypeId) -> TypeId {
        let name = self.interner.intern(name);
        self.types.named_type(name, underlying)
    }

    pub fn circular_pointer_type(&mut self) -> TypeId {
        self.types.circular_pointer_type()
    }

    pub fn is_circular_pointer_type(&self, ty: TypeId) -> bool {
        self.types.is_circular_pointer_type(ty)
    }

    pub fn type_size(&self, ty: TypeId) -> u64 {
        self.types.type_size(ty)
    }

    pub fn type_alignment(&self, ty: TypeId) -> u64 {
        self.types.type_alignment(ty)
    }

    pub fn type_field_alignment(&self, ty: TypeId) -> u64 {
        self.types.type_field_alignment(ty)
    }

    pub fn type_field_offset(&self, ty: TypeId, index: usize) -> u64 {
        self.types.type_field_offset(ty, index)
    }

    /// Human-readable rendering of `ty`.
    pub fn type_name(&self, ty: TypeId) -> String {
        self.types.display(ty, &self.interner)
    }

    /// Bit width and signedness of an integer type, through named types.
    pub(crate) fn int_info(&self, ty: TypeId) -> Option<(u16, bool)> {
        match *self.types.data(self.types.underlying(ty)) {
            TypeData::Int { bits, signed } => Some((bits, signed)),
            _ => None,
        }
    }
}
