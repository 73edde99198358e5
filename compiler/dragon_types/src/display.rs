//! Human-readable rendering of type handles for dumps and diagnostics.

use std::fmt::Write;

use dragon_ir::StringInterner;

use crate::{TypeCache, TypeData, TypeId};

impl TypeCache {
    /// Render `ty` as text.
    ///
    /// Placeholders (resolved or not) and named types print by name, which
    /// keeps recursive definitions finite.
    pub fn display(&self, ty: TypeId, interner: &StringInterner) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty, interner, true);
        out
    }

    fn write_type(&self, out: &mut String, ty: TypeId, interner: &StringInterner, top: bool) {
        if !top {
            if let Some(name) = self.placeholder_name(ty) {
                let _ = write!(out, "%{}", interner.lookup(name));
                return;
            }
        }
        match self.data(ty) {
            TypeData::Void => out.push_str("void"),
            TypeData::Bool => out.push_str("bool"),
            TypeData::Int { bits, signed } => {
                let _ = write!(out, "{}{bits}", if *signed { 'i' } else { 'u' });
            }
            TypeData::Float { bits } => {
                let _ = write!(out, "f{bits}");
            }
            TypeData::Complex { bits } => {
                let _ = write!(out, "complex{bits}");
            }
            TypeData::Pointer(to) => {
                out.push('*');
                self.write_type(out, *to, interner, false);
            }
            TypeData::Struct(fields) => {
                out.push('{');
                for (i, &field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, field, interner, false);
                }
                out.push('}');
            }
            TypeData::Array { elem, len } => {
                let _ = write!(out, "[{len} x ");
                self.write_type(out, *elem, interner, false);
                out.push(']');
            }
            TypeData::Function { params, result } => {
                out.push_str("fn(");
                for (i, &param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, param, interner, false);
                }
                out.push_str(") -> ");
                self.write_type(out, *result, interner, false);
            }
            TypeData::Named { name, .. } => out.push_str(interner.lookup(*name)),
            TypeData::Opaque => out.push_str("opaque"),
            TypeData::Placeholder { shape, name } => {
                let _ = write!(out, "placeholder({:?} %{})", shape, interner.lookup(*name));
            }
            TypeData::Error => out.push_str("<error>"),
        }
    }
}
