use dragon_ir::StringInterner;
use pretty_assertions::assert_eq;

use super::*;

fn field(interner: &StringInterner, name: &str, ty: TypeId) -> TypedField {
    TypedField::new(interner.intern(name), ty)
}

#[test]
fn primitives_are_pre_interned() {
    let mut cache = TypeCache::default();
    assert_eq!(cache.integer_type(false, 32), TypeId::I32);
    assert_eq!(cache.integer_type(true, 64), TypeId::U64);
    assert_eq!(cache.float_type(64), TypeId::F64);
    assert_eq!(cache.intern(TypeData::Bool), TypeId::BOOL);
    assert_eq!(cache.len(), TypeId::PRIMITIVE_COUNT as usize);
}

#[test]
fn anonymous_interning_is_idempotent() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let a = cache.struct_type(&[
        field(&interner, "x", TypeId::I32),
        field(&interner, "y", TypeId::F64),
    ]);
    // Field names do not take part in structural identity.
    let b = cache.struct_type(&[
        field(&interner, "p", TypeId::I32),
        field(&interner, "q", TypeId::F64),
    ]);
    assert_eq!(a, b);

    let p1 = cache.pointer_type(a);
    let p2 = cache.pointer_type(b);
    assert_eq!(p1, p2);
}

#[test]
fn named_types_are_distinct_per_name() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let foo = cache.named_type(interner.intern("Foo"), TypeId::I64);
    let bar = cache.named_type(interner.intern("Bar"), TypeId::I64);
    let foo_again = cache.named_type(interner.intern("Foo"), TypeId::I64);
    assert_ne!(foo, bar);
    assert_eq!(foo, foo_again);
    assert_eq!(cache.underlying(foo), TypeId::I64);
    assert!(cache.flags(foo).contains(TypeFlags::IS_NAMED | TypeFlags::IS_INTEGER));
}

#[test]
fn error_inputs_short_circuit() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let before = cache.len();

    assert_eq!(cache.pointer_type(TypeId::ERROR), TypeId::ERROR);
    assert_eq!(cache.array_type(TypeId::ERROR, 4), TypeId::ERROR);
    assert_eq!(
        cache.struct_type(&[
            field(&interner, "a", TypeId::I32),
            field(&interner, "b", TypeId::ERROR),
        ]),
        TypeId::ERROR
    );
    assert_eq!(
        cache.function_type(
            None,
            &[field(&interner, "p", TypeId::ERROR)],
            &[],
            TypeId::ERROR
        ),
        TypeId::ERROR
    );
    assert_eq!(
        cache.named_type(interner.intern("T"), TypeId::ERROR),
        TypeId::ERROR
    );
    assert_eq!(cache.len(), before);
}

#[test]
fn error_type_layout_is_degenerate() {
    let cache = TypeCache::default();
    assert_eq!(cache.type_size(TypeId::ERROR), 1);
    assert_eq!(cache.type_alignment(TypeId::ERROR), 1);
    assert_eq!(cache.type_field_alignment(TypeId::ERROR), 1);
    assert_eq!(cache.type_field_offset(TypeId::ERROR, 3), 0);
}

#[test]
fn struct_layout_is_natural() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let s = cache.struct_type(&[
        field(&interner, "a", TypeId::I8),
        field(&interner, "b", TypeId::I64),
        field(&interner, "c", TypeId::I16),
    ]);
    assert_eq!(cache.type_field_offset(s, 0), 0);
    assert_eq!(cache.type_field_offset(s, 1), 8);
    assert_eq!(cache.type_field_offset(s, 2), 16);
    assert_eq!(cache.type_size(s), 24);
    assert_eq!(cache.type_alignment(s), 8);

    let arr = cache.array_type(s, 3);
    assert_eq!(cache.type_size(arr), 72);

    let c64 = cache.complex_type(64);
    assert_eq!(cache.type_size(c64), 8);
    assert_eq!(cache.type_alignment(c64), 4);
    assert_eq!(cache.complex_component_type(c64), TypeId::F32);
}

#[test]
fn pointer_to_void_points_to_bytes() {
    let mut cache = TypeCache::default();
    let p = cache.pointer_type(TypeId::VOID);
    assert_eq!(cache.pointee(p), Some(TypeId::U8));
}

#[test]
fn function_type_results() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let recv = field(&interner, "self", TypeId::I64);
    let params = [field(&interner, "a", TypeId::I32)];

    let none = cache.function_type(Some(recv), &params, &[], TypeId::VOID);
    assert_eq!(cache.function_result(none), Some(TypeId::VOID));
    let TypeData::Function { params: inputs, .. } = cache.data(none) else {
        panic!("expected a function type");
    };
    assert_eq!(&**inputs, &[TypeId::I64, TypeId::I32]);

    let one = cache.function_type(None, &params, &[field(&interner, "r", TypeId::F64)], TypeId::VOID);
    assert_eq!(cache.function_result(one), Some(TypeId::F64));

    let pair = cache.struct_type(&[
        field(&interner, "r0", TypeId::I32),
        field(&interner, "r1", TypeId::BOOL),
    ]);
    let many = cache.function_type(
        None,
        &params,
        &[
            field(&interner, "r0", TypeId::I32),
            field(&interner, "r1", TypeId::BOOL),
        ],
        pair,
    );
    assert_eq!(cache.function_result(many), Some(pair));

    let empty = cache.struct_type(&[]);
    let zero = cache.function_type(None, &[], &[field(&interner, "z", empty)], TypeId::VOID);
    assert_eq!(cache.function_result(zero), Some(TypeId::VOID));
}

#[test]
fn placeholder_struct_resolves_to_self_referential_struct() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let node = cache.placeholder_struct_type(interner.intern("Node"));
    assert!(cache.is_pending(node));
    assert_eq!(cache.pending_count(), 1);

    let next = cache.pointer_type(node);
    let real = cache.struct_type(&[
        field(&interner, "value", TypeId::I64),
        field(&interner, "next", next),
    ]);
    assert_eq!(
        cache.resolve_placeholder(node, real),
        Ok(Resolution::Resolved)
    );
    assert!(!cache.is_pending(node));
    assert!(cache.is_placeholder(node));
    assert_eq!(cache.data(node), cache.data(real));
    assert!(cache.same_type(node, real));
    assert_eq!(cache.type_size(node), 16);
    assert_eq!(cache.display(node, &interner), "{i64, *%Node}");
}

#[test]
fn placeholder_second_resolution_is_rejected() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let ph = cache.placeholder_pointer_type(interner.intern("P"));
    assert_eq!(
        cache.set_placeholder_pointer_type(ph, TypeId::I32),
        Ok(Resolution::Resolved)
    );
    assert_eq!(
        cache.set_placeholder_pointer_type(ph, TypeId::I32),
        Err(PlaceholderError::AlreadyResolved(ph))
    );
}

#[test]
fn resolving_a_concrete_handle_requires_equal_structure() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let p = cache.pointer_type(TypeId::I32);
    let same = cache.pointer_type(TypeId::I32);
    let other = cache.pointer_type(TypeId::I64);
    assert_eq!(
        cache.resolve_placeholder(p, same),
        Ok(Resolution::AlreadyConcrete)
    );
    assert_eq!(
        cache.resolve_placeholder(p, other),
        Err(PlaceholderError::StructureMismatch {
            handle: p,
            target: other
        })
    );

    let s = cache.struct_type(&[field(&interner, "a", TypeId::I32)]);
    assert_eq!(
        cache.set_placeholder_struct_type(s, &[field(&interner, "b", TypeId::I32)]),
        Ok(Resolution::AlreadyConcrete)
    );
}

#[test]
fn placeholder_shape_and_cycle_checks() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let ph = cache.placeholder_array_type(interner.intern("A"));
    let s = cache.struct_type(&[field(&interner, "a", TypeId::I32)]);
    assert_eq!(
        cache.resolve_placeholder(ph, s),
        Err(PlaceholderError::ShapeMismatch {
            placeholder: ph,
            expected: PlaceholderShape::Array
        })
    );

    let rec = cache.placeholder_struct_type(interner.intern("Rec"));
    assert_eq!(
        cache.set_placeholder_struct_type(rec, &[field(&interner, "inner", rec)]),
        Err(PlaceholderError::InfiniteSize { placeholder: rec })
    );

    let other = cache.placeholder_struct_type(interner.intern("Other"));
    assert_eq!(
        cache.resolve_placeholder(rec, other),
        Err(PlaceholderError::TargetPending {
            placeholder: rec,
            target: other
        })
    );
    assert!(cache.is_pending(rec));
}

#[test]
fn placeholder_resolved_with_error_becomes_error() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let ph = cache.placeholder_struct_type(interner.intern("Broken"));
    assert_eq!(
        cache.set_placeholder_struct_type(ph, &[field(&interner, "x", TypeId::ERROR)]),
        Ok(Resolution::ErrorType)
    );
    assert!(!cache.is_pending(ph));
    assert!(cache.is_error(ph));
    assert_eq!(cache.type_size(ph), 1);

    // The resolved handle poisons everything built from it.
    assert_eq!(cache.struct_type(&[field(&interner, "p", ph)]), TypeId::ERROR);
    assert_eq!(cache.pointer_type(ph), TypeId::ERROR);
    assert_eq!(cache.array_type(ph, 4), TypeId::ERROR);
    assert_eq!(cache.named_type(interner.intern("Alias"), ph), TypeId::ERROR);
    assert_eq!(
        cache.function_type(None, &[field(&interner, "a", ph)], &[], TypeId::ERROR),
        TypeId::ERROR
    );
}

#[test]
fn pending_pointer_placeholder_has_pointer_layout() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let ph = cache.placeholder_pointer_type(interner.intern("P"));
    assert_eq!(cache.type_size(ph), 8);
}

#[test]
#[should_panic(expected = "has no layout")]
fn pending_struct_placeholder_has_no_layout() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let ph = cache.placeholder_struct_type(interner.intern("S"));
    let _ = cache.type_size(ph);
}

#[test]
fn circular_pointer_marker() {
    let mut cache = TypeCache::default();
    let cpt = cache.circular_pointer_type();
    assert!(cache.is_circular_pointer_type(cpt));
    assert_eq!(cache.circular_pointer_type(), cpt);
    let p = cache.pointer_type(TypeId::I8);
    assert!(!cache.is_circular_pointer_type(p));
}

#[test]
fn display_renders_structure() {
    let interner = StringInterner::new();
    let mut cache = TypeCache::default();
    let arr = cache.array_type(TypeId::U8, 4);
    let f = cache.function_type(
        None,
        &[field(&interner, "a", arr)],
        &[field(&interner, "r", TypeId::BOOL)],
        TypeId::VOID,
    );
    assert_eq!(cache.display(f, &interner), "fn([4 x u8]) -> bool");
    assert_eq!(cache.display(TypeId::ERROR, &interner), "<error>");
}

#[test]
fn flags_classify_types() {
    let mut cache = TypeCache::default();
    assert!(cache.flags(TypeId::U32).is_unsigned_integer());
    assert!(!cache.flags(TypeId::I32).is_unsigned_integer());
    assert!(cache.flags(TypeId::F64).is_scalar());
    let c = cache.complex_type(128);
    assert!(cache.flags(c).is_aggregate());
    assert!(cache.flags(TypeId::ERROR).contains(TypeFlags::IS_ERROR));
}
