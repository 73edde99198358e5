//! Property-based tests for the type cache.
//!
//! Random structural type descriptions are built twice and must come back
//! as the same handle, and any description with an error leaf must
//! collapse to the error sentinel.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::uninlined_format_args,
    reason = "Proptest macros generate code with these patterns"
)]

use dragon_ir::{Name, StringInterner};
use dragon_types::{TypeCache, TypeId, TypedField};
use proptest::prelude::*;

/// Front-end-side description of a type, built bottom-up.
#[derive(Clone, Debug)]
enum Desc {
    Int { unsigned: bool, bits: u16 },
    Float(u16),
    Bool,
    Error,
    Pointer(Box<Desc>),
    Array(Box<Desc>, u64),
    Struct(Vec<Desc>),
    Named(String, Box<Desc>),
}

fn leaf_strategy() -> impl Strategy<Value = Desc> {
    prop_oneof![
        (any::<bool>(), prop::sample::select(vec![8u16, 16, 32, 64]))
            .prop_map(|(unsigned, bits)| Desc::Int { unsigned, bits }),
        prop::sample::select(vec![32u16, 64]).prop_map(Desc::Float),
        Just(Desc::Bool),
    ]
}

fn desc_strategy(with_errors: bool) -> impl Strategy<Value = Desc> {
    let leaf = if with_errors {
        prop_oneof![4 => leaf_strategy(), 1 => Just(Desc::Error)].boxed()
    } else {
        leaf_strategy().boxed()
    };
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|d| Desc::Pointer(Box::new(d))),
            (inner.clone(), 0u64..16).prop_map(|(d, n)| Desc::Array(Box::new(d), n)),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Desc::Struct),
            ("[A-Z][a-z]{0,4}", inner).prop_map(|(n, d)| Desc::Named(n, Box::new(d))),
        ]
    })
}

fn build(cache: &mut TypeCache, interner: &StringInterner, desc: &Desc) -> TypeId {
    match desc {
        Desc::Int { unsigned, bits } => cache.integer_type(*unsigned, *bits),
        Desc::Float(bits) => cache.float_type(*bits),
        Desc::Bool => cache.bool_type(),
        Desc::Error => cache.error_type(),
        Desc::Pointer(to) => {
            let to = build(cache, interner, to);
            cache.pointer_type(to)
        }
        Desc::Array(elem, len) => {
            let elem = build(cache, interner, elem);
            cache.array_type(elem, *len)
        }
        Desc::Struct(fields) => {
            let fields: Vec<TypedField> = fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    TypedField::new(interner.intern(&format!("f{i}")), build(cache, interner, f))
                })
                .collect();
            cache.struct_type(&fields)
        }
        Desc::Named(name, underlying) => {
            let underlying = build(cache, interner, underlying);
            let name: Name = interner.intern(name);
            cache.named_type(name, underlying)
        }
    }
}

fn has_error(desc: &Desc) -> bool {
    match desc {
        Desc::Error => true,
        Desc::Int { .. } | Desc::Float(_) | Desc::Bool => false,
        Desc::Pointer(d) | Desc::Array(d, _) | Desc::Named(_, d) => has_error(d),
        Desc::Struct(fields) => fields.iter().any(has_error),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn interning_is_idempotent(desc in desc_strategy(false)) {
        let interner = StringInterner::new();
        let mut cache = TypeCache::default();
        let first = build(&mut cache, &interner, &desc);
        let len = cache.len();
        let second = build(&mut cache, &interner, &desc);
        prop_assert_eq!(first, second);
        prop_assert_eq!(cache.len(), len);
    }

    #[test]
    fn rendering_is_independent_of_cache_history(desc in desc_strategy(false)) {
        let interner = StringInterner::new();
        let mut fresh = TypeCache::default();
        let mut warm = TypeCache::default();
        // Pre-populate one cache so handles differ between the two.
        let _ = warm.array_type(TypeId::I64, 99);
        let a = build(&mut fresh, &interner, &desc);
        let b = build(&mut warm, &interner, &desc);
        prop_assert_eq!(fresh.display(a, &interner), warm.display(b, &interner));
        prop_assert_eq!(fresh.type_size(a), warm.type_size(b));
    }

    #[test]
    fn error_leaves_collapse_to_sentinel(desc in desc_strategy(true)) {
        let interner = StringInterner::new();
        let mut cache = TypeCache::default();
        let id = build(&mut cache, &interner, &desc);
        prop_assert_eq!(id == TypeId::ERROR, has_error(&desc));
    }
}
