//! Dragon IR - shared vocabulary for the code-generation backend.
//!
//! This crate holds the small value types every other backend crate speaks:
//! - [`Span`] for source locations handed over by the front end
//! - [`Name`] and [`StringInterner`] for identifiers, labels and symbols
//! - [`Operator`] for unary and binary expression operators
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → `Name(u32)`, Types → `TypeId(u32)`
//! - **Flatten Everything**: trees reference children by index, never by `Box`
//!
//! Everything here is `Copy` and cheap to hash so that arenas and caches
//! in the downstream crates can key on it directly.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod interner;
mod name;
mod operator;
mod span;

pub use interner::StringInterner;
pub use name::Name;
pub use operator::{Operator, OperatorClass};
pub use span::Span;

static_assert_size!(Span, 8);
static_assert_size!(Name, 4);
static_assert_size!(Operator, 1);
