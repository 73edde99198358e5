//! Dragon Types - the backend's type cache.
//!
//! Maps structural type descriptions to canonical [`TypeId`] handles and
//! answers layout questions about them.
//!
//! # Interning
//!
//! Every non-placeholder type is hash-consed: two structurally equal
//! [`TypeData`] values always come back as the same [`TypeId`], so type
//! equality is a `u32` compare.
//!
//! # Placeholders
//!
//! Recursive definitions (a struct holding a pointer to itself, mutually
//! referencing named types) are built in two steps. The front end first
//! asks for a placeholder of the right shape, uses its handle freely while
//! building the rest of the definition, then resolves the placeholder with
//! the real structure. Resolution happens exactly once; afterwards the
//! handle behaves like any other.
//!
//! # Errors
//!
//! [`TypeId::ERROR`] is the single error sentinel. Any constructor that sees
//! it in an input returns it unchanged, and layout queries on it answer a
//! fixed degenerate size and alignment of 1.

mod cache;
mod construct;
mod data;
mod display;
mod error;
mod flags;
mod id;
mod layout;

pub use cache::TypeCache;
pub use data::{PlaceholderShape, TypeData, TypedField};
pub use error::{PlaceholderError, Resolution};
pub use flags::TypeFlags;
pub use id::TypeId;
pub use layout::TargetLayout;

dragon_ir::static_assert_size!(TypeId, 4);

#[cfg(test)]
mod tests;
