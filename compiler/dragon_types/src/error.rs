//! Placeholder resolution outcomes.

use crate::{PlaceholderShape, TypeId};

/// Successful outcome of resolving a placeholder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The placeholder now carries the supplied structure.
    Resolved,
    /// The handle was never a placeholder and already has the supplied
    /// structure; nothing changed.
    AlreadyConcrete,
    /// An input was the error type. A pending placeholder becomes an error
    /// type itself so later layout queries stay well-defined.
    ErrorType,
}

/// Misuse of the placeholder API.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlaceholderError {
    #[error("placeholder {0:?} has already been resolved")]
    AlreadyResolved(TypeId),

    #[error("{handle:?} is not a placeholder and differs structurally from {target:?}")]
    StructureMismatch { handle: TypeId, target: TypeId },

    #[error("placeholder {placeholder:?} expects a {expected:?} definition")]
    ShapeMismatch {
        placeholder: TypeId,
        expected: PlaceholderShape,
    },

    #[error("cannot resolve {placeholder:?} with {target:?}, which is itself still pending")]
    TargetPending { placeholder: TypeId, target: TypeId },

    #[error("placeholder {placeholder:?} would contain itself by value")]
    InfiniteSize { placeholder: TypeId },
}
