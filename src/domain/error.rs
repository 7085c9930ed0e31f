//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::NodeKind;

/// Domain errors describe trees that violate a caller-imposed bound.
///
/// Building and reading trees is infallible; these only surface when a
/// caller asks for a limit to be enforced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("tree depth exceeds limit of {max_depth} at: {path}")]
    DepthExceeded { max_depth: usize, path: String },

    #[error("expected a {expected} at root, found a {found}")]
    UnexpectedRoot { expected: NodeKind, found: NodeKind },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
