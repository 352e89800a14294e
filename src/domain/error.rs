//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent misuse of the tree/graph model.
///
/// Malformed catalog data never produces a domain error: bad slots are
/// dropped during normalization and the tree degrades to a smaller one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("view has not been laid out yet")]
    NotLaidOut,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
