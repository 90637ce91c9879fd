//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures that can be decided without
/// touching a store (validation, malformed selectors, bad paging input).
/// Storage concerns belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. an empty product name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A backend selector named no known backend.
    #[error("invalid backend: {0}")]
    InvalidBackend(String),

    /// A page size below the `-1` sentinel (or zero) was requested.
    #[error("invalid page size {0}: expected a positive size or -1")]
    InvalidPagination(i64),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_backend(msg: impl Into<String>) -> Self {
        Self::InvalidBackend(msg.into())
    }
}
