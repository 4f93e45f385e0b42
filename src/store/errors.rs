//! Document store errors
//!
//! Reported by a `DocumentStore` and surfaced to callers unchanged, wrapped in
//! `QueryError::StoreAccess`. The engine never retries.

use thiserror::Error;

/// Result type for store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Target document does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Concurrent modification or duplicate key
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Continuation token was not issued by this store or has expired
    #[error("Invalid continuation token: {0}")]
    InvalidContinuation(String),

    /// Store cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Request rejected by the store
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl StoreError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "DOCREPO_STORE_NOT_FOUND",
            Self::Conflict(_) => "DOCREPO_STORE_CONFLICT",
            Self::InvalidContinuation(_) => "DOCREPO_STORE_INVALID_CONTINUATION",
            Self::Unavailable(_) => "DOCREPO_STORE_UNAVAILABLE",
            Self::BadRequest(_) => "DOCREPO_STORE_BAD_REQUEST",
        }
    }
}
