//! Engine error types
//!
//! Every failure of the derive/validate/assemble/execute pipeline surfaces as a
//! [`QueryError`]. Validation errors are raised locally before any store call;
//! store failures are wrapped unchanged in [`QueryError::StoreAccess`].
//!
//! Error codes:
//! - DOCREPO_UNKNOWN_PROPERTY (REJECT)
//! - DOCREPO_MIXED_CONNECTOR (REJECT)
//! - DOCREPO_INVALID_METHOD_NAME (REJECT)
//! - DOCREPO_ARGUMENT_COUNT_MISMATCH (REJECT)
//! - DOCREPO_INVALID_ARGUMENT (REJECT)
//! - DOCREPO_UNSUPPORTED_SORT_SHAPE (REJECT)
//! - DOCREPO_UNSUPPORTED_QUERY_SHAPE (REJECT)
//! - DOCREPO_PARTITION_KEY_REQUIRED (REJECT)
//! - DOCREPO_INVALID_PAGE_SIZE (REJECT)
//! - DOCREPO_STORE_ACCESS (ERROR)
//! - DOCREPO_CONVERSION (ERROR)

use thiserror::Error;

use crate::store::StoreError;

/// Result type for engine operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Engine errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Predicate or sort references a property the entity does not declare
    #[error("Unknown property '{property}' on entity '{entity}'")]
    UnknownProperty { entity: String, property: String },

    /// Both And and Or appear in one operation name
    #[error("Operation '{method}' mixes And and Or connectors")]
    MixedConnector { method: String },

    /// Operation name does not follow the derivation grammar
    #[error("Invalid operation name '{method}': {reason}")]
    InvalidMethodName { method: String, reason: String },

    /// Bound value count differs from the predicate arity
    #[error("Operation '{method}' expects {expected} argument(s), got {actual}")]
    ArgumentCountMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },

    /// Bound value has the wrong shape for its operator
    #[error("Invalid argument for '{property}': {reason}")]
    InvalidArgument { property: String, reason: String },

    /// Sort the store cannot execute
    #[error("Unsupported sort: {0}")]
    UnsupportedSortShape(String),

    /// Query shape the store cannot execute
    #[error("Unsupported query: {0}")]
    UnsupportedQueryShape(String),

    /// Point operation without a derivable partition key
    #[error("PartitionKey value must be supplied for this operation on collection '{collection}'")]
    PartitionKeyRequired { collection: String },

    /// Non-positive page size
    #[error("Page size must be positive, got {0}")]
    InvalidPageSize(i64),

    /// Failure reported by the document store
    #[error("Store access failed: {0}")]
    StoreAccess(#[from] StoreError),

    /// Domain object could not be mapped to or from a document
    #[error("Conversion failed: {0}")]
    Conversion(String),
}

impl QueryError {
    /// Create an unknown property error
    pub fn unknown_property(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            entity: entity.into(),
            property: property.into(),
        }
    }

    /// Create an invalid method name error
    pub fn invalid_method(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMethodName {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownProperty { .. } => "DOCREPO_UNKNOWN_PROPERTY",
            Self::MixedConnector { .. } => "DOCREPO_MIXED_CONNECTOR",
            Self::InvalidMethodName { .. } => "DOCREPO_INVALID_METHOD_NAME",
            Self::ArgumentCountMismatch { .. } => "DOCREPO_ARGUMENT_COUNT_MISMATCH",
            Self::InvalidArgument { .. } => "DOCREPO_INVALID_ARGUMENT",
            Self::UnsupportedSortShape(_) => "DOCREPO_UNSUPPORTED_SORT_SHAPE",
            Self::UnsupportedQueryShape(_) => "DOCREPO_UNSUPPORTED_QUERY_SHAPE",
            Self::PartitionKeyRequired { .. } => "DOCREPO_PARTITION_KEY_REQUIRED",
            Self::InvalidPageSize(_) => "DOCREPO_INVALID_PAGE_SIZE",
            Self::StoreAccess(_) => "DOCREPO_STORE_ACCESS",
            Self::Conversion(_) => "DOCREPO_CONVERSION",
        }
    }

    /// Returns true if the error was raised locally, before any store call
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::StoreAccess(_) | Self::Conversion(_))
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Conversion(err.to_string())
    }
}
