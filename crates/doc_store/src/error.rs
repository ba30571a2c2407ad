//! Document store error types.

use thiserror::Error;

/// Errors that can occur during document store operations.
///
/// An empty query result is not an error; only the single-row terminal
/// reports `NotFound`.
#[derive(Debug, Error)]
pub enum DocStoreError {
    /// No document matched a single-row query.
    #[error("no document found in collection '{collection}'")]
    NotFound { collection: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocStoreError {
    /// Creates a not found error.
    pub fn not_found(collection: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
        }
    }
}

/// Result type for document store operations.
pub type DocStoreResult<T> = Result<T, DocStoreError>;
