//! Identity error types.

use thiserror::Error;

/// Errors that can occur during identity operations.
///
/// Display texts are user-facing; the UI surfaces them verbatim.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A user with this email is already registered.
    #[error("User already exists with this email")]
    AlreadyExists,

    /// No user matches the supplied credentials.
    #[error("Invalid email or password. Please sign up first.")]
    InvalidCredentials,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document store error (profile auto-creation).
    #[error("Document store error: {0}")]
    Storage(#[from] doc_store::DocStoreError),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
