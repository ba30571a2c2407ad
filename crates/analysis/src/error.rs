//! Analysis error types.

use thiserror::Error;

/// Errors that can occur during an analysis invocation.
///
/// A failed invocation is terminal; the caller re-issues it explicitly.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Required input was missing.
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    /// The remote endpoint could not be reached or rejected the call.
    #[error("Analysis service call failed: {0}")]
    RemoteCallFailed(String),

    /// The remote endpoint answered with something that is not a report.
    #[error("Analysis service returned an invalid response: {0}")]
    RemoteResponseInvalid(String),
}

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
