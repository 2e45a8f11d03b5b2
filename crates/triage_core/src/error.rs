//! Error types for the core pipeline.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while resolving a ticket.
///
/// `Classification` is always fatal: a ticket with no valid category must not
/// proceed. Retrieval problems are absorbed by the retriever's fallback corpus
/// and never surface here.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Draft generation failed: {0}")]
    Draft(String),

    #[error("Review failed: {0}")]
    Review(String),

    #[error("Escalation log error: {0}")]
    Escalation(#[from] std::io::Error),
}
