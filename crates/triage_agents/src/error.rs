//! Error types for the agent collaborators.

use thiserror::Error;

/// Errors from the judgment service (LLM).
#[derive(Error, Debug)]
pub enum JudgmentError {
    #[error("No LLM provider configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    NotConfigured,

    #[error("LLM request failed: {0}")]
    Http(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("LLM retries exhausted: {0}")]
    RetriesExhausted(String),
}

/// Errors from the knowledge source.
///
/// These never abort a ticket: the retriever absorbs them and falls back to
/// its built-in corpus.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Knowledge source unavailable: {0}")]
    Unavailable(String),

    #[error("Knowledge query failed: {0}")]
    Query(String),
}
