//! Knowledge source contract used by the retriever.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use triage_core::Category;

use crate::error::KnowledgeError;

/// External collaborator exposing snippet search over a knowledge base.
///
/// The implementation (vector index, keyword search, ...) is out of scope
/// here; the retriever only depends on this contract and falls back to a
/// built-in corpus when the source is missing or failing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Return snippets relevant to the query, most relevant first.
    async fn search(&self, query: &str, category: Category)
        -> Result<Vec<String>, KnowledgeError>;
}
