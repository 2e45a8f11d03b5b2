//! Retriever node: category-aware, refine-aware snippet lookup.
//!
//! Queries the injected knowledge source and falls back to a small built-in
//! corpus when the source is missing, failing, or empty. The fallback is a
//! hard contract, not an optimization: the drafter depends on non-empty
//! context, so this node must never return an empty sequence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use triage_core::{Category, CoreResult, StateUpdate, TicketNode, TicketState};

use crate::knowledge::KnowledgeSource;

/// Snippets returned per retrieval.
const TOP_K: usize = 3;

/// Built-in corpus keeping the pipeline alive without a knowledge source.
fn fallback_snippets(category: Category) -> Vec<String> {
    let snippets: &[&str] = match category {
        Category::Technical => &[
            "Reset your password from Settings > Account > Reset Password.",
            "Ensure app version is latest; try clearing cache and retry.",
            "If email not received, check spam and rate limits.",
        ],
        Category::Billing => &[
            "Invoices are sent on the 1st of each month.",
            "Refunds follow policy section 3.2 (no partial refunds after 14 days).",
        ],
        Category::Security => &[
            "MFA required for admin roles; see Security Policy section 4.",
            "Password rules: 12+ chars, mixed case, symbol.",
        ],
        Category::General => &[
            "Thanks for contacting support; we're here to help.",
            "Share screenshots to speed up troubleshooting.",
        ],
    };
    snippets.iter().take(TOP_K).map(|s| s.to_string()).collect()
}

/// Compose the search query from ticket fields plus the refine hint.
fn build_query(state: &TicketState) -> String {
    [
        state.subject.as_str(),
        state.description.as_str(),
        state.refine_hint.as_deref().unwrap_or(""),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Knowledge-backed retriever with built-in fallback.
pub struct RetrieverNode {
    source: Option<Arc<dyn KnowledgeSource>>,
}

impl RetrieverNode {
    pub fn new(source: Option<Arc<dyn KnowledgeSource>>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl TicketNode for RetrieverNode {
    fn name(&self) -> &str {
        "retrieve"
    }

    async fn run(&self, state: &TicketState) -> CoreResult<StateUpdate> {
        let category = state.category.unwrap_or(Category::General);
        let query = build_query(state);

        if let Some(source) = &self.source {
            match source.search(&query, category).await {
                Ok(snippets) => {
                    let context: Vec<String> = snippets
                        .into_iter()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .take(TOP_K)
                        .collect();
                    if !context.is_empty() {
                        debug!("Retrieved {} snippets for {:?}", context.len(), category);
                        return Ok(StateUpdate::new().context(context));
                    }
                    warn!(
                        "Knowledge source returned no snippets for {:?}, using fallback",
                        category
                    );
                }
                Err(e) => {
                    warn!("Knowledge source degraded ({}), using fallback", e);
                }
            }
        }

        Ok(StateUpdate::new().context(fallback_snippets(category)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KnowledgeError;
    use crate::knowledge::MockKnowledgeSource;

    #[test]
    fn test_query_includes_refine_hint() {
        let mut state = TicketState::new("Password reset", "Cannot reset on iOS.");
        assert_eq!(build_query(&state), "Password reset Cannot reset on iOS.");

        state.refine_hint = Some("mobile password-policy".to_string());
        assert_eq!(
            build_query(&state),
            "Password reset Cannot reset on iOS. mobile password-policy"
        );
    }

    #[test]
    fn test_fallback_is_never_empty() {
        for category in Category::ALL {
            assert!(!fallback_snippets(category).is_empty());
        }
    }

    #[tokio::test]
    async fn test_source_results_are_trimmed_and_capped() {
        let mut source = MockKnowledgeSource::new();
        source.expect_search().returning(|_, _| {
            Ok(vec![
                "  first  ".to_string(),
                String::new(),
                "second".to_string(),
                "third".to_string(),
                "fourth".to_string(),
            ])
        });

        let node = RetrieverNode::new(Some(Arc::new(source)));
        let mut state = TicketState::new("s", "d");
        state.category = Some(Category::Technical);

        let mut out = state.clone();
        node.run(&state).await.unwrap().apply(&mut out);

        assert_eq!(
            out.context,
            vec![
                "first".to_string(),
                "second".to_string(),
                "third".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_degraded_source_falls_back() {
        let mut source = MockKnowledgeSource::new();
        source
            .expect_search()
            .returning(|_, _| Err(KnowledgeError::Unavailable("index missing".to_string())));

        let node = RetrieverNode::new(Some(Arc::new(source)));
        let mut state = TicketState::new("s", "d");
        state.category = Some(Category::Billing);

        let mut out = state.clone();
        node.run(&state).await.unwrap().apply(&mut out);

        assert_eq!(out.context, fallback_snippets(Category::Billing));
    }

    #[tokio::test]
    async fn test_missing_source_falls_back() {
        let node = RetrieverNode::new(None);
        let state = TicketState::new("s", "d");

        let mut out = state.clone();
        node.run(&state).await.unwrap().apply(&mut out);

        // Unclassified tickets retrieve against the General corpus.
        assert_eq!(out.context, fallback_snippets(Category::General));
    }
}
