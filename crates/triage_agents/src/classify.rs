//! Ticket classifier node (LLM-backed).
//!
//! Turns messy ticket text into a single category label the rest of the
//! pipeline can route on. The response contract is strict JSON; anything
//! outside the allowed set is a fatal classification error, because an
//! invalid category must never reach the retriever.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use triage_core::{Category, CoreError, CoreResult, StateUpdate, TicketNode, TicketState};

use crate::judgment::{extract_json_object, JudgmentService};

fn allowed_categories() -> String {
    Category::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn system_prompt() -> String {
    format!(
        "You are a precise support ticket classifier. \
         Choose exactly ONE category from this allowed set: {}. \
         Return ONLY valid JSON like {{\"category\":\"Technical\"}} with no commentary.",
        allowed_categories()
    )
}

fn user_prompt(subject: &str, description: &str) -> String {
    format!(
        "Subject: {}\nDescription: {}\n\nRules:\n- Pick one of: {}\n\
         - If unsure, choose the closest fit (never respond with Unknown).\n",
        subject,
        description,
        allowed_categories()
    )
}

#[derive(Debug, Deserialize)]
struct CategoryReply {
    #[serde(default)]
    category: String,
}

/// Parse the model's JSON reply into a category, rejecting anything outside
/// the enumeration.
fn parse_category(raw: &str) -> Option<Category> {
    let json = extract_json_object(raw)?;
    let reply: CategoryReply = serde_json::from_str(json).ok()?;
    Category::from_label(&reply.category)
}

/// LLM-backed classifier.
pub struct ClassifierNode {
    judgment: Arc<dyn JudgmentService>,
}

impl ClassifierNode {
    pub fn new(judgment: Arc<dyn JudgmentService>) -> Self {
        Self { judgment }
    }
}

#[async_trait]
impl TicketNode for ClassifierNode {
    fn name(&self) -> &str {
        "classify"
    }

    async fn run(&self, state: &TicketState) -> CoreResult<StateUpdate> {
        let raw = self
            .judgment
            .judge(&system_prompt(), &user_prompt(&state.subject, &state.description))
            .await
            .map_err(|e| CoreError::Classification(e.to_string()))?;

        debug!("Classifier reply: {}", raw.trim());

        match parse_category(&raw) {
            Some(category) => Ok(StateUpdate::new().category(category)),
            None => Err(CoreError::Classification(format!(
                "reply outside the allowed category set: {}",
                raw.trim()
            ))),
        }
    }
}

/// Deterministic classifier for operator-pinned categories and offline runs.
pub struct FixedCategoryClassifier {
    category: Category,
}

impl FixedCategoryClassifier {
    pub fn new(category: Category) -> Self {
        Self { category }
    }
}

#[async_trait]
impl TicketNode for FixedCategoryClassifier {
    fn name(&self) -> &str {
        "classify-fixed"
    }

    async fn run(&self, _state: &TicketState) -> CoreResult<StateUpdate> {
        Ok(StateUpdate::new().category(self.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JudgmentError;

    struct CannedJudgment(&'static str);

    #[async_trait]
    impl JudgmentService for CannedJudgment {
        async fn judge(&self, _system: &str, _user: &str) -> Result<String, JudgmentError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingJudgment;

    #[async_trait]
    impl JudgmentService for FailingJudgment {
        async fn judge(&self, _system: &str, _user: &str) -> Result<String, JudgmentError> {
            Err(JudgmentError::Http("boom".to_string()))
        }
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(
            parse_category(r#"{"category":"Technical"}"#),
            Some(Category::Technical)
        );
        assert_eq!(
            parse_category("```json\n{\"category\": \"billing\"}\n```"),
            Some(Category::Billing)
        );
        assert_eq!(parse_category(r#"{"category":"Urgent"}"#), None);
        assert_eq!(parse_category("not json"), None);
        assert_eq!(parse_category(r#"{}"#), None);
    }

    #[tokio::test]
    async fn test_valid_reply_sets_category() {
        let node = ClassifierNode::new(Arc::new(CannedJudgment(r#"{"category":"Security"}"#)));
        let state = TicketState::new("MFA reset", "Cannot log in with authenticator.");

        let mut out = TicketState::new("MFA reset", "Cannot log in with authenticator.");
        node.run(&state).await.unwrap().apply(&mut out);

        assert_eq!(out.category, Some(Category::Security));
    }

    #[tokio::test]
    async fn test_out_of_enumeration_reply_is_fatal() {
        let node = ClassifierNode::new(Arc::new(CannedJudgment(r#"{"category":"Spam"}"#)));
        let state = TicketState::new("s", "d");

        let err = node.run(&state).await.unwrap_err();
        assert!(matches!(err, CoreError::Classification(_)));
    }

    #[tokio::test]
    async fn test_judgment_failure_is_fatal() {
        let node = ClassifierNode::new(Arc::new(FailingJudgment));
        let state = TicketState::new("s", "d");

        let err = node.run(&state).await.unwrap_err();
        assert!(matches!(err, CoreError::Classification(_)));
    }
}
