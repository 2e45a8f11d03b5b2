//! Reviewer node: gate a draft on groundedness, policy, tone, and
//! actionability.
//!
//! A review always yields approve or reject, never "unknown": the JSON reply
//! is parsed defensively, a rejection always carries non-empty feedback, and
//! an unreachable judgment service degrades to a deterministic grounding
//! rule instead of aborting the ticket.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use triage_core::{CoreError, CoreResult, ReviewVerdict, StateUpdate, TicketNode, TicketState};

use crate::judgment::{extract_json_object, JudgmentService};

const SYSTEM_PROMPT: &str = "You are a strict support reply reviewer. \
    Assess the assistant draft against four checks:\n\
    1) Groundedness: Only uses given context; cites concrete steps.\n\
    2) Policy: No refunds/promises beyond policy; no security leaks.\n\
    3) Tone: Empathetic, concise, professional.\n\
    4) Actionability: Clear next steps or questions.\n\n\
    Return ONLY JSON with keys: approved (true/false) and feedback (string). \
    Feedback must be short, actionable, and explain what to change if not approved.";

const PARSE_FALLBACK_FEEDBACK: &str =
    "Unable to parse the review; please ensure the draft cites context steps.";
const REJECT_FALLBACK_FEEDBACK: &str =
    "Please ground the reply in the provided context and add clear next steps.";
const APPROVE_FEEDBACK: &str = "Looks good.";

fn user_prompt(state: &TicketState, draft: &str) -> String {
    let context_block = if state.context.is_empty() {
        "(none)".to_string()
    } else {
        format!("- {}", state.context.join("\n- "))
    };
    format!(
        "Ticket\n------\nSubject: {}\nDescription: {}\nCategory: {}\n\n\
         Context (knowledge snippets):\n{}\n\n\
         Draft reply from assistant:\n---------------------------\n{}\n",
        state.subject,
        state.description,
        state.category.map(|c| c.as_str()).unwrap_or(""),
        context_block,
        draft,
    )
}

#[derive(Debug, Deserialize)]
struct VerdictReply {
    approved: Option<bool>,
    feedback: Option<String>,
}

/// Parse the reviewer JSON with defensive defaults: unparseable replies
/// reject, and feedback is never empty.
fn parse_verdict(raw: &str) -> ReviewVerdict {
    let reply = extract_json_object(raw)
        .and_then(|json| serde_json::from_str::<VerdictReply>(json).ok());

    match reply {
        Some(reply) => {
            let approved = reply.approved.unwrap_or(false);
            let feedback = reply
                .feedback
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| {
                    if approved {
                        APPROVE_FEEDBACK.to_string()
                    } else {
                        REJECT_FALLBACK_FEEDBACK.to_string()
                    }
                });
            ReviewVerdict { approved, feedback }
        }
        None => ReviewVerdict::reject(PARSE_FALLBACK_FEEDBACK),
    }
}

/// Minimal deterministic gate for offline runs and unreachable services:
/// approve only when the draft actually cites a retrieved snippet.
fn grounding_rule(state: &TicketState, draft: &str) -> ReviewVerdict {
    let grounded = !state.context.is_empty()
        && state.context.iter().any(|snippet| draft.contains(snippet));
    if grounded {
        ReviewVerdict::approve(APPROVE_FEEDBACK)
    } else {
        ReviewVerdict::reject("Please include at least one concrete step from the retrieved context.")
    }
}

/// LLM-backed reviewer with deterministic fallback.
pub struct ReviewerNode {
    judgment: Option<Arc<dyn JudgmentService>>,
}

impl ReviewerNode {
    pub fn new(judgment: Option<Arc<dyn JudgmentService>>) -> Self {
        Self { judgment }
    }
}

#[async_trait]
impl TicketNode for ReviewerNode {
    fn name(&self) -> &str {
        "review"
    }

    async fn run(&self, state: &TicketState) -> CoreResult<StateUpdate> {
        let draft = state
            .draft
            .as_deref()
            .ok_or_else(|| CoreError::Review("no draft to review".to_string()))?;

        let verdict = match &self.judgment {
            Some(judgment) => match judgment.judge(SYSTEM_PROMPT, &user_prompt(state, draft)).await
            {
                Ok(raw) => parse_verdict(&raw),
                Err(e) => {
                    warn!("Judgment service degraded during review ({}), applying grounding rule", e);
                    grounding_rule(state, draft)
                }
            },
            None => grounding_rule(state, draft),
        };

        Ok(StateUpdate::new().review(verdict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict_accepts_well_formed_reply() {
        let verdict = parse_verdict(r#"{"approved": false, "feedback": "Tone too curt."}"#);
        assert!(!verdict.approved);
        assert_eq!(verdict.feedback, "Tone too curt.");

        let verdict = parse_verdict(r#"{"approved": true, "feedback": "Solid."}"#);
        assert!(verdict.approved);
    }

    #[test]
    fn test_parse_verdict_rejects_garbage_with_feedback() {
        let verdict = parse_verdict("I think it looks fine");
        assert!(!verdict.approved);
        assert_eq!(verdict.feedback, PARSE_FALLBACK_FEEDBACK);
    }

    #[test]
    fn test_rejection_never_has_empty_feedback() {
        let verdict = parse_verdict(r#"{"approved": false, "feedback": "   "}"#);
        assert!(!verdict.approved);
        assert_eq!(verdict.feedback, REJECT_FALLBACK_FEEDBACK);

        let verdict = parse_verdict(r#"{"approved": false}"#);
        assert!(!verdict.approved);
        assert!(!verdict.feedback.is_empty());
    }

    #[test]
    fn test_grounding_rule() {
        let mut state = TicketState::new("s", "d");
        state.context = vec!["Reset your password from Settings.".to_string()];

        let cited = "Please try this: Reset your password from Settings.";
        assert!(grounding_rule(&state, cited).approved);

        let uncited = "We will look into it.";
        let verdict = grounding_rule(&state, uncited);
        assert!(!verdict.approved);
        assert!(!verdict.feedback.is_empty());
    }

    #[tokio::test]
    async fn test_missing_draft_is_an_error() {
        let node = ReviewerNode::new(None);
        let state = TicketState::new("s", "d");

        let err = node.run(&state).await.unwrap_err();
        assert!(matches!(err, CoreError::Review(_)));
    }
}
