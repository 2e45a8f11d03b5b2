//! Drafter node: produce a reply grounded in the retrieved context.

use std::sync::Arc;

use async_trait::async_trait;

use triage_core::{CoreError, CoreResult, StateUpdate, TicketNode, TicketState};

use crate::judgment::JudgmentService;

const SYSTEM_PROMPT: &str = "You are a customer support reply writer. \
    Write an empathetic, concise, professional reply. \
    Ground every factual claim in the provided context snippets, \
    and end with a clear, actionable next step or question. \
    Return only the reply text.";

fn format_context(context: &[String]) -> String {
    if context.is_empty() {
        return String::new();
    }
    format!("\n\nContext:\n- {}", context.join("\n- "))
}

fn user_prompt(state: &TicketState) -> String {
    let mut prompt = format!(
        "Subject: {}\nDescription: {}{}",
        state.subject,
        state.description,
        format_context(&state.context)
    );
    if let Some(hint) = &state.refine_hint {
        prompt.push_str(&format!("\n\nReviewer feedback to address: {}", hint));
    }
    prompt
}

/// Deterministic template used when no judgment service is configured,
/// so the pipeline runs end to end without an API key.
fn offline_draft(context: &[String]) -> String {
    format!(
        "Hi there, thanks for reaching out.\n\n\
         I understand you're facing an issue. Here are steps that often resolve it:{}\n\n\
         If this doesn't help, please reply with your OS/app version so we can dig deeper.",
        format_context(context)
    )
}

/// Reply drafter. Groundedness is checked downstream by the reviewer, not
/// here.
pub struct DrafterNode {
    judgment: Option<Arc<dyn JudgmentService>>,
}

impl DrafterNode {
    pub fn new(judgment: Option<Arc<dyn JudgmentService>>) -> Self {
        Self { judgment }
    }
}

#[async_trait]
impl TicketNode for DrafterNode {
    fn name(&self) -> &str {
        "draft"
    }

    async fn run(&self, state: &TicketState) -> CoreResult<StateUpdate> {
        let draft = match &self.judgment {
            Some(judgment) => {
                let reply = judgment
                    .judge(SYSTEM_PROMPT, &user_prompt(state))
                    .await
                    .map_err(|e| CoreError::Draft(e.to_string()))?;
                let reply = reply.trim().to_string();
                if reply.is_empty() {
                    return Err(CoreError::Draft("empty reply from judgment service".into()));
                }
                reply
            }
            None => offline_draft(&state.context),
        };

        Ok(StateUpdate::new().draft(draft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_draft_embeds_context() {
        let node = DrafterNode::new(None);
        let mut state = TicketState::new("Password reset", "Cannot reset on iOS.");
        state.context = vec![
            "Reset your password from Settings.".to_string(),
            "Update to the latest app version.".to_string(),
        ];

        let mut out = state.clone();
        node.run(&state).await.unwrap().apply(&mut out);

        let draft = out.draft.unwrap();
        assert!(draft.contains("Reset your password from Settings."));
        assert!(draft.contains("Update to the latest app version."));
        assert!(draft.contains("Context:"));
    }

    #[test]
    fn test_prompt_carries_refine_hint() {
        let mut state = TicketState::new("s", "d");
        state.refine_hint = Some("mention ios steps".to_string());

        let prompt = user_prompt(&state);
        assert!(prompt.contains("Reviewer feedback to address: mention ios steps"));
    }

    #[test]
    fn test_prompt_without_hint_has_no_feedback_section() {
        let state = TicketState::new("s", "d");
        assert!(!user_prompt(&state).contains("Reviewer feedback"));
    }
}
