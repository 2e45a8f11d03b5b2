//! Judgment service contract shared by the classifier, drafter, and reviewer.

use async_trait::async_trait;

use crate::error::JudgmentError;

/// External collaborator that turns a prompt into text.
///
/// Production uses [`crate::llm::LlmAdapter`]; tests inject deterministic
/// stubs so the pipeline is repeatable with canned inputs.
#[async_trait]
pub trait JudgmentService: Send + Sync {
    /// Run one judgment call with a system instruction and a user prompt.
    async fn judge(&self, system: &str, user: &str) -> Result<String, JudgmentError>;
}

/// Extract the first JSON object embedded in a model reply.
///
/// Models occasionally wrap JSON in code fences or commentary even when told
/// not to; parsing the outermost brace span keeps the nodes tolerant of that.
pub(crate) fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(
            extract_json_object("```json\n{\"a\":1}\n```"),
            Some(r#"{"a":1}"#)
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("}{"), None);
    }
}
