//! Refiner node: turn reviewer feedback into retrieval hints.
//!
//! Deterministic keyword extraction over the feedback and ticket text. The
//! resulting hint steers the next retrieval pass; the old context is cleared
//! so the retry cannot reuse stale snippets.

use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use triage_core::{CoreResult, StateUpdate, TicketNode, TicketState};

/// Minimal stopword list, enough to clean the signal without a text-mining
/// dependency.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "then", "else", "so", "to", "for", "of", "on",
    "in", "at", "by", "is", "are", "was", "were", "be", "been", "being", "it", "this", "that",
    "these", "those", "with", "without", "from", "as", "about", "into", "over", "under", "again",
    "further", "can", "cannot", "could", "should", "would", "will", "won't", "dont", "does",
    "did", "done", "user", "customer", "please", "thanks", "thank", "hi", "hello", "issue",
    "problem", "error",
];

const MAX_TERMS: usize = 10;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9+#\-_/]{3,}").expect("valid token regex"))
}

fn tokenize(text: &str) -> Vec<String> {
    token_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Score tokens by length, favoring those carrying digits (versions, "2fa")
/// or symbols ("reset_password", "c++"), and keep the top N unique terms.
fn keywords(corpus: &[&str], keep: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut scored: Vec<(String, f64)> = Vec::new();

    for text in corpus {
        for token in tokenize(text) {
            if STOPWORDS.contains(&token.as_str()) || seen.contains(&token) {
                continue;
            }
            let mut score = token.len() as f64;
            if token.chars().any(|c| c.is_ascii_digit()) {
                score += 2.0;
            }
            if token.chars().any(|c| "+#_/-".contains(c)) {
                score += 1.5;
            }
            seen.insert(token.clone());
            scored.push((token, score));
        }
    }

    // Stable sort keeps appearance order among ties, so output is
    // deterministic for identical input.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(keep).map(|(t, _)| t).collect()
}

/// Feedback-aware refiner.
pub struct RefinerNode;

impl RefinerNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RefinerNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketNode for RefinerNode {
    fn name(&self) -> &str {
        "refine"
    }

    async fn run(&self, state: &TicketState) -> CoreResult<StateUpdate> {
        let feedback = state.feedback().unwrap_or("");
        let category = state.category.map(|c| c.as_str()).unwrap_or("");

        let terms = keywords(
            &[feedback, &state.subject, &state.description, category],
            MAX_TERMS,
        );

        let hint = if terms.is_empty() {
            if category.is_empty() {
                "general".to_string()
            } else {
                category.to_lowercase()
            }
        } else {
            terms.join(" ")
        };

        Ok(StateUpdate::new().refine_hint(hint).clear_context())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{Category, ReviewVerdict};

    #[test]
    fn test_keywords_drop_stopwords() {
        let terms = keywords(&["the user cannot reset the password"], 10);
        assert!(terms.contains(&"reset".to_string()));
        assert!(terms.contains(&"password".to_string()));
        assert!(!terms.iter().any(|t| t == "the" || t == "user" || t == "cannot"));
    }

    #[test]
    fn test_keywords_favor_digits_and_symbols() {
        let terms = keywords(&["enable 2fa using reset_password token soon"], 2);
        // "reset_password" gets the symbol bonus on top of its length.
        assert_eq!(terms[0], "reset_password");
        // The digit bonus lifts "2fa" over longer plain words like "soon".
        let ranked = keywords(&["soon enable 2fa"], 10);
        let pos_2fa = ranked.iter().position(|t| t == "2fa").unwrap();
        let pos_soon = ranked.iter().position(|t| t == "soon").unwrap();
        assert!(pos_2fa < pos_soon);
    }

    #[test]
    fn test_keywords_deterministic() {
        let corpus = ["mention mobile ios steps and link to password policy"];
        assert_eq!(keywords(&corpus, 10), keywords(&corpus, 10));
    }

    #[tokio::test]
    async fn test_refiner_builds_hint_and_clears_context() {
        let mut state = TicketState::new(
            "Password reset not working on mobile",
            "User cannot reset password on iOS app.",
        );
        state.category = Some(Category::Technical);
        state.context = vec!["stale snippet".to_string()];
        state.review = Some(ReviewVerdict::reject(
            "Mention mobile iOS steps and link to password policy.",
        ));

        let node = RefinerNode::new();
        let mut out = state.clone();
        node.run(&state).await.unwrap().apply(&mut out);

        assert!(out.context.is_empty());
        let hint = out.refine_hint.unwrap();
        assert!(hint.contains("password"));
        assert!(hint.contains("ios") || hint.contains("mobile"));
    }

    #[tokio::test]
    async fn test_refiner_falls_back_to_category() {
        let mut state = TicketState::new("", "");
        state.category = Some(Category::Billing);
        state.review = Some(ReviewVerdict::reject("of the to and"));

        let node = RefinerNode::new();
        let mut out = state.clone();
        node.run(&state).await.unwrap().apply(&mut out);

        assert_eq!(out.refine_hint.as_deref(), Some("billing"));
    }
}
