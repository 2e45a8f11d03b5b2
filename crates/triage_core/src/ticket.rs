//! Ticket state threaded through the resolution pipeline.
//!
//! A `TicketState` is created once per incoming ticket, updated by each node
//! in sequence, and returned to the caller after the terminal transition
//! (approved or escalated). Nodes never mutate the state directly: they
//! produce a [`StateUpdate`] that the pipeline merges, so each step stays a
//! pure transformation that is easy to test with canned inputs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification label for a support ticket.
///
/// The set is closed: anything a classifier returns outside this enumeration
/// is rejected at the boundary, never carried downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Technical,
    Billing,
    Security,
    General,
}

impl Category {
    /// All allowed categories, in prompt order.
    pub const ALL: [Category; 4] = [
        Category::Technical,
        Category::Billing,
        Category::Security,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "Technical",
            Category::Billing => "Billing",
            Category::Security => "Security",
            Category::General => "General",
        }
    }

    /// Parse a label, case-insensitively. Returns `None` for anything
    /// outside the enumeration.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict returned by the reviewer.
///
/// A rejection always carries non-empty feedback; that feedback seeds the
/// next cycle's refine hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub approved: bool,
    pub feedback: String,
}

impl ReviewVerdict {
    pub fn approve(feedback: impl Into<String>) -> Self {
        Self {
            approved: true,
            feedback: feedback.into(),
        }
    }

    pub fn reject(feedback: impl Into<String>) -> Self {
        Self {
            approved: false,
            feedback: feedback.into(),
        }
    }
}

/// Audit entry for one rejected draft, kept so humans can see what was tried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedAttempt {
    pub draft: String,
    pub feedback: String,
}

/// The single record flowing through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketState {
    /// Input text, immutable after creation.
    pub subject: String,
    /// Input text, immutable after creation.
    pub description: String,
    /// Set by the classifier; `None` until classified.
    pub category: Option<Category>,
    /// Retrieved snippets; replaced on each retrieval.
    pub context: Vec<String>,
    /// Current proposed reply; replaced on each draft.
    pub draft: Option<String>,
    /// Latest reviewer verdict; replaced on each review.
    pub review: Option<ReviewVerdict>,
    /// Rejection counter, incremented only by the retry controller.
    pub attempts: u32,
    /// Hint derived from the latest rejection, cleared once consumed.
    pub refine_hint: Option<String>,
    /// True only when the retry budget is exhausted with a rejection.
    pub escalated: bool,
    /// One entry per rejected draft.
    pub failures: Vec<FailedAttempt>,
}

impl TicketState {
    pub fn new(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            category: None,
            context: Vec::new(),
            draft: None,
            review: None,
            attempts: 0,
            refine_hint: None,
            escalated: false,
            failures: Vec::new(),
        }
    }

    /// Whether the latest review approved the draft.
    pub fn is_approved(&self) -> bool {
        self.review.as_ref().map_or(false, |r| r.approved)
    }

    /// Feedback from the latest review, if any.
    pub fn feedback(&self) -> Option<&str> {
        self.review.as_ref().map(|r| r.feedback.as_str())
    }
}

/// Partial state update produced by a node and merged by the pipeline.
///
/// Fields left unset leave the corresponding state untouched. `clear_context`
/// exists so the refiner can force a fresh retrieval without being able to
/// smuggle stale snippets into the next attempt.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    category: Option<Category>,
    context: Option<Vec<String>>,
    draft: Option<String>,
    review: Option<ReviewVerdict>,
    refine_hint: Option<String>,
    clear_context: bool,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn context(mut self, context: Vec<String>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn draft(mut self, draft: impl Into<String>) -> Self {
        self.draft = Some(draft.into());
        self
    }

    pub fn review(mut self, verdict: ReviewVerdict) -> Self {
        self.review = Some(verdict);
        self
    }

    pub fn refine_hint(mut self, hint: impl Into<String>) -> Self {
        self.refine_hint = Some(hint.into());
        self
    }

    pub fn clear_context(mut self) -> Self {
        self.clear_context = true;
        self
    }

    /// The category this update sets, if any.
    pub fn classified_as(&self) -> Option<Category> {
        self.category
    }

    /// Merge this update into the state.
    pub fn apply(self, state: &mut TicketState) {
        if let Some(category) = self.category {
            state.category = Some(category);
        }
        if self.clear_context {
            state.context.clear();
        }
        if let Some(context) = self.context {
            state.context = context;
        }
        if let Some(draft) = self.draft {
            state.draft = Some(draft);
        }
        if let Some(review) = self.review {
            state.review = Some(review);
        }
        if let Some(hint) = self.refine_hint {
            state.refine_hint = Some(hint);
        }
    }
}
