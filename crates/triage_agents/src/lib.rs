//! # triage_agents
//!
//! Node implementations for the triage resolution pipeline:
//!
//! - **ClassifierNode**: LLM-backed category assignment (fatal on anything
//!   outside the closed category set)
//! - **RetrieverNode**: knowledge-source search with a built-in fallback
//!   corpus, so context is never empty
//! - **DrafterNode**: grounded reply generation, with an offline template
//!   when no LLM is configured
//! - **ReviewerNode**: approve/reject gate with defensive JSON parsing and a
//!   deterministic grounding rule as degraded mode
//! - **RefinerNode**: deterministic keyword extraction turning rejection
//!   feedback into the next retrieval hint
//!
//! The external collaborators are traits ([`JudgmentService`],
//! [`KnowledgeSource`]) so tests can inject canned implementations;
//! [`LlmAdapter`] is the production judgment service.

pub mod classify;
pub mod draft;
pub mod error;
pub mod judgment;
pub mod knowledge;
pub mod llm;
pub mod refine;
pub mod retrieve;
pub mod review;

pub use classify::{ClassifierNode, FixedCategoryClassifier};
pub use draft::DrafterNode;
pub use error::{JudgmentError, KnowledgeError};
pub use judgment::JudgmentService;
pub use knowledge::KnowledgeSource;
pub use llm::{LlmAdapter, LlmProvider};
pub use refine::RefinerNode;
pub use retrieve::RetrieverNode;
pub use review::ReviewerNode;

use std::sync::Arc;

use triage_core::{PipelineNodes, TicketNode};

/// Assemble the standard node set.
///
/// The classifier is passed separately because offline runs replace it with
/// a [`FixedCategoryClassifier`] while the rest of the pipeline degrades
/// gracefully on its own.
pub fn standard_nodes(
    classifier: Arc<dyn TicketNode>,
    judgment: Option<Arc<dyn JudgmentService>>,
    knowledge: Option<Arc<dyn KnowledgeSource>>,
) -> PipelineNodes {
    PipelineNodes {
        classifier,
        retriever: Arc::new(RetrieverNode::new(knowledge)),
        drafter: Arc::new(DrafterNode::new(judgment.clone())),
        reviewer: Arc::new(ReviewerNode::new(judgment)),
        refiner: Arc::new(RefinerNode::new()),
    }
}
