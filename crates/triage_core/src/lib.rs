//! # triage_core
//!
//! Core pipeline engine for triage: the ticket state model, the node trait,
//! and the retry controller that sequences classification, retrieval,
//! drafting, and review, escalating to a human queue when the retry budget
//! runs out.
//!
//! # Architecture
//!
//! - **TicketState**: the single record threaded through every step
//! - **TicketNode**: a pure transformation from state to a partial update
//! - **TicketPipeline**: the state machine enforcing the retry/escalate
//!   contract
//! - **EscalationSink**: append-only record store for the human review queue
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_core::{CsvEscalationLog, PipelineConfig, PipelineNodes, TicketPipeline};
//!
//! let pipeline = TicketPipeline::new(
//!     PipelineNodes { classifier, retriever, drafter, reviewer, refiner },
//!     Arc::new(CsvEscalationLog::new("escalation_log.csv")),
//!     PipelineConfig::default(),
//! );
//!
//! let state = pipeline.resolve(
//!     "Password reset not working on mobile",
//!     "User cannot reset password on iOS app.",
//! ).await?;
//! ```

pub mod error;
pub mod escalation;
pub mod node;
pub mod pipeline;
pub mod ticket;

// Re-export main types for convenience
pub use error::{CoreError, CoreResult};
pub use escalation::{CsvEscalationLog, EscalationRecord, EscalationSink, MemoryEscalationLog};
pub use node::TicketNode;
pub use pipeline::{PipelineConfig, PipelineNodes, PipelineStage, TicketPipeline};
pub use ticket::{Category, FailedAttempt, ReviewVerdict, StateUpdate, TicketState};
