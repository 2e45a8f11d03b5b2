//! Retry controller: the state machine that sequences the pipeline.
//!
//! One ticket moves strictly sequentially through
//! classify -> retrieve -> draft -> review. An approved review terminates the
//! run; a rejection increments the attempts counter and either loops back to
//! retrieval with a refine hint or, once the retry budget is exhausted,
//! appends a record to the escalation sink and terminates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::escalation::{EscalationRecord, EscalationSink};
use crate::node::TicketNode;
use crate::ticket::{FailedAttempt, TicketState};

/// Stages of the resolution state machine.
///
/// Each stage names the milestone just completed; the transition out of it
/// runs the next node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    Classified,
    Retrieved,
    Drafted,
    Reviewed,
    Escalated,
    End,
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Retry cycles allowed after the initial attempt. The counter is
    /// compared strictly, so limit 2 means at most 3 draft/review cycles.
    pub retry_limit: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { retry_limit: 2 }
    }
}

/// The node set a pipeline runs, in execution order.
pub struct PipelineNodes {
    pub classifier: Arc<dyn TicketNode>,
    pub retriever: Arc<dyn TicketNode>,
    pub drafter: Arc<dyn TicketNode>,
    pub reviewer: Arc<dyn TicketNode>,
    pub refiner: Arc<dyn TicketNode>,
}

/// Sequences the nodes and enforces the retry/escalate contract.
///
/// The pipeline owns all state mutation: nodes return partial updates and the
/// controller merges them, increments the attempts counter on rejection, and
/// is the only component allowed to touch the escalation sink.
pub struct TicketPipeline {
    nodes: PipelineNodes,
    sink: Arc<dyn EscalationSink>,
    config: PipelineConfig,
}

impl TicketPipeline {
    pub fn new(nodes: PipelineNodes, sink: Arc<dyn EscalationSink>, config: PipelineConfig) -> Self {
        Self {
            nodes,
            sink,
            config,
        }
    }

    /// Resolve one ticket end to end.
    ///
    /// Returns the final state: either `review.approved == true` or
    /// `escalated == true`. A classification failure aborts the whole run
    /// with an error instead; classification is a precondition, not a
    /// reviewed step, so it neither retries nor escalates.
    pub async fn resolve(
        &self,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> CoreResult<TicketState> {
        let mut state = TicketState::new(subject, description);
        let mut stage = PipelineStage::Start;

        info!("Resolving ticket: {}", state.subject);

        loop {
            debug!("Pipeline stage: {:?} (attempts={})", stage, state.attempts);
            stage = match stage {
                PipelineStage::Start => {
                    let update = self.nodes.classifier.run(&state).await?;
                    if update.classified_as().is_none() {
                        return Err(CoreError::Classification(format!(
                            "node '{}' produced no category",
                            self.nodes.classifier.name()
                        )));
                    }
                    update.apply(&mut state);
                    info!("Classified as {:?}", state.category);
                    PipelineStage::Classified
                }
                PipelineStage::Classified => {
                    let update = self.nodes.retriever.run(&state).await?;
                    update.apply(&mut state);
                    debug!("Retrieved {} context snippets", state.context.len());
                    PipelineStage::Retrieved
                }
                PipelineStage::Retrieved => {
                    let update = self.nodes.drafter.run(&state).await?;
                    update.apply(&mut state);
                    // The hint has now been consumed by retrieval and drafting.
                    state.refine_hint = None;
                    PipelineStage::Drafted
                }
                PipelineStage::Drafted => {
                    let update = self.nodes.reviewer.run(&state).await?;
                    update.apply(&mut state);
                    PipelineStage::Reviewed
                }
                PipelineStage::Reviewed => {
                    let verdict = state.review.clone().ok_or_else(|| {
                        CoreError::Review(format!(
                            "node '{}' produced no verdict",
                            self.nodes.reviewer.name()
                        ))
                    })?;

                    if verdict.approved {
                        info!("Draft approved after {} rejection(s)", state.attempts);
                        PipelineStage::End
                    } else {
                        // Incremented on every rejection, including the one
                        // that triggers escalation, so the logged attempts
                        // value equals the limit at escalation time.
                        state.attempts += 1;
                        state.failures.push(FailedAttempt {
                            draft: state.draft.clone().unwrap_or_default(),
                            feedback: verdict.feedback.clone(),
                        });

                        if state.attempts < self.config.retry_limit {
                            warn!(
                                "Draft rejected (attempt {}): {}",
                                state.attempts, verdict.feedback
                            );
                            let update = self.nodes.refiner.run(&state).await?;
                            update.apply(&mut state);
                            PipelineStage::Classified
                        } else {
                            warn!(
                                "Retry budget exhausted after {} attempts, escalating",
                                state.attempts
                            );
                            PipelineStage::Escalated
                        }
                    }
                }
                PipelineStage::Escalated => {
                    let record = EscalationRecord::from_state(&state);
                    self.sink.append(&record).await?;
                    state.escalated = true;
                    PipelineStage::End
                }
                PipelineStage::End => break,
            };
        }

        Ok(state)
    }
}
