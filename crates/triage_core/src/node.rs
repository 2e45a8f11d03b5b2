//! Pipeline node trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::ticket::{StateUpdate, TicketState};

/// A single transformation step in the resolution pipeline.
///
/// Nodes read a snapshot of the ticket state and return a partial update;
/// the pipeline owns the merge. This keeps every node side-effect-free and
/// individually testable with canned inputs.
///
/// # Thread safety
///
/// Nodes must be `Send + Sync` so independent pipelines can share them.
#[async_trait]
pub trait TicketNode: Send + Sync {
    /// Unique node name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Run the node against the current state.
    async fn run(&self, state: &TicketState) -> CoreResult<StateUpdate>;
}
