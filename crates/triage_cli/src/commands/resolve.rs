//! `triage resolve` - run one ticket through the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use triage_agents::{
    standard_nodes, ClassifierNode, FixedCategoryClassifier, JudgmentService, LlmAdapter,
};
use triage_core::{Category, CsvEscalationLog, PipelineConfig, TicketNode, TicketPipeline};

use crate::ExitCodes;

#[derive(Args)]
pub struct ResolveArgs {
    /// Ticket subject line
    #[arg(long)]
    pub subject: String,

    /// Ticket description
    #[arg(long)]
    pub description: String,

    /// Pin the category instead of classifying with the LLM
    /// (Technical, Billing, Security, General)
    #[arg(long)]
    pub category: Option<String>,

    /// Retry cycles allowed before escalation
    #[arg(long, default_value_t = 2)]
    pub retry_limit: u32,

    /// Path of the append-only escalation log
    #[arg(long, default_value = "escalation_log.csv")]
    pub escalation_log: PathBuf,
}

pub async fn execute(args: ResolveArgs) -> Result<u8> {
    if args.subject.trim().is_empty() || args.description.trim().is_empty() {
        bail!("both --subject and --description must be non-empty");
    }

    // The judgment service is optional: drafting and review degrade to
    // deterministic fallbacks without it, but classification does not.
    let judgment: Option<Arc<dyn JudgmentService>> = match LlmAdapter::from_env() {
        Ok(adapter) => {
            info!("Using {:?} model {}", adapter.provider(), adapter.model());
            Some(Arc::new(adapter))
        }
        Err(_) => {
            info!("No LLM provider configured, running with deterministic fallbacks");
            None
        }
    };

    let classifier: Arc<dyn TicketNode> = match &args.category {
        Some(label) => {
            let category = Category::from_label(label).with_context(|| {
                format!(
                    "unknown category '{}' (expected one of: Technical, Billing, Security, General)",
                    label
                )
            })?;
            Arc::new(FixedCategoryClassifier::new(category))
        }
        None => match &judgment {
            Some(judgment) => Arc::new(ClassifierNode::new(judgment.clone())),
            None => bail!(
                "no LLM provider configured; set OPENAI_API_KEY or ANTHROPIC_API_KEY, \
                 or pin a category with --category"
            ),
        },
    };

    let pipeline = TicketPipeline::new(
        standard_nodes(classifier, judgment, None),
        Arc::new(CsvEscalationLog::new(args.escalation_log)),
        PipelineConfig {
            retry_limit: args.retry_limit,
        },
    );

    let state = pipeline.resolve(args.subject, args.description).await?;

    println!("{}", serde_json::to_string_pretty(&state)?);

    Ok(if state.escalated {
        ExitCodes::ESCALATED
    } else {
        ExitCodes::SUCCESS
    })
}
