//! Escalation sink: append-only record store for tickets handed to humans.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::CoreResult;
use crate::ticket::TicketState;

/// One row in the escalation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub subject: String,
    pub description: String,
    pub category: String,
    pub draft: String,
    pub feedback: String,
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
}

impl EscalationRecord {
    /// Snapshot the escalation-relevant fields of a ticket.
    pub fn from_state(state: &TicketState) -> Self {
        Self {
            subject: state.subject.clone(),
            description: state.description.clone(),
            category: state
                .category
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
            draft: state.draft.clone().unwrap_or_default(),
            feedback: state.feedback().unwrap_or_default().to_string(),
            attempts: state.attempts,
            timestamp: Utc::now(),
        }
    }
}

/// Destination for escalated tickets.
///
/// Implementations must be append-only: records are never overwritten or
/// reordered, and concurrent appends must be serialized.
#[async_trait]
pub trait EscalationSink: Send + Sync {
    async fn append(&self, record: &EscalationRecord) -> CoreResult<()>;
}

const CSV_HEADER: &str = "subject,description,category,draft,feedback,attempts,timestamp";

/// CSV file sink. The human review queue consumes this file.
///
/// A single mutex serializes appends so rows from concurrent pipelines never
/// interleave. The header row is written once, when the file is created.
pub struct CsvEscalationLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvEscalationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Quote a value per RFC 4180: wrap in quotes when it contains a comma,
    /// quote, or newline, doubling embedded quotes.
    fn csv_escape(value: &str) -> String {
        if value.contains(',') || value.contains('"') || value.contains('\n') {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }

    fn format_row(record: &EscalationRecord) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            Self::csv_escape(&record.subject),
            Self::csv_escape(&record.description),
            Self::csv_escape(&record.category),
            Self::csv_escape(&record.draft),
            Self::csv_escape(&record.feedback),
            record.attempts,
            record.timestamp.to_rfc3339(),
        )
    }
}

#[async_trait]
impl EscalationSink for CsvEscalationLog {
    async fn append(&self, record: &EscalationRecord) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let needs_header = std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if needs_header {
            writeln!(file, "{}", CSV_HEADER)?;
        }
        writeln!(file, "{}", Self::format_row(record))?;

        info!(
            "Escalated ticket '{}' after {} attempts -> {:?}",
            record.subject, record.attempts, self.path
        );
        Ok(())
    }
}

/// In-memory sink for tests and dry runs.
#[derive(Default)]
pub struct MemoryEscalationLog {
    records: Mutex<Vec<EscalationRecord>>,
}

impl MemoryEscalationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<EscalationRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl EscalationSink for MemoryEscalationLog {
    async fn append(&self, record: &EscalationRecord) -> CoreResult<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape() {
        assert_eq!(CsvEscalationLog::csv_escape("simple"), "simple");
        assert_eq!(
            CsvEscalationLog::csv_escape("a, b"),
            "\"a, b\""
        );
        assert_eq!(
            CsvEscalationLog::csv_escape("say \"hi\""),
            "\"say \"\"hi\"\"\""
        );
        assert_eq!(
            CsvEscalationLog::csv_escape("line1\nline2"),
            "\"line1\nline2\""
        );
    }

    #[test]
    fn test_record_from_state() {
        let mut state = TicketState::new("Refund not received", "Payment was not refunded.");
        state.category = Some(crate::ticket::Category::Billing);
        state.draft = Some("final draft".to_string());
        state.review = Some(crate::ticket::ReviewVerdict::reject("not grounded"));
        state.attempts = 2;

        let record = EscalationRecord::from_state(&state);
        assert_eq!(record.category, "Billing");
        assert_eq!(record.draft, "final draft");
        assert_eq!(record.feedback, "not grounded");
        assert_eq!(record.attempts, 2);
    }
}
