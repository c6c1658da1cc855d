//! Structured audit logging for autonomy decisions.
//!
//! Provides the [`AuditLogger`] trait and associated types. The primary
//! implementation, [`JsonlAuditWriter`], appends JSONL records to
//! daily-rotating files under the data directory. The log is append-only:
//! entries are written once and never mutated.

pub mod writer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of an autonomy-gate evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Candidate was auto-created as a task.
    AutoCreate,
    /// Candidate was queued as a pending suggestion.
    Suggest,
}

/// Context captured alongside a decision for later review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Candidate title, truncated for log hygiene.
    pub title: String,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Autonomy level in force at evaluation time.
    pub autonomy_level: String,
}

/// A structured record of one autonomy-gate decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// ISO 8601 timestamp with timezone.
    pub timestamp: DateTime<Utc>,
    /// Decision gate name (currently always `autonomy_gate`).
    pub decision: String,
    /// Human-readable reasoning behind the outcome.
    pub reasoning: String,
    /// Evaluation outcome.
    pub outcome: DecisionOutcome,
    /// Captured evaluation context.
    pub context: DecisionContext,
}

impl DecisionRecord {
    /// Maximum title length retained in a decision record.
    const TITLE_LIMIT: usize = 80;

    /// Construct a record for an autonomy-gate evaluation.
    #[must_use]
    pub fn autonomy_gate(
        title: &str,
        confidence: f64,
        autonomy_level: &str,
        outcome: DecisionOutcome,
        reasoning: String,
    ) -> Self {
        let title = if title.chars().count() > Self::TITLE_LIMIT {
            let truncated: String = title.chars().take(Self::TITLE_LIMIT).collect();
            format!("{truncated}…")
        } else {
            title.to_owned()
        };
        Self {
            timestamp: Utc::now(),
            decision: "autonomy_gate".to_owned(),
            reasoning,
            outcome,
            context: DecisionContext {
                title,
                confidence,
                autonomy_level: autonomy_level.to_owned(),
            },
        }
    }
}

/// Writes structured decision records to a persistent sink.
///
/// Implementations must be [`Send`] and [`Sync`] to allow sharing across
/// async task boundaries via [`std::sync::Arc`].
pub trait AuditLogger: Send + Sync {
    /// Record a single decision entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write operation fails.
    fn log_entry(&self, entry: DecisionRecord) -> crate::Result<()>;
}

/// A no-op audit sink for contexts where decision logging is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditLogger;

impl AuditLogger for NullAuditLogger {
    fn log_entry(&self, _entry: DecisionRecord) -> crate::Result<()> {
        Ok(())
    }
}

pub use writer::JsonlAuditWriter;
