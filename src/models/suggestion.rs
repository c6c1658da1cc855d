//! Pending suggestion model — a durable, human-reviewable task candidate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::item::SourceType;
use crate::models::task::TaskPriority;
use crate::{AppError, Result};

/// Lifecycle status for a pending suggestion.
///
/// Transitions are `pending -> approved` (creating exactly one task) or
/// `pending -> rejected`; a resolved suggestion is immutable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    /// Awaiting operator review.
    Pending,
    /// Operator accepted; `created_task_id` points at the created task.
    Approved,
    /// Operator declined; no task side effect.
    Rejected,
}

impl SuggestionStatus {
    /// Stable snake_case name used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a snake_case status name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` for an unrecognized status name.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(AppError::Db(format!("invalid suggestion status: {other}"))),
        }
    }
}

/// Snapshot of the original actionable item a suggestion was derived from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ItemContext {
    /// Title of the original item.
    pub title: Option<String>,
    /// Sender or author, when the source knows one.
    pub sender: Option<String>,
    /// Short body snippet for reviewer context.
    pub snippet: Option<String>,
}

/// A task candidate awaiting operator approval or rejection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PendingSuggestion {
    /// Unique record identifier.
    pub id: String,
    /// Proposed task title.
    pub title: String,
    /// Proposed task description.
    pub description: Option<String>,
    /// Proposed priority band.
    pub priority: TaskPriority,
    /// Proposed deadline, when detected.
    pub due_date: Option<DateTime<Utc>>,
    /// Proposed tags.
    pub tags: Vec<String>,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Source category the originating item came from.
    pub source: SourceType,
    /// Source-side reference id of the originating item.
    pub source_ref: Option<String>,
    /// Deep link back into the source, when one can be built.
    pub source_url: Option<String>,
    /// Generated reasoning text shown to the reviewer.
    pub reasoning: String,
    /// Snapshot of the original item.
    pub item_context: ItemContext,
    /// Current lifecycle status.
    pub status: SuggestionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set once when the suggestion is approved or rejected.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Identifier of the task created on approval.
    pub created_task_id: Option<String>,
    /// Account the originating item was polled from.
    pub account_id: Option<String>,
}

impl PendingSuggestion {
    /// Construct a new pending suggestion with a generated identifier.
    #[must_use]
    pub fn new(title: String, source: SourceType, confidence: f64, reasoning: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: None,
            priority: TaskPriority::Medium,
            due_date: None,
            tags: Vec::new(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            source_ref: None,
            source_url: None,
            reasoning,
            item_context: ItemContext::default(),
            status: SuggestionStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            created_task_id: None,
            account_id: None,
        }
    }
}
