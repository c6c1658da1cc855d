//! Structured output of the LLM extraction step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::TaskPriority;

/// The LLM's structured interpretation of one actionable item.
///
/// Carries no identity: an extracted task is consumed immediately by the
/// decision engine and never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ExtractedTask {
    /// Proposed task title.
    pub title: String,
    /// Proposed task description.
    pub description: Option<String>,
    /// Proposed priority band.
    pub priority: TaskPriority,
    /// Deadline detected in the item text, when any.
    pub due_date: Option<DateTime<Utc>>,
    /// Proposed tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Model confidence in `[0, 1]` that the item is really a task.
    pub confidence: f64,
}

impl ExtractedTask {
    /// Construct a candidate with the given title and confidence, clamping
    /// confidence into `[0, 1]`.
    #[must_use]
    pub fn new(title: String, confidence: f64) -> Self {
        Self {
            title,
            description: None,
            priority: TaskPriority::Medium,
            due_date: None,
            tags: Vec::new(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
