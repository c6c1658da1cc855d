//! Priority adjustment recommendations produced by the recommendation job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::TaskPriority;
use crate::{AppError, Result};

/// Lifecycle status for a priority recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    /// Awaiting operator review.
    Pending,
    /// The suggested priority was applied to the task.
    Applied,
    /// Operator declined the adjustment.
    Dismissed,
}

impl RecommendationStatus {
    /// Stable snake_case name used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Dismissed => "dismissed",
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
            "applied" => Ok(Self::Applied),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(AppError::Db(format!(
                "invalid recommendation status: {other}"
            ))),
        }
    }
}

/// A recorded divergence between a task's stored priority band and the
/// band its fresh score falls into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PriorityRecommendation {
    /// Unique record identifier.
    pub id: String,
    /// Task the adjustment targets.
    pub task_id: String,
    /// Priority band stored on the task at evaluation time.
    pub current_priority: TaskPriority,
    /// Priority band the fresh score maps into.
    pub suggested_priority: TaskPriority,
    /// Fresh score that produced the suggestion.
    pub score: f64,
    /// Human-readable explanation of the divergence.
    pub reason: String,
    /// Current lifecycle status.
    pub status: RecommendationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set once when the recommendation is applied or dismissed.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PriorityRecommendation {
    /// Construct a pending recommendation with a generated identifier.
    #[must_use]
    pub fn new(
        task_id: String,
        current_priority: TaskPriority,
        suggested_priority: TaskPriority,
        score: f64,
        reason: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id,
            current_priority,
            suggested_priority,
            score,
            reason,
            status: RecommendationStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}
