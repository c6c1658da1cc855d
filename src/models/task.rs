//! Task model and lifecycle helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::item::SourceType;
use crate::{AppError, Result};

/// Lifecycle status for a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started.
    Pending,
    /// Actively being worked.
    InProgress,
    /// Finished; `completed_at` is set exactly once on this transition.
    Completed,
    /// Intentionally postponed.
    Deferred,
    /// Abandoned without completion.
    Cancelled,
}

impl TaskStatus {
    /// Stable snake_case name used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Deferred => "deferred",
            Self::Cancelled => "cancelled",
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
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "deferred" => Ok(Self::Deferred),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::Db(format!("invalid task status: {other}"))),
        }
    }

    /// Whether the task still participates in scoring and recommendations.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// Priority band for a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Drop-everything work.
    Critical,
    /// Important and time-sensitive.
    High,
    /// Default band.
    Medium,
    /// Nice to have.
    Low,
}

impl TaskPriority {
    /// Stable snake_case name used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse a snake_case priority name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` for an unrecognized priority name.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(AppError::Db(format!("invalid task priority: {other}"))),
        }
    }

    /// Map a free-form source priority hint into a band. Unknown hints land
    /// on `Medium`.
    #[must_use]
    pub fn from_hint(hint: &str) -> Self {
        match hint.to_ascii_lowercase().as_str() {
            "critical" | "urgent" => Self::Critical,
            "high" | "important" => Self::High,
            "low" | "minor" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// Origin channel a task was created from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    /// Created by hand.
    Manual,
    /// Harvested from a mailbox.
    Email,
    /// Harvested from Slack.
    Slack,
    /// Harvested from a calendar feed.
    Calendar,
    /// Harvested from meeting notes.
    MeetingNotes,
    /// Created directly by the agent (extraction fallback).
    Agent,
    /// Captured by voice.
    Voice,
}

impl TaskSource {
    /// Stable snake_case name used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Email => "email",
            Self::Slack => "slack",
            Self::Calendar => "calendar",
            Self::MeetingNotes => "meeting_notes",
            Self::Agent => "agent",
            Self::Voice => "voice",
        }
    }

    /// Parse a snake_case source name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` for an unrecognized source name.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "manual" => Ok(Self::Manual),
            "email" => Ok(Self::Email),
            "slack" => Ok(Self::Slack),
            "calendar" => Ok(Self::Calendar),
            "meeting_notes" => Ok(Self::MeetingNotes),
            "agent" => Ok(Self::Agent),
            "voice" => Ok(Self::Voice),
            other => Err(AppError::Db(format!("invalid task source: {other}"))),
        }
    }
}

impl From<SourceType> for TaskSource {
    /// Map an integration source onto the task origin channel.
    fn from(source: SourceType) -> Self {
        match source {
            SourceType::Gmail => Self::Email,
            SourceType::Slack => Self::Slack,
            SourceType::Granola => Self::MeetingNotes,
            SourceType::Calendar => Self::Calendar,
        }
    }
}

/// Task domain entity persisted in `SQLite`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    /// Unique record identifier.
    pub id: String,
    /// Short summary of the work.
    pub title: String,
    /// Longer context, when available.
    pub description: Option<String>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Priority band.
    pub priority: TaskPriority,
    /// Origin channel.
    pub source: TaskSource,
    /// Computed ranking value in `[0, 100]`.
    pub priority_score: f64,
    /// Deadline, when known.
    pub due_date: Option<DateTime<Utc>>,
    /// Linked initiative, when the task belongs to one.
    pub initiative_id: Option<String>,
    /// Tag set.
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Set exactly once on the transition into `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Account the originating item was polled from.
    pub account_id: Option<String>,
    /// Fingerprint of the originating source reference, for dedup.
    pub source_ref: Option<String>,
}

impl Task {
    /// Construct a new pending task with defaults and a generated identifier.
    #[must_use]
    pub fn new(title: String, source: TaskSource) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            source,
            priority_score: 0.0,
            due_date: None,
            initiative_id: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            account_id: None,
            source_ref: None,
        }
    }

    /// Determine whether a lifecycle transition is permitted.
    ///
    /// `Completed` is reachable only from `Pending` or `InProgress`; resolved
    /// terminal states never transition again.
    #[must_use]
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self.status, next),
            (TaskStatus::Pending, TaskStatus::InProgress | TaskStatus::Completed
                | TaskStatus::Deferred | TaskStatus::Cancelled)
                | (TaskStatus::InProgress, TaskStatus::Pending | TaskStatus::Completed
                    | TaskStatus::Deferred | TaskStatus::Cancelled)
                | (TaskStatus::Deferred, TaskStatus::Pending | TaskStatus::Cancelled)
        )
    }
}
