//! In-memory session state and the status snapshot payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters and timestamps for one agent process lifetime.
///
/// Owned exclusively by the coordinator; reset on every start and never
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct AgentSessionState {
    /// Whether scheduled jobs are currently running.
    pub running: bool,
    /// When the current session started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the last poll cycle finished.
    pub last_poll: Option<DateTime<Utc>>,
    /// When the last recommendation pass finished.
    pub last_recommendation: Option<DateTime<Utc>>,
    /// Tasks created this session.
    pub tasks_created: u64,
    /// Actionable items processed this session.
    pub items_processed: u64,
    /// Errors captured this session.
    pub errors: u64,
}

impl AgentSessionState {
    /// Reset every counter and timestamp for a fresh session start.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self {
            running: true,
            started_at: Some(now),
            ..Self::default()
        };
    }
}

/// Session counters included in the status payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SessionStats {
    /// Tasks created this session.
    pub tasks_created: u64,
    /// Actionable items processed this session.
    pub items_processed: u64,
    /// Errors captured this session.
    pub errors: u64,
}

/// Snapshot payload returned by the status operation.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    /// Whether the agent's scheduled jobs are running.
    pub running: bool,
    /// Autonomy level currently in force.
    pub autonomy_level: String,
    /// When the current session started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the last poll cycle finished.
    pub last_poll: Option<DateTime<Utc>>,
    /// When the last recommendation pass finished.
    pub last_recommendation: Option<DateTime<Utc>>,
    /// Session counters.
    pub session_stats: SessionStats,
    /// Suggestions awaiting review.
    pub pending_suggestion_count: u64,
    /// Priority recommendations awaiting review.
    pub pending_recommendation_count: u64,
    /// Enabled state per registered source type.
    pub sources: BTreeMap<String, bool>,
}
