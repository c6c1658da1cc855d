//! Initiative model — a grouping tasks can link into for scoring weight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, Result};

/// Priority band for an initiative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InitiativePriority {
    /// Top-of-mind effort.
    High,
    /// Ongoing effort.
    Medium,
    /// Background effort.
    Low,
}

impl InitiativePriority {
    /// Stable snake_case name used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
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
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(AppError::Db(format!("invalid initiative priority: {other}"))),
        }
    }
}

/// An initiative tasks can be linked to.
///
/// Only active initiatives contribute a scoring bonus to linked tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Initiative {
    /// Unique record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Priority band.
    pub priority: InitiativePriority,
    /// Whether the initiative is currently active.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Initiative {
    /// Construct a new active initiative with a generated identifier.
    #[must_use]
    pub fn new(name: String, priority: InitiativePriority) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            priority,
            active: true,
            created_at: Utc::now(),
        }
    }
}
