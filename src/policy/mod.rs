//! Autonomy policy — levels and the task-creation decision gate.
//!
//! The autonomy level controls how much human approval is required before
//! the agent turns an extracted candidate into a task. Levels are strictly
//! ordered by automation: `Suggest < AutoLow < Auto = Full`.

pub mod decision;

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Policy knob controlling how much human approval task creation requires.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyLevel {
    /// Every candidate is queued for human review.
    #[default]
    Suggest,
    /// High-confidence candidates are auto-created; the rest are queued.
    AutoLow,
    /// Every candidate is auto-created.
    Auto,
    /// Like `Auto`, and additionally authorizes automatic priority
    /// adjustments from the recommendation job.
    Full,
}

impl AutonomyLevel {
    /// Stable snake_case name used in config, persistence, and the CLI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suggest => "suggest",
            Self::AutoLow => "auto_low",
            Self::Auto => "auto",
            Self::Full => "full",
        }
    }

    /// Parse a snake_case level name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unrecognized level string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "suggest" => Ok(Self::Suggest),
            "auto_low" => Ok(Self::AutoLow),
            "auto" => Ok(Self::Auto),
            "full" => Ok(Self::Full),
            other => Err(AppError::Config(format!("invalid autonomy level: {other}"))),
        }
    }

    /// Whether extraction failures may fall back to creating a basic task
    /// directly from the polled item.
    #[must_use]
    pub fn allows_fallback_create(self) -> bool {
        matches!(self, Self::Auto | Self::Full)
    }

    /// Whether diverging priority recommendations are applied without review.
    #[must_use]
    pub fn allows_auto_adjustment(self) -> bool {
        matches!(self, Self::Full)
    }
}

impl std::fmt::Display for AutonomyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub use decision::{decide, Decision};
