//! Actionable items surfaced by integration polling.
//!
//! An [`ActionableItem`] is ephemeral: it lives for exactly one poll cycle
//! and is consumed by the extraction step. Nothing in this module is
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// External source category an integration account belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Gmail mailbox.
    Gmail,
    /// Slack workspace channels and mentions.
    Slack,
    /// Granola meeting-notes cache.
    Granola,
    /// Calendar event feed.
    Calendar,
}

impl SourceType {
    /// Stable snake_case name used in persistence and log output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Slack => "slack",
            Self::Granola => "granola",
            Self::Calendar => "calendar",
        }
    }

    /// Parse a snake_case source name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unrecognized source name.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "gmail" => Ok(Self::Gmail),
            "slack" => Ok(Self::Slack),
            "granola" => Ok(Self::Granola),
            "calendar" => Ok(Self::Calendar),
            other => Err(AppError::Config(format!("invalid source type: {other}"))),
        }
    }

    /// All source types, in fixed declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Gmail, Self::Slack, Self::Granola, Self::Calendar]
    }

    /// Whether accounts of this source need a bearer token at runtime.
    ///
    /// Granola reads a local cache file and needs no credential.
    #[must_use]
    pub fn requires_token(self) -> bool {
        !matches!(self, Self::Granola)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the underlying artifact an item was derived from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// An email message.
    Email,
    /// A chat message or mention.
    Message,
    /// A meeting note or transcript fragment.
    MeetingNote,
    /// A calendar event.
    Event,
}

/// A candidate unit of work surfaced by polling one integration account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ActionableItem {
    /// Artifact shape this item was derived from.
    pub kind: ItemKind,
    /// Short human-readable summary (subject line, message preview, event name).
    pub title: String,
    /// Longer body text, when the source provides one.
    pub description: Option<String>,
    /// Source category that produced the item.
    pub source: SourceType,
    /// Source-side identifier (message id, event id) for dedup and links.
    pub source_ref: Option<String>,
    /// Due-date hint detected by the source (event start, deadline phrase).
    pub due_hint: Option<DateTime<Utc>>,
    /// Free-form priority hint string from the source (`high`, `normal`, ...).
    pub priority_hint: String,
    /// Source-provided tags or labels.
    pub tags: Vec<String>,
    /// Free-form metadata blob (sender, channel, attendees, ...).
    pub metadata: serde_json::Value,
    /// Account the item was polled from.
    pub account_id: Option<String>,
}

impl ActionableItem {
    /// Construct a minimal item for the given source and title.
    #[must_use]
    pub fn new(kind: ItemKind, source: SourceType, title: String) -> Self {
        Self {
            kind,
            title,
            description: None,
            source,
            source_ref: None,
            due_hint: None,
            priority_hint: "normal".to_owned(),
            tags: Vec::new(),
            metadata: serde_json::Value::Null,
            account_id: None,
        }
    }

    /// Known sender or author extracted from the metadata blob, if present.
    #[must_use]
    pub fn sender(&self) -> Option<&str> {
        self.metadata.get("sender").and_then(serde_json::Value::as_str)
    }
}
