//! Per-source outcome records for one poll cycle.

use serde::{Deserialize, Serialize};

use crate::models::item::SourceType;

/// Aggregated outcome of processing one source type during a poll cycle.
///
/// One record is produced per *registered* source type, including sources
/// that returned zero items this cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PollResult {
    /// Source type this record covers.
    pub source: SourceType,
    /// Items returned by polling this source's accounts.
    pub items_found: usize,
    /// Identifiers of tasks auto-created from this source's items.
    pub tasks_created: Vec<String>,
    /// Identifiers of suggestions queued from this source's items.
    pub tasks_suggested: Vec<String>,
    /// Wall-clock time spent processing this source, in milliseconds.
    pub duration_ms: u64,
    /// Latest error captured while processing this source, when any.
    pub error: Option<String>,
}

impl PollResult {
    /// Construct an empty result for a source.
    #[must_use]
    pub fn empty(source: SourceType) -> Self {
        Self {
            source,
            items_found: 0,
            tasks_created: Vec::new(),
            tasks_suggested: Vec::new(),
            duration_ms: 0,
            error: None,
        }
    }
}
