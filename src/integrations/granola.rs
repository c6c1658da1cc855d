//! Granola integration — reads action items from the local meeting-notes cache.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use serde::Deserialize;

use crate::config::AccountConfig;
use crate::models::item::{ActionableItem, ItemKind, SourceType};
use crate::{AppError, Result};

use super::{Integration, IntegrationKey};

/// Open-checkbox marker Granola writes for unresolved action items.
const ACTION_MARKER: &str = "- [ ]";

/// Reads the Granola meeting-notes cache file and surfaces open action
/// items as actionable items. No network or credential involved.
pub struct GranolaIntegration {
    key: IntegrationKey,
    enabled: bool,
    cache_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct NotesCache {
    #[serde(default)]
    documents: Vec<NoteDocument>,
}

#[derive(Deserialize)]
struct NoteDocument {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    notes: String,
}

impl GranolaIntegration {
    /// Construct a handle for one configured Granola cache.
    #[must_use]
    pub fn new(account: &AccountConfig) -> Self {
        Self {
            key: IntegrationKey::new(SourceType::Granola, account.account_id.clone()),
            enabled: account.enabled,
            cache_path: account.settings.get("cache_path").map(PathBuf::from),
        }
    }

    async fn read_cache(&self) -> Result<Vec<ActionableItem>> {
        let path = self.cache_path.as_ref().ok_or_else(|| {
            AppError::Poll(format!("no cache_path configured for {}", self.key))
        })?;
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| AppError::Poll(format!("cannot read granola cache: {err}")))?;
        let cache: NotesCache = serde_json::from_str(&raw)
            .map_err(|err| AppError::Poll(format!("granola cache decode failed: {err}")))?;

        let mut items = Vec::new();
        for document in &cache.documents {
            items.extend(self.document_items(document));
        }
        Ok(items)
    }

    /// Each open checkbox line in a note becomes one actionable item.
    fn document_items(&self, document: &NoteDocument) -> Vec<ActionableItem> {
        document
            .notes
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let trimmed = line.trim_start();
                let text = trimmed.strip_prefix(ACTION_MARKER)?.trim();
                if text.is_empty() {
                    return None;
                }
                let mut item = ActionableItem::new(
                    ItemKind::MeetingNote,
                    SourceType::Granola,
                    text.to_owned(),
                );
                item.description = document
                    .title
                    .as_ref()
                    .map(|title| format!("Action item from meeting: {title}"));
                item.source_ref = Some(format!("{}:{index}", document.id));
                item.account_id = Some(self.key.account_id.clone());
                item.metadata = serde_json::json!({
                    "meeting_title": document.title,
                });
                Some(item)
            })
            .collect()
    }
}

impl Integration for GranolaIntegration {
    fn key(&self) -> &IntegrationKey {
        &self.key
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn authenticate(&self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(async move {
            match self.cache_path {
                Some(ref path) if path.exists() => Ok(true),
                Some(ref path) => Err(AppError::Auth(format!(
                    "granola cache {} not found",
                    path.display()
                ))),
                None => Err(AppError::Auth(format!(
                    "no cache_path configured for {}",
                    self.key
                ))),
            }
        })
    }

    fn poll(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ActionableItem>>> + Send + '_>> {
        Box::pin(self.read_cache())
    }
}
