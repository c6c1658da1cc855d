//! Registry of integration accounts with fault-isolated polling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::models::item::{ActionableItem, SourceType};
use crate::{AppError, Result};

use super::{Integration, IntegrationKey};

/// Outcome of polling one registered key.
#[derive(Debug, Clone)]
pub struct KeyPollOutcome {
    /// The key that was polled.
    pub key: IntegrationKey,
    /// Items the account returned; empty on failure.
    pub items: Vec<ActionableItem>,
    /// Wall-clock polling duration.
    pub duration: Duration,
    /// Error string when authentication or polling failed.
    pub error: Option<String>,
}

/// Holds every registered integration handle, addressed by key.
///
/// One key's failure is caught and reported per key; it never aborts
/// polling of the other keys.
pub struct IntegrationRegistry {
    handles: HashMap<IntegrationKey, Arc<dyn Integration>>,
    poll_timeout: Duration,
}

impl IntegrationRegistry {
    /// Construct an empty registry with the given per-key poll timeout.
    #[must_use]
    pub fn new(poll_timeout: Duration) -> Self {
        Self {
            handles: HashMap::new(),
            poll_timeout,
        }
    }

    /// Register a handle under its key.
    ///
    /// Duplicate keys are rejected: the first registration wins and the
    /// duplicate is skipped. Returns whether the handle was registered.
    pub fn register(&mut self, handle: Arc<dyn Integration>) -> bool {
        let key = handle.key().clone();
        if self.handles.contains_key(&key) {
            return false;
        }
        info!(%key, enabled = handle.enabled(), "integration registered");
        self.handles.insert(key, handle);
        true
    }

    /// Poll every enabled account concurrently, one timeout-guarded future
    /// per key, and report a per-key outcome.
    ///
    /// A key whose authentication or poll fails (or times out) produces an
    /// outcome with `error` set and no items; the other keys are
    /// unaffected. Ordering across keys is not guaranteed.
    pub async fn poll_all_detailed(&self) -> Vec<KeyPollOutcome> {
        let futures = self
            .handles
            .values()
            .filter(|handle| handle.enabled())
            .map(|handle| self.poll_key(Arc::clone(handle)));

        join_all(futures).await
    }

    /// Poll every enabled account and return the combined items.
    ///
    /// Failures are logged per key and excluded from the result; this call
    /// itself never fails.
    pub async fn poll_all(&self) -> Vec<ActionableItem> {
        self.poll_all_detailed()
            .await
            .into_iter()
            .flat_map(|outcome| outcome.items)
            .collect()
    }

    /// Poll a single registered key.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the key is unregistered, and the
    /// underlying `Auth`/`Poll` error if the account fails.
    pub async fn poll_one(&self, key: &IntegrationKey) -> Result<Vec<ActionableItem>> {
        let handle = self
            .handles
            .get(key)
            .ok_or_else(|| AppError::NotFound(format!("integration {key} not registered")))?;

        tokio::time::timeout(self.poll_timeout, async {
            if !handle.authenticate().await? {
                return Err(AppError::Auth(format!("account {key} not authenticated")));
            }
            handle.poll().await
        })
        .await
        .map_err(|_| {
            AppError::Poll(format!(
                "poll timed out after {}s",
                self.poll_timeout.as_secs()
            ))
        })?
    }

    /// Account ids registered for a source type, in stable order.
    #[must_use]
    pub fn list_accounts(&self, source: SourceType) -> Vec<String> {
        let mut accounts: Vec<String> = self
            .handles
            .keys()
            .filter(|key| key.source == source)
            .map(|key| key.account_id.clone())
            .collect();
        accounts.sort();
        accounts
    }

    /// Whether a source (or one specific account of it) is enabled.
    ///
    /// Without an account id, reports whether *any* account of the source
    /// is enabled.
    #[must_use]
    pub fn is_enabled(&self, source: SourceType, account_id: Option<&str>) -> bool {
        self.handles
            .iter()
            .filter(|(key, _)| key.source == source)
            .filter(|(key, _)| account_id.is_none_or(|id| key.account_id == id))
            .any(|(_, handle)| handle.enabled())
    }

    /// Distinct source types with at least one registered account, in
    /// fixed declaration order.
    #[must_use]
    pub fn source_types(&self) -> Vec<SourceType> {
        SourceType::all()
            .iter()
            .copied()
            .filter(|source| self.handles.keys().any(|key| key.source == *source))
            .collect()
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the registry has no registered keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Authenticate then poll one handle under the per-key timeout.
    async fn poll_key(&self, handle: Arc<dyn Integration>) -> KeyPollOutcome {
        let key = handle.key().clone();
        let started = Instant::now();

        let result = tokio::time::timeout(self.poll_timeout, async {
            if !handle.authenticate().await? {
                return Err(AppError::Auth(format!("account {} not authenticated", handle.key())));
            }
            handle.poll().await
        })
        .await;

        let outcome = match result {
            Ok(Ok(items)) => KeyPollOutcome {
                key,
                items,
                duration: started.elapsed(),
                error: None,
            },
            Ok(Err(err)) => KeyPollOutcome {
                key,
                items: Vec::new(),
                duration: started.elapsed(),
                error: Some(err.to_string()),
            },
            Err(_) => KeyPollOutcome {
                key,
                items: Vec::new(),
                duration: started.elapsed(),
                error: Some(format!(
                    "poll timed out after {}s",
                    self.poll_timeout.as_secs()
                )),
            },
        };

        if let Some(ref err) = outcome.error {
            warn!(key = %outcome.key, %err, "integration poll failed");
        }
        outcome
    }
}
