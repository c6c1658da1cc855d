//! Shared fixtures for agent integration tests.
//!
//! Mock integrations and extractors replace the network-bound
//! collaborators; the agent itself runs against an in-memory database
//! and a temp-dir lock file.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use task_scout::agent::Agent;
use task_scout::audit::NullAuditLogger;
use task_scout::config::{GlobalConfig, IntervalConfig, LlmConfig, TimeoutConfig};
use task_scout::extract::{ExtractionContext, Extractor};
use task_scout::integrations::{Integration, IntegrationKey, IntegrationRegistry};
use task_scout::models::extraction::ExtractedTask;
use task_scout::models::item::{ActionableItem, ItemKind, SourceType};
use task_scout::persistence::{db, SqlitePool};
use task_scout::policy::AutonomyLevel;
use task_scout::{AppError, Result};

/// An integration handle that returns canned items or a canned failure.
pub struct StaticIntegration {
    key: IntegrationKey,
    items: Vec<ActionableItem>,
    failure: Option<String>,
}

impl StaticIntegration {
    pub fn new(source: SourceType, account: &str, items: Vec<ActionableItem>) -> Self {
        Self {
            key: IntegrationKey::new(source, account),
            items,
            failure: None,
        }
    }

    pub fn failing(source: SourceType, account: &str, message: &str) -> Self {
        Self {
            key: IntegrationKey::new(source, account),
            items: Vec::new(),
            failure: Some(message.to_owned()),
        }
    }
}

impl Integration for StaticIntegration {
    fn key(&self) -> &IntegrationKey {
        &self.key
    }

    fn enabled(&self) -> bool {
        true
    }

    fn authenticate(&self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(async { Ok(true) })
    }

    fn poll(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ActionableItem>>> + Send + '_>> {
        let result = match self.failure {
            Some(ref message) => Err(AppError::Poll(message.clone())),
            None => Ok(self.items.clone()),
        };
        Box::pin(async move { result })
    }
}

/// An extractor that returns the same canned candidates for every item,
/// or fails every call.
pub struct StaticExtractor {
    candidates: Vec<ExtractedTask>,
    failure: bool,
}

impl StaticExtractor {
    pub fn new(candidates: Vec<ExtractedTask>) -> Self {
        Self {
            candidates,
            failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            candidates: Vec::new(),
            failure: true,
        }
    }
}

impl Extractor for StaticExtractor {
    fn extract<'a>(
        &'a self,
        _text: &'a str,
        _source: SourceType,
        _context: Option<&'a ExtractionContext>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ExtractedTask>>> + Send + 'a>> {
        let result = if self.failure {
            Err(AppError::Extraction("model unavailable".to_owned()))
        } else {
            Ok(self.candidates.clone())
        };
        Box::pin(async move { result })
    }
}

/// One polled item with a stable source reference.
pub fn sample_item(source: SourceType, title: &str) -> ActionableItem {
    let mut item = ActionableItem::new(ItemKind::Email, source, title.to_owned());
    item.description = Some(format!("{title} body text"));
    item.source_ref = Some(format!("ref-{}", title.to_ascii_lowercase().replace(' ', "-")));
    item.account_id = Some("work".to_owned());
    item
}

pub fn test_config(data_dir: std::path::PathBuf, autonomy: AutonomyLevel) -> GlobalConfig {
    GlobalConfig {
        data_dir,
        autonomy,
        accounts: Vec::new(),
        intervals: IntervalConfig::default(),
        timeouts: TimeoutConfig::default(),
        llm: LlmConfig::default(),
        retention_days: 30,
    }
}

/// Build an agent over mocks, an in-memory database, and a temp data dir.
///
/// The returned `TempDir` must be kept alive for the agent's lock file
/// to stay writable.
pub async fn build_agent(
    registry: IntegrationRegistry,
    extractor: Arc<dyn Extractor>,
    autonomy: AutonomyLevel,
) -> (Arc<Agent>, Arc<SqlitePool>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Arc::new(test_config(dir.path().to_path_buf(), autonomy));
    let pool = Arc::new(db::connect_memory().await.expect("db"));
    let agent = Agent::new(
        config,
        registry,
        extractor,
        Arc::new(NullAuditLogger),
        Arc::clone(&pool),
    );
    (agent, pool, dir)
}

pub fn empty_registry() -> IntegrationRegistry {
    IntegrationRegistry::new(Duration::from_secs(5))
}

pub fn registry_with(handles: Vec<StaticIntegration>) -> IntegrationRegistry {
    let mut registry = empty_registry();
    for handle in handles {
        registry.register(Arc::new(handle));
    }
    registry
}
