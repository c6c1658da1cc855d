//! Unit tests for the integration registry.
//!
//! Validates:
//! - Duplicate key registration is rejected (first wins)
//! - `poll_all` isolates one failing key from the others
//! - `poll_one` raises not-found for unregistered keys
//! - Account listing and enabled reporting

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use task_scout::integrations::{Integration, IntegrationKey, IntegrationRegistry};
use task_scout::models::item::{ActionableItem, ItemKind, SourceType};
use task_scout::{AppError, Result};

struct FakeIntegration {
    key: IntegrationKey,
    enabled: bool,
    items: Vec<ActionableItem>,
    failure: Option<String>,
}

impl FakeIntegration {
    fn new(source: SourceType, account: &str, items: Vec<ActionableItem>) -> Self {
        Self {
            key: IntegrationKey::new(source, account),
            enabled: true,
            items,
            failure: None,
        }
    }

    fn failing(source: SourceType, account: &str, message: &str) -> Self {
        Self {
            key: IntegrationKey::new(source, account),
            enabled: true,
            items: Vec::new(),
            failure: Some(message.to_owned()),
        }
    }

    fn disabled(source: SourceType, account: &str) -> Self {
        Self {
            key: IntegrationKey::new(source, account),
            enabled: false,
            items: Vec::new(),
            failure: None,
        }
    }
}

impl Integration for FakeIntegration {
    fn key(&self) -> &IntegrationKey {
        &self.key
    }

    fn enabled(&self) -> bool {
        self.enabled
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

fn item(source: SourceType, title: &str) -> ActionableItem {
    ActionableItem::new(ItemKind::Email, source, title.to_owned())
}

fn registry() -> IntegrationRegistry {
    IntegrationRegistry::new(Duration::from_secs(5))
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = registry();
    assert!(registry.register(Arc::new(FakeIntegration::new(
        SourceType::Gmail,
        "work",
        vec![]
    ))));
    assert!(!registry.register(Arc::new(FakeIntegration::new(
        SourceType::Gmail,
        "work",
        vec![]
    ))));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn one_failing_key_does_not_abort_poll_all() {
    let mut registry = registry();
    registry.register(Arc::new(FakeIntegration::failing(
        SourceType::Gmail,
        "broken",
        "token revoked",
    )));
    registry.register(Arc::new(FakeIntegration::new(
        SourceType::Slack,
        "team",
        vec![
            item(SourceType::Slack, "Reply to thread"),
            item(SourceType::Slack, "Post summary"),
        ],
    )));

    let items = registry.poll_all().await;
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.source == SourceType::Slack));
}

#[tokio::test]
async fn poll_all_detailed_reports_the_failure() {
    let mut registry = registry();
    registry.register(Arc::new(FakeIntegration::failing(
        SourceType::Gmail,
        "broken",
        "token revoked",
    )));

    let outcomes = registry.poll_all_detailed().await;
    assert_eq!(outcomes.len(), 1);
    let error = outcomes[0].error.as_deref().expect("error recorded");
    assert!(error.contains("token revoked"));
}

#[tokio::test]
async fn disabled_accounts_are_not_polled() {
    let mut registry = registry();
    registry.register(Arc::new(FakeIntegration::disabled(SourceType::Gmail, "off")));

    assert!(registry.poll_all_detailed().await.is_empty());
    assert!(!registry.is_enabled(SourceType::Gmail, None));
    // Disabled accounts still count as registered sources.
    assert_eq!(registry.source_types(), vec![SourceType::Gmail]);
}

#[tokio::test]
async fn poll_one_unknown_key_is_not_found() {
    let registry = registry();
    let err = registry
        .poll_one(&IntegrationKey::new(SourceType::Granola, "ghost"))
        .await
        .expect_err("unregistered");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn poll_one_returns_the_keys_items() {
    let mut registry = registry();
    registry.register(Arc::new(FakeIntegration::new(
        SourceType::Calendar,
        "personal",
        vec![item(SourceType::Calendar, "Dentist")],
    )));

    let items = registry
        .poll_one(&IntegrationKey::new(SourceType::Calendar, "personal"))
        .await
        .expect("poll");
    assert_eq!(items.len(), 1);
}

#[test]
fn list_accounts_is_sorted_per_source() {
    let mut registry = registry();
    registry.register(Arc::new(FakeIntegration::new(SourceType::Gmail, "work", vec![])));
    registry.register(Arc::new(FakeIntegration::new(SourceType::Gmail, "home", vec![])));
    registry.register(Arc::new(FakeIntegration::new(SourceType::Slack, "team", vec![])));

    assert_eq!(
        registry.list_accounts(SourceType::Gmail),
        vec!["home".to_owned(), "work".to_owned()]
    );
    assert_eq!(registry.list_accounts(SourceType::Granola), Vec::<String>::new());
}

#[test]
fn is_enabled_supports_specific_accounts() {
    let mut registry = registry();
    registry.register(Arc::new(FakeIntegration::new(SourceType::Gmail, "work", vec![])));
    registry.register(Arc::new(FakeIntegration::disabled(SourceType::Gmail, "old")));

    assert!(registry.is_enabled(SourceType::Gmail, None));
    assert!(registry.is_enabled(SourceType::Gmail, Some("work")));
    assert!(!registry.is_enabled(SourceType::Gmail, Some("old")));
    assert!(!registry.is_enabled(SourceType::Slack, None));
}
