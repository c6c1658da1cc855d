//! Integration handles and the account registry.
//!
//! The [`Integration`] trait decouples the poll-cycle coordinator from the
//! concrete wire protocols of each external source. Every registered
//! account is addressed by an immutable (source-type, account-id)
//! [`IntegrationKey`]; polling failures are isolated per key.

pub mod calendar;
pub mod gmail;
pub mod granola;
pub mod registry;
pub mod slack;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GlobalConfig;
use crate::models::item::{ActionableItem, SourceType};
use crate::Result;

pub use registry::IntegrationRegistry;

/// Immutable addressing unit for one registered integration account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub struct IntegrationKey {
    /// Source category of the account.
    pub source: SourceType,
    /// Account identifier, unique per source type.
    pub account_id: String,
}

impl IntegrationKey {
    /// Construct a key for the given source and account.
    #[must_use]
    pub fn new(source: SourceType, account_id: impl Into<String>) -> Self {
        Self {
            source,
            account_id: account_id.into(),
        }
    }
}

impl std::fmt::Display for IntegrationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source, self.account_id)
    }
}

/// One polled external account.
///
/// Implementations are held as trait objects by the registry, so the async
/// methods return boxed futures rather than using `async fn`.
pub trait Integration: Send + Sync {
    /// The (source-type, account-id) key this handle is registered under.
    fn key(&self) -> &IntegrationKey;

    /// Whether the account participates in poll cycles.
    fn enabled(&self) -> bool;

    /// Verify the account's credentials are usable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Auth`](crate::AppError::Auth) on a credential or
    /// token problem.
    fn authenticate(&self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>>;

    /// Poll the account for actionable items.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Poll`](crate::AppError::Poll) on a network or
    /// API failure.
    fn poll(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ActionableItem>>> + Send + '_>>;
}

/// Build the registry from the configured accounts.
///
/// Unknown or disabled accounts still register (the registry reports them
/// through `is_enabled`), and duplicate (source, account) pairs are
/// rejected by the registry itself.
///
/// # Errors
///
/// Returns `AppError::Config` if the shared HTTP client cannot be built.
pub fn build_registry(config: &GlobalConfig) -> Result<IntegrationRegistry> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeouts.poll_seconds))
        .build()
        .map_err(|err| crate::AppError::Config(format!("cannot build http client: {err}")))?;

    let mut registry = IntegrationRegistry::new(Duration::from_secs(config.timeouts.poll_seconds));
    for account in &config.accounts {
        let handle: Arc<dyn Integration> = match account.source {
            SourceType::Gmail => Arc::new(gmail::GmailIntegration::new(account, client.clone())),
            SourceType::Slack => Arc::new(slack::SlackIntegration::new(account, client.clone())),
            SourceType::Calendar => {
                Arc::new(calendar::CalendarIntegration::new(account, client.clone()))
            }
            SourceType::Granola => Arc::new(granola::GranolaIntegration::new(account)),
        };
        if !registry.register(handle) {
            warn!(source = %account.source, account = %account.account_id,
                "duplicate account registration skipped");
        }
    }
    Ok(registry)
}
