//! Global configuration parsing, validation, and credential loading.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::models::item::SourceType;
use crate::policy::AutonomyLevel;
use crate::{AppError, Result};

/// Keychain service name used for all stored credentials.
const KEYRING_SERVICE: &str = "task-scout";

/// One integration account entry from the `[[accounts]]` config array.
///
/// Bearer tokens are loaded at runtime via OS keychain or environment
/// variables, not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AccountConfig {
    /// Source category of the account.
    pub source: SourceType,
    /// Account identifier, unique per source type.
    pub account_id: String,
    /// Whether the account participates in poll cycles.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-source settings (Slack channel, Granola cache path, ...).
    #[serde(default)]
    pub settings: HashMap<String, String>,
    /// Bearer token for the source API (populated at runtime).
    #[serde(skip)]
    pub token: String,
}

impl AccountConfig {
    /// Keychain key / env-var stem for this account's token.
    #[must_use]
    fn credential_key(&self) -> String {
        format!("{}_{}_token", self.source.as_str(), self.account_id)
    }

    /// Env var name for this account's token, e.g. `TASK_SCOUT_GMAIL_WORK_TOKEN`.
    #[must_use]
    fn credential_env(&self) -> String {
        format!(
            "TASK_SCOUT_{}_{}_TOKEN",
            self.source.as_str().to_ascii_uppercase(),
            self.account_id.to_ascii_uppercase().replace('-', "_")
        )
    }
}

/// LLM extraction endpoint settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model identifier sent with each request.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API key (populated at runtime).
    #[serde(skip)]
    pub api_key: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: String::new(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".into()
}

/// Periodic job intervals (seconds).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct IntervalConfig {
    /// Poll cycle cadence.
    #[serde(default = "default_poll_interval")]
    pub poll_seconds: u64,
    /// Recommendation generation cadence.
    #[serde(default = "default_recommend_interval")]
    pub recommend_seconds: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_interval(),
            recommend_seconds: default_recommend_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    300
}

fn default_recommend_interval() -> u64 {
    1800
}

/// Configurable timeout values (seconds) for network-bound collaborators.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Per-account poll timeout.
    #[serde(default = "default_poll_timeout")]
    pub poll_seconds: u64,
    /// LLM extraction call timeout.
    #[serde(default = "default_extract_timeout")]
    pub extract_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_timeout(),
            extract_seconds: default_extract_timeout(),
        }
    }
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_extract_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> u32 {
    30
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory holding the database, lock file, and decision logs.
    pub data_dir: PathBuf,
    /// Autonomy level applied at startup unless overridden on the CLI.
    #[serde(default)]
    pub autonomy: AutonomyLevel,
    /// Registered integration accounts.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    /// Periodic job cadences.
    #[serde(default)]
    pub intervals: IntervalConfig,
    /// Timeouts for network-bound calls.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// LLM extraction endpoint.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Days after resolution before suggestions and recommendations are purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load integration and LLM credentials from the OS keychain with
    /// env-var fallback.
    ///
    /// A missing account token is logged and left empty; the account then
    /// fails authentication at poll time and is skipped for that cycle,
    /// keeping one unconfigured account from blocking startup. A missing LLM
    /// key is likewise tolerated; extraction falls back per autonomy policy.
    pub async fn load_credentials(&mut self) {
        for account in &mut self.accounts {
            if !account.enabled || !account.source.requires_token() {
                continue;
            }
            let key = account.credential_key();
            let env_key = account.credential_env();
            match load_credential(&key, &env_key).await {
                Ok(token) => account.token = token,
                Err(err) => {
                    warn!(source = %account.source, account = %account.account_id, %err,
                        "account token unavailable; account will fail authentication");
                }
            }
        }

        match load_credential("llm_api_key", "TASK_SCOUT_LLM_API_KEY").await {
            Ok(key) => self.llm.api_key = key,
            Err(err) => {
                warn!(%err, "LLM API key unavailable; extraction will fail until configured");
            }
        }
    }

    /// Path to the `SQLite` database file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("task-scout.db")
    }

    /// Path to the single-instance lock file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join("agent.lock")
    }

    /// Directory for daily-rotated decision logs.
    #[must_use]
    pub fn decision_log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    fn validate(&mut self) -> Result<()> {
        if self.intervals.poll_seconds == 0 {
            return Err(AppError::Config(
                "intervals.poll_seconds must be greater than zero".into(),
            ));
        }
        if self.intervals.recommend_seconds == 0 {
            return Err(AppError::Config(
                "intervals.recommend_seconds must be greater than zero".into(),
            ));
        }
        if self.timeouts.poll_seconds == 0 || self.timeouts.extract_seconds == 0 {
            return Err(AppError::Config(
                "timeout values must be greater than zero".into(),
            ));
        }

        fs::create_dir_all(&self.data_dir)
            .map_err(|err| AppError::Config(format!("cannot create data_dir: {err}")))?;
        let canonical = self
            .data_dir
            .canonicalize()
            .map_err(|err| AppError::Config(format!("data_dir invalid: {err}")))?;
        self.data_dir = canonical;

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // Try OS keychain first via spawn_blocking (keyring is synchronous I/O).
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    // Fallback to environment variable.
    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}
