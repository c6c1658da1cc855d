//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with `SQLite`.
    Db(String),
    /// Credential or token problem while authenticating an integration.
    Auth(String),
    /// Network or API failure while polling an integration account.
    Poll(String),
    /// LLM extraction call failure.
    Extraction(String),
    /// Another agent instance already holds the lock, or the operation
    /// conflicts with the current lifecycle state.
    Conflict(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Suggestion or recommendation has already been resolved.
    AlreadyResolved(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Auth(msg) => write!(f, "auth: {msg}"),
            Self::Poll(msg) => write!(f, "poll: {msg}"),
            Self::Extraction(msg) => write!(f, "extraction: {msg}"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::AlreadyResolved(msg) => write!(f, "already resolved: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
