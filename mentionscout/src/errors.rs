//! Error types for mentionscout.
//!
//! Per-item and per-page failures are normally absorbed at their own
//! boundary and logged; this enum is what crosses those boundaries when a
//! caller does want to see them.

use thiserror::Error;

/// The main error type for mentionscout operations.
#[derive(Debug, Error)]
pub enum MentionScoutError {
    /// Required configuration is missing or still holds a placeholder.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A network or remote API failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A malformed URL or an unparseable response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The backing record store rejected an operation.
    #[error("Store error: {0}")]
    Store(String),

    /// A run was aborted part-way through. Records written before the
    /// failure are kept.
    #[error("Run aborted: {0}")]
    Fatal(#[source] Box<MentionScoutError>),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MentionScoutError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Wraps an error that aborted a run.
    pub fn fatal(cause: Self) -> Self {
        match cause {
            Self::Fatal(_) => cause,
            other => Self::Fatal(Box::new(other)),
        }
    }

    /// Whether this error should halt a run before any network call is made.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<serde_json::Error> for MentionScoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for MentionScoutError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MentionScoutError>;
