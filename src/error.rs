//! Error types shared across the memory engine.
//!
//! [`EmbeddingError`] classifies provider failures so the retry policy can tell
//! transient ones apart; [`MemoryError`] is what store construction, insertion
//! and search return.

use thiserror::Error;

/// A failed embedding call.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider rate limit hit: {0}")]
    RateLimited(String),

    #[error("could not reach embedding provider: {0}")]
    Connection(String),

    #[error("embedding provider server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("embedding request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding inference failed: {0}")]
    Inference(String),
}

impl EmbeddingError {
    /// Rate limits, connection failures and server-side errors are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Connection(_) | Self::Server { .. }
        )
    }

    /// Classify a non-success HTTP status returned by a provider.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited(message),
            500..=599 => Self::Server { status, message },
            _ => Self::Rejected { status, message },
        }
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), err.to_string());
        }
        if err.is_connect() || err.is_timeout() || err.is_request() {
            return Self::Connection(err.to_string());
        }
        Self::InvalidResponse(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("missing optional dependency: {0}")]
    MissingDependency(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("failed to open memory database: {0}")]
    Open(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding dimension mismatch: index expects {expected}, provider produced {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index lock poisoned")]
    LockPoisoned,

    #[error("no async runtime available: {0}")]
    Runtime(String),
}
