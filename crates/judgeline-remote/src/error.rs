//! Error types for the control server client and the artifact cache.

use std::time::Duration;

/// Remote errors.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Runner credentials rejected (401).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Endpoint or task not found (404).
    #[error("not found: {url}")]
    NotFound { url: String },

    /// Rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Network error or transient server failure (5xx).
    #[error("network error: {message}")]
    Network { message: String },

    /// Request rejected by the server (4xx other than the ones above).
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Cache error (bad download, unusable cache directory).
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Local storage layout error.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// Downloaded artifact does not match its content address.
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    /// Content address is not a SHA-256 hex digest.
    #[error("invalid hash: {hash:?}")]
    InvalidHash { hash: String },
}

impl RemoteError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::Unauthorized { .. } => 2,
            _ => 1,
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }

    pub(crate) fn storage(context: &str, err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{context}: {err}"),
        }
    }

    pub(crate) fn cache(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Cache {
            message: format!("{context}: {err}"),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::InvalidResponse {
                message: err.to_string(),
            };
        }
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
