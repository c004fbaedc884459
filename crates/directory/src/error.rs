//! Error types for the directory crate.

use thiserror::Error;

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the collaboration platform.
#[derive(Error, Debug)]
pub enum Error {
    /// Network failure, timeout, or a transient server error that outlived
    /// the retry budget.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The platform rejected the bearer credential.
    #[error("authorization rejected (HTTP {status}): {reason}")]
    Auth { status: u16, reason: String },

    /// The platform answered with an unexpected status or response shape.
    #[error("unexpected response from {endpoint}: {reason}")]
    Protocol { endpoint: String, reason: String },

    /// Client configuration is unusable.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl Error {
    /// Create a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create an auth error.
    pub fn auth(status: u16, reason: impl Into<String>) -> Self {
        Self::Auth {
            status,
            reason: reason.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Classify a reqwest failure. Body decode failures are protocol errors,
    /// everything else never got a usable answer from the platform.
    pub fn from_reqwest(endpoint: &str, err: &reqwest::Error) -> Self {
        if err.is_decode() {
            Self::protocol(endpoint, err.to_string())
        } else if err.is_timeout() {
            Self::transport(format!("request to {endpoint} timed out: {err}"))
        } else {
            Self::transport(format!("request to {endpoint} failed: {err}"))
        }
    }

    /// Check if this error is retryable.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this error means the credential needs attention.
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}
