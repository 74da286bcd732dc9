//! Error types for the Alpaca brokerage integration.

use thiserror::Error;

/// Errors that can occur when talking to Alpaca.
#[derive(Debug, Error)]
pub enum AlpacaError {
    /// Missing or invalid client configuration (credentials, URLs).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Structured error returned by the API (`{"code": .., "message": ..}`).
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from API.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit {
        /// Seconds to wait before retry.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Non-success response without a structured error body.
    #[error("unexpected response: {status_code} - {body}")]
    Unexpected {
        /// HTTP status code.
        status_code: u16,
        /// Raw response body, possibly empty.
        body: String,
    },

    /// Rejected request parameter (bad symbol, bad percentage).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AlpacaError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Creates an unexpected-response error.
    pub fn unexpected(status_code: u16, body: impl Into<String>) -> Self {
        Self::Unexpected {
            status_code,
            body: body.into(),
        }
    }

    /// Returns the HTTP status code carried by the error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } | Self::Unexpected { status_code, .. } => {
                Some(*status_code)
            }
            Self::RateLimit { .. } => Some(429),
            _ => None,
        }
    }

    /// Returns true if the error indicates the request should be retried later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit { .. } => true,
            Self::Api { status_code, .. } | Self::Unexpected { status_code, .. } => {
                *status_code >= 500
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AlpacaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AlpacaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Alpaca operations.
pub type Result<T> = std::result::Result<T, AlpacaError>;
