use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors that can occur when calling the generateContent API
#[derive(Error, Debug)]
pub enum OracleApiError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Forbidden - permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown model or endpoint (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limit or quota exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// Server error (HTTP 5xx)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// The model returned no usable candidate (blocked, empty, truncated)
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Unknown or unexpected status
    #[error("Unknown error ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl OracleApiError {
    /// Map a non-success HTTP status and body to an error
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::InvalidRequest(body),
            StatusCode::UNAUTHORIZED => Self::InvalidApiKey,
            StatusCode::FORBIDDEN => Self::Forbidden(body),
            StatusCode::NOT_FOUND => Self::NotFound(body),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimitExceeded,
            s if s.is_server_error() => Self::ServerError(s, body),
            s => Self::UnknownError(s, body),
        }
    }

    /// Classify a transport error, separating timeouts
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(err)
        }
    }

    /// Returns true if this error is transient and should be retried
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_, _) | Self::Timeout | Self::NetworkError(_)
        )
    }

    /// Returns true if this is a permanent error that should not be retried
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::InvalidApiKey | Self::Forbidden(_) | Self::NotFound(_)
        )
    }
}

impl From<OracleApiError> for DomainError {
    fn from(err: OracleApiError) -> Self {
        Self::OracleFailed(err.to_string())
    }
}
