//! Resource API error types

use thiserror::Error;

/// Failures talking to the resource API. Expected rejections (validation,
/// conflicts) are not errors; they come back as a `MutationResponse`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, DNS, TLS, body read failures
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// Non-success status on a read endpoint
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Body was not JSON or had an unexpected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Worth offering the user a retry
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout | ApiError::MalformedResponse(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Network(format!("Connection error: {}", err))
        } else if err.is_decode() {
            ApiError::MalformedResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for resource API calls
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Timeout.is_transient());
        assert!(ApiError::Status { status: 503, message: String::new() }.is_transient());
        assert!(!ApiError::Status { status: 404, message: String::new() }.is_transient());
    }
}
