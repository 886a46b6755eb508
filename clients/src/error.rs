//! Error types for the wallet API clients

use reqwest::StatusCode;
use thiserror::Error;
use wallet_e2e_core::error::{ApiErrorBody, ErrorCode};

/// Errors that can occur when calling a wallet platform API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request could not be sent or the response could not be read
    #[error("Request to {endpoint} failed: {reason}")]
    Transport {
        /// Endpoint path
        endpoint: String,
        /// Underlying error
        reason: String,
    },

    /// API answered with a non-success status
    #[error("API error from {endpoint} (status {status}): {body}")]
    Api {
        /// Endpoint path
        endpoint: String,
        /// HTTP status code
        status: StatusCode,
        /// Raw response body
        body: String,
        /// Structured error body, when the API sent one
        error: Option<ApiErrorBody>,
    },

    /// Success response did not match the expected shape
    #[error("Failed to decode response from {endpoint}: {reason}")]
    Decode {
        /// Endpoint path
        endpoint: String,
        /// Underlying serde error
        reason: String,
    },

    /// Client could not be built from its configuration
    #[error("Invalid client configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status of an API error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Platform error code of an API error.
    #[must_use]
    pub fn error_code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Api {
                error: Some(body), ..
            } => Some(&body.code),
            _ => None,
        }
    }

    /// Whether this is a `400 Bad Request` carrying `code`.
    #[must_use]
    pub fn is_bad_request_with(&self, code: &ErrorCode) -> bool {
        self.status() == Some(StatusCode::BAD_REQUEST) && self.error_code() == Some(code)
    }

    pub(crate) fn transport(endpoint: &str, err: &reqwest::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn api(endpoint: &str, status: StatusCode, body: String) -> Self {
        let error = ApiErrorBody::parse(&body);
        Self::Api {
            endpoint: endpoint.to_string(),
            status,
            body,
            error,
        }
    }
}
