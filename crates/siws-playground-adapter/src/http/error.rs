/*
[INPUT]:  Error sources (HTTP, JSON-RPC, serialization, URLs, addresses)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - transport and protocol errors
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Error type for RPC and backend communication
#[derive(Error, Debug)]
pub enum PlaygroundError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status
    #[error("API error (status {code}): {message}")]
    Api {
        code: u16,
        message: String,
        /// Machine-readable reason from the error body, if any
        reason: Option<String>,
    },

    /// JSON-RPC error object in the response
    #[error("RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Address is not a base58 32-byte public key
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    /// Request timed out
    #[error("Request timeout after {duration}s")]
    Timeout { duration: u64 },
}

impl PlaygroundError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            PlaygroundError::Http(_)
            | PlaygroundError::RateLimit { .. }
            | PlaygroundError::Timeout { .. }
            | PlaygroundError::InvalidResponse(_) => true,
            PlaygroundError::Api { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Get retry delay in seconds (if retryable)
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            PlaygroundError::RateLimit { retry_after } => Some(*retry_after),
            PlaygroundError::Timeout { .. } => Some(1),
            _ => None,
        }
    }

    /// Backend rejected the request itself rather than failing to answer
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, PlaygroundError::Api { code, .. } if (400..500).contains(code) && *code != 429)
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        PlaygroundError::Api {
            code: status.as_u16(),
            message: message.into(),
            reason: None,
        }
    }
}

/// Result type alias for RPC and backend operations
pub type Result<T> = std::result::Result<T, PlaygroundError>;
