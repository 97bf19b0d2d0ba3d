//! Error types for the authenticated client.
//!
//! # Design
//! Every failure is returned to the caller, never retried or logged here.
//! Each variant knows which status code it pairs with: 0 when no response
//! was received, otherwise the status the server sent. Non-200 responses keep
//! the raw body text so callers can see what the server said.

use thiserror::Error;

/// Errors returned by the login step and by every request helper.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `base_url + endpoint` (or the auth URL) is not a valid URL.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The request could not be constructed, e.g. a header value the HTTP
    /// layer rejects.
    #[error("failed to build request: {0}")]
    Request(String),

    /// The request could not be sent or no response arrived in time.
    #[error("request failed: {0}")]
    Transport(#[source] ureq::Error),

    /// A response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    ReadBody(#[source] ureq::Error),

    /// The server answered with a status other than 200.
    #[error("request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The 200 response body is not valid JSON for the requested type.
    #[error("failed to decode response: {source}")]
    Deserialization {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// A request payload could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The authentication endpoint answered with a status other than 200.
    #[error("authentication failed with status {status}")]
    AuthStatus { status: u16 },

    /// The authentication response has no string `token` field.
    #[error("token not found in authentication response")]
    TokenNotFound,
}

impl ApiError {
    /// Status code paired with this error; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::HttpStatus { status, .. }
            | ApiError::Deserialization { status, .. }
            | ApiError::AuthStatus { status } => *status,
            ApiError::TokenNotFound => 200,
            ApiError::InvalidUrl { .. }
            | ApiError::Request(_)
            | ApiError::Transport(_)
            | ApiError::ReadBody(_)
            | ApiError::Serialization(_) => 0,
        }
    }

    /// True when the server rejected the credentials or the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::HttpStatus { status: 401, .. } | ApiError::AuthStatus { status: 401 }
        )
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
