//! API client errors.

use thiserror::Error;

/// Errors returned by [`crate::Client`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token exchange was rejected.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },
    /// The service answered outside 2xx.
    #[error("status code was not 2xx: {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// A precondition failed before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The session was already revoked.
    #[error("session is closed")]
    SessionClosed,
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Status code of an [`ApiError::HttpStatus`].
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
