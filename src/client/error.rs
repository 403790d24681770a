//! Client Error Types
//!
//! Every failure of the API client is normalized into [`ClientError`].
//! Callers that need to show a specific message match on [`FailureKind`]
//! instead of raw status codes.

use thiserror::Error;

use crate::session::SessionError;

/// API client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Base URL not configured; raised before any request is built
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation needs a credential and none is stored; no request was sent
    #[error("Not logged in: please log in again")]
    AuthRequired,

    /// Non-2xx response, body truncated
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport failure (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Session store could not be written
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Coarse classification used for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No credential, or the backend rejected it (401)
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    Other,
}

impl ClientError {
    pub(crate) fn missing_base_url() -> Self {
        ClientError::Config(
            "backend URL is not set; set BOXBOOK_API_URL or [api] base_url in the config file"
                .to_string(),
        )
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::AuthRequired => FailureKind::Unauthorized,
            ClientError::Api { status: 401, .. } => FailureKind::Unauthorized,
            ClientError::Api { status: 403, .. } => FailureKind::Forbidden,
            ClientError::Api { status: 404, .. } => FailureKind::NotFound,
            _ => FailureKind::Other,
        }
    }

    /// True when the session should be treated as gone
    pub fn is_auth_failure(&self) -> bool {
        self.kind() == FailureKind::Unauthorized
    }
}

/// Keep at most `limit` characters of a response body
pub fn truncate_body(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
