//! Client error type.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use envanter_core::ValidationError;

/// Errors returned by [`ApiClient`](crate::ApiClient) calls.
///
/// `Display` gives a single message suitable for a notification.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connection refused, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{status}: {detail}")]
    Status { status: StatusCode, detail: String },

    /// The response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Input or decoded response data breaks a domain rule.
    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationError),

    /// A call that needs a session was made before logging in.
    #[error("Not signed in")]
    NotSignedIn,

    /// The base URL could not be used.
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// The HTTP status, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }

    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN)
    }

    /// True for 401 and for calls made without a session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::NotSignedIn) || self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Build a `Status` error from a response body, using its `detail`
    /// field when present.
    pub(crate) fn from_response(status: StatusCode, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            detail: String,
        }

        let detail = serde_json::from_slice::<ErrorBody>(body).map_or_else(
            |_| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("error").to_string()
                } else {
                    text
                }
            },
            |b| b.detail,
        );

        Self::Status { status, detail }
    }
}
