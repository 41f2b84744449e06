//! Error types for the igapi client.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by the igapi client.
#[derive(Error, Debug)]
pub enum IgError {
    /// An authenticated endpoint was called before login completed.
    #[error("not logged in: {endpoint} requires an authenticated session")]
    NotAuthenticated {
        /// Endpoint (or operation) that was refused.
        endpoint: String,
    },

    /// Connection-level failure.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The API answered 429; the client already slept for `waited`.
    #[error("rate limited (429); backed off for {}s", waited.as_secs())]
    RateLimited {
        /// Backoff the client slept before giving up on this request.
        waited: Duration,
    },

    /// The API answered 400, optionally with an error envelope.
    #[error(
        "bad request (400){}{}",
        message.as_ref().map(|m| format!(": {m}")).unwrap_or_default(),
        error_type.as_ref().map(|t| format!(" [{t}]")).unwrap_or_default()
    )]
    BadRequest {
        /// `message` field of the error envelope.
        message: Option<String>,
        /// `error_type` field of the error envelope.
        error_type: Option<String>,
    },

    /// Any other non-200 status.
    #[error("API returned status {status}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body, for diagnostics.
        body: String,
    },

    /// The response could not be parsed, or an expected field was missing.
    #[error("malformed response: {reason}")]
    MalformedResponse {
        /// What was wrong with the response.
        reason: String,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A request payload failed validation before signing.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The credential store could not provide or erase credentials.
    #[error("credential store: {0}")]
    Credentials(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IgError {
    pub(crate) fn not_authenticated(endpoint: impl Into<String>) -> Self {
        IgError::NotAuthenticated {
            endpoint: endpoint.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        IgError::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Network-level failures a caller may reasonably re-issue.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IgError::Transport(_) | IgError::Timeout | IgError::RateLimited { .. }
        )
    }

    /// Programming errors that must never be swallowed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, IgError::NotAuthenticated { .. })
    }
}

/// Result type for igapi operations.
pub type Result<T> = std::result::Result<T, IgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_display_includes_envelope() {
        let err = IgError::BadRequest {
            message: Some("checkpoint_required".to_string()),
            error_type: Some("checkpoint_challenge_required".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "bad request (400): checkpoint_required [checkpoint_challenge_required]"
        );

        let bare = IgError::BadRequest {
            message: None,
            error_type: None,
        };
        assert_eq!(bare.to_string(), "bad request (400)");
    }

    #[test]
    fn classification() {
        assert!(IgError::Timeout.is_retryable());
        assert!(
            IgError::RateLimited {
                waited: Duration::from_secs(300)
            }
            .is_retryable()
        );
        assert!(!IgError::malformed("x").is_retryable());
        assert!(IgError::not_authenticated("feed/timeline/").is_fatal());
        assert!(!IgError::Timeout.is_fatal());
    }
}
