//! Webhook authentication error types.

use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Errors raised while obtaining verification keys.
///
/// A bad signature is never an error; `verify` returns `false` for it.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Key set request failed ({status}): {body}")]
    KeyFetch { status: u16, body: String },

    #[error("Invalid key set: {0}")]
    InvalidKeySet(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WebhookError {
    pub fn invalid_key_set(msg: impl Into<String>) -> Self {
        Self::InvalidKeySet(msg.into())
    }

    /// Check if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WebhookError::KeyFetch { status, .. } => *status == 429 || *status >= 500,
            WebhookError::Network(_) => true,
            _ => false,
        }
    }
}
