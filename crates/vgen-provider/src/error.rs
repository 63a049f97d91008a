//! Provider adapter error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while talking to the rendering provider.
///
/// A job that the provider reports as failed is not an error; it comes back
/// as a terminal `PollResult`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Validation(String),

    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider request timed out after {timeout_ms}ms. Retry or raise FAL_TIMEOUT_MS.")]
    Timeout { timeout_ms: u64 },

    #[error("Provider request failed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Provider host unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No endpoint answered for job {0}")]
    EndpointsExhausted(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Classify a transport error from reqwest.
    pub fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else if err.is_connect() {
            Self::Unreachable(err.to_string())
        } else {
            Self::Network(err)
        }
    }

    /// True if the endpoint fallback loop may move on to the next candidate.
    ///
    /// Only not-found, method-not-allowed, unauthorized and unresolvable
    /// hosts qualify. Everything else is a genuine fault.
    pub fn is_fallthrough(&self) -> bool {
        match self {
            ProviderError::Http { status, .. } => matches!(status, 401 | 404 | 405),
            ProviderError::Unreachable(_) => true,
            _ => false,
        }
    }

    /// Check if the caller may retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout { .. }
            | ProviderError::Unreachable(_)
            | ProviderError::Network(_) => true,
            ProviderError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }

    /// HTTP status associated with the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } => Some(*status),
            ProviderError::Timeout { .. } => Some(504),
            ProviderError::Validation(_) | ProviderError::UnknownEngine(_) => Some(400),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallthrough_classification() {
        assert!(ProviderError::http(404, "missing").is_fallthrough());
        assert!(ProviderError::http(405, "method").is_fallthrough());
        assert!(ProviderError::http(401, "denied").is_fallthrough());
        assert!(ProviderError::Unreachable("dns".into()).is_fallthrough());

        assert!(!ProviderError::http(400, "bad payload").is_fallthrough());
        assert!(!ProviderError::http(500, "boom").is_fallthrough());
        assert!(!ProviderError::Timeout { timeout_ms: 10 }.is_fallthrough());
        assert!(!ProviderError::validation("nope").is_fallthrough());
    }

    #[test]
    fn test_retryable() {
        assert!(ProviderError::http(503, "busy").is_retryable());
        assert!(ProviderError::http(429, "slow down").is_retryable());
        assert!(ProviderError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(!ProviderError::http(422, "bad").is_retryable());
        assert!(!ProviderError::validation("nope").is_retryable());
    }

    #[test]
    fn test_timeout_names_deadline() {
        let err = ProviderError::Timeout { timeout_ms: 300_000 };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("300000ms"));
    }

    #[test]
    fn test_http_error_embeds_status_and_body() {
        let err = ProviderError::http(422, r#"{"detail":"bad"}"#);
        assert_eq!(err.http_status(), Some(422));
        assert!(err.to_string().contains("422"));
        assert!(err.to_string().contains("detail"));
    }
}
