//! Webhook authenticator configuration.

use std::time::Duration;

/// Published key-set endpoint.
pub const DEFAULT_JWKS_URL: &str = "https://rest.alpha.fal.ai/.well-known/jwks.json";
/// Key-set cache lifetime (24 hours).
pub const DEFAULT_KEY_TTL_SECS: u64 = 86_400;
/// Maximum distance between the signed timestamp and now.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Webhook authenticator configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Key-set URL
    pub jwks_url: String,
    /// How long fetched keys stay fresh
    pub key_ttl: Duration,
    /// Accepted clock skew in seconds, either direction
    pub tolerance_secs: i64,
    /// Timeout for the key-set request
    pub fetch_timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            key_ttl: Duration::from_secs(DEFAULT_KEY_TTL_SECS),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl WebhookConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            jwks_url: std::env::var("FAL_JWKS_URL")
                .ok()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_JWKS_URL.to_string()),
            key_ttl: Duration::from_secs(
                std::env::var("FAL_JWKS_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_KEY_TTL_SECS),
            ),
            tolerance_secs: std::env::var("FAL_WEBHOOK_TOLERANCE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TOLERANCE_SECS),
            fetch_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }
}
