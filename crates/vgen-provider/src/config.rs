//! Provider adapter configuration.
//!
//! Base URLs are pinned to the provider's domains. Anything else, including
//! plain-HTTP provider hosts, falls back to the built-in default. Loopback
//! hosts are accepted over either scheme so local stubs can stand in.

use std::time::Duration;

use tracing::warn;
use url::Url;

/// Default synchronous API base.
pub const DEFAULT_API_BASE: &str = "https://fal.run";
/// Default queue API base.
pub const DEFAULT_QUEUE_BASE: &str = "https://queue.fal.run";
/// Default per-request deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;
/// Default path the webhook receiver is mounted at.
pub const DEFAULT_WEBHOOK_PATH: &str = "/api/fal/webhook";

const ALLOWED_HOSTS: &[&str] = &["fal.ai", "fal.run"];
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// Provider adapter configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider API key. Submission and polling fail without it.
    pub api_key: Option<String>,
    /// Synchronous API base (origin only)
    pub api_base: String,
    /// Queue API base (origin only)
    pub queue_base: String,
    /// Request verbose logs when polling
    pub request_logs: bool,
    /// Deadline for a whole submit or poll operation
    pub timeout: Duration,
    /// Connect timeout for each HTTP request
    pub connect_timeout: Duration,
    /// Default completion callback attached to submissions
    pub webhook_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            queue_base: DEFAULT_QUEUE_BASE.to_string(),
            request_logs: false,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            connect_timeout: Duration::from_secs(10),
            webhook_url: None,
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let api_key = ["FAL_KEY", "FAL_API_KEY"].iter().find_map(|name| {
            std::env::var(name)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        });

        let timeout_ms: u64 = std::env::var("FAL_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let connect_timeout_secs: u64 = std::env::var("FAL_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            api_key,
            api_base: normalize_base(std::env::var("FAL_API_BASE").ok().as_deref(), DEFAULT_API_BASE),
            queue_base: normalize_base(
                std::env::var("FAL_QUEUE_BASE").ok().as_deref(),
                DEFAULT_QUEUE_BASE,
            ),
            request_logs: std::env::var("FAL_QUEUE_LOGS_DEFAULT")
                .map(|v| v.trim() == "1")
                .unwrap_or(false),
            timeout: Duration::from_millis(timeout_ms),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            webhook_url: webhook_url_from_env(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point both bases at the same origin.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_base = base.clone();
        self.queue_base = base;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// Validate a configured base URL and reduce it to its origin.
///
/// Returns `fallback` when the value is missing, unparsable, or points at a
/// host outside the allow-list.
pub fn normalize_base(raw: Option<&str>, fallback: &str) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return fallback.to_string();
    };

    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            warn!(value = raw, error = %e, "Ignoring unparsable provider base URL");
            return fallback.to_string();
        }
    };

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let is_local = LOCAL_HOSTS.contains(&host.as_str());
    let is_provider = ALLOWED_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)));

    let allowed = match parsed.scheme() {
        "https" => is_provider || is_local,
        "http" => is_local,
        _ => false,
    };

    if !allowed {
        warn!(value = raw, "Provider base URL is not on the allow-list; using default");
        return fallback.to_string();
    }

    parsed.origin().ascii_serialization()
}

/// Build the default completion callback from the public app URL.
fn webhook_url_from_env() -> Option<String> {
    let app_url = std::env::var("APP_URL")
        .or_else(|_| std::env::var("NEXT_PUBLIC_APP_URL"))
        .ok()
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())?;

    let path = std::env::var("FAL_WEBHOOK_PATH")
        .ok()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());

    let path = if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    };

    Some(format!("{}{}", app_url, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "FAL_KEY",
        "FAL_API_KEY",
        "FAL_API_BASE",
        "FAL_QUEUE_BASE",
        "FAL_QUEUE_LOGS_DEFAULT",
        "FAL_TIMEOUT_MS",
        "FAL_CONNECT_TIMEOUT_SECS",
        "APP_URL",
        "NEXT_PUBLIC_APP_URL",
        "FAL_WEBHOOK_PATH",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_normalize_accepts_provider_hosts() {
        assert_eq!(
            normalize_base(Some("https://queue.fal.run/some/path?x=1"), DEFAULT_QUEUE_BASE),
            "https://queue.fal.run"
        );
        assert_eq!(
            normalize_base(Some("https://rest.alpha.fal.ai"), DEFAULT_API_BASE),
            "https://rest.alpha.fal.ai"
        );
    }

    #[test]
    fn test_normalize_rejects_foreign_and_plain_http() {
        assert_eq!(normalize_base(Some("https://evil.example.com"), DEFAULT_API_BASE), DEFAULT_API_BASE);
        assert_eq!(normalize_base(Some("https://notfal.run"), DEFAULT_API_BASE), DEFAULT_API_BASE);
        assert_eq!(normalize_base(Some("http://queue.fal.run"), DEFAULT_QUEUE_BASE), DEFAULT_QUEUE_BASE);
        assert_eq!(normalize_base(Some("not a url"), DEFAULT_API_BASE), DEFAULT_API_BASE);
        assert_eq!(normalize_base(None, DEFAULT_API_BASE), DEFAULT_API_BASE);
    }

    #[test]
    fn test_normalize_allows_loopback() {
        assert_eq!(
            normalize_base(Some("http://127.0.0.1:8089/"), DEFAULT_API_BASE),
            "http://127.0.0.1:8089"
        );
        assert_eq!(
            normalize_base(Some("http://localhost:3000"), DEFAULT_API_BASE),
            "http://localhost:3000"
        );
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = ProviderConfig::from_env();
        assert!(config.api_key.is_none());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.queue_base, DEFAULT_QUEUE_BASE);
        assert!(!config.request_logs);
        assert_eq!(config.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        clear_env();
        std::env::set_var("FAL_API_KEY", "  secret  ");
        std::env::set_var("FAL_QUEUE_BASE", "https://queue.fal.run/");
        std::env::set_var("FAL_QUEUE_LOGS_DEFAULT", "1");
        std::env::set_var("FAL_TIMEOUT_MS", "1500");
        std::env::set_var("APP_URL", "https://app.example.com/");
        std::env::set_var("FAL_WEBHOOK_PATH", "hooks/fal");

        let config = ProviderConfig::from_env();
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.queue_base, "https://queue.fal.run");
        assert!(config.request_logs);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://app.example.com/hooks/fal")
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_primary_key_wins() {
        clear_env();
        std::env::set_var("FAL_KEY", "primary");
        std::env::set_var("FAL_API_KEY", "secondary");
        assert_eq!(ProviderConfig::from_env().api_key.as_deref(), Some("primary"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_primary_key_falls_back() {
        clear_env();
        std::env::set_var("FAL_KEY", "  ");
        std::env::set_var("FAL_API_KEY", "secondary");
        assert_eq!(ProviderConfig::from_env().api_key.as_deref(), Some("secondary"));

        std::env::set_var("FAL_KEY", "");
        std::env::set_var("FAL_API_KEY", "");
        assert!(ProviderConfig::from_env().api_key.is_none());
        clear_env();
    }
}
