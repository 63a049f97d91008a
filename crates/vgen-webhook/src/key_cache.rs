//! Verification key-set cache.
//!
//! Keys are fetched from the provider's published key-set endpoint and kept
//! for a configurable TTL:
//! - Lazy refresh when empty or expired
//! - Single-flight refresh (double-checked write lock)
//! - Falls back to the previous keys if a refresh fails

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::WebhookConfig;
use crate::error::{WebhookError, WebhookResult};
use crate::metrics::record_key_refresh;

/// Raw public key material from the key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationKey {
    pub kid: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    #[serde(default)]
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    #[serde(default)]
    kty: Option<String>,
    #[serde(default)]
    crv: Option<String>,
    #[serde(default)]
    x: Option<String>,
    #[serde(default)]
    kid: Option<String>,
}

/// Cached key set with its fetch time.
struct CachedKeySet {
    keys: Arc<Vec<VerificationKey>>,
    fetched_at: i64,
}

impl CachedKeySet {
    fn is_fresh(&self, now: i64, ttl: Duration) -> bool {
        !self.keys.is_empty() && now.saturating_sub(self.fetched_at) < ttl.as_secs() as i64
    }
}

/// Process-wide key-set cache.
pub struct KeyCache {
    http: Client,
    jwks_url: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cache: RwLock<Option<CachedKeySet>>,
}

impl KeyCache {
    pub fn new(config: &WebhookConfig, clock: Arc<dyn Clock>) -> WebhookResult<Self> {
        let http = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!("vgen-webhook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(WebhookError::Network)?;

        Ok(Self {
            http,
            jwks_url: config.jwks_url.clone(),
            ttl: config.key_ttl,
            clock,
            cache: RwLock::new(None),
        })
    }

    /// Drop the cached keys; the next lookup refetches.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Number of keys currently held, fresh or stale.
    pub async fn cached_key_count(&self) -> usize {
        self.cache.read().await.as_ref().map_or(0, |cached| cached.keys.len())
    }

    /// Current keys, fetching them first if the cache is empty or expired.
    pub async fn get_keys(&self) -> WebhookResult<Arc<Vec<VerificationKey>>> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_fresh(self.clock.now_seconds(), self.ttl) {
                    return Ok(Arc::clone(&cached.keys));
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(self.clock.now_seconds(), self.ttl) {
                return Ok(Arc::clone(&cached.keys));
            }
        }

        self.refresh(&mut cache).await
    }

    async fn refresh(&self, cache: &mut Option<CachedKeySet>) -> WebhookResult<Arc<Vec<VerificationKey>>> {
        match self.fetch().await {
            Ok(keys) => {
                record_key_refresh("ok");
                debug!(count = keys.len(), url = %self.jwks_url, "Refreshed webhook key set");
                let keys = Arc::new(keys);
                *cache = Some(CachedKeySet {
                    keys: Arc::clone(&keys),
                    fetched_at: self.clock.now_seconds(),
                });
                Ok(keys)
            }
            Err(e) => {
                record_key_refresh("error");
                if let Some(cached) = cache.as_ref() {
                    if !cached.keys.is_empty() {
                        warn!(error = %e, "Key set refresh failed, using previous keys");
                        return Ok(Arc::clone(&cached.keys));
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> WebhookResult<Vec<VerificationKey>> {
        let response = self.http.get(&self.jwks_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(WebhookError::KeyFetch {
                status: status.as_u16(),
                body,
            });
        }

        let keys = parse_key_set(&body)?;
        if keys.is_empty() {
            return Err(WebhookError::invalid_key_set("no Ed25519 keys published"));
        }
        Ok(keys)
    }
}

/// Parse a JWKS document, keeping only Ed25519 keys.
pub fn parse_key_set(body: &str) -> WebhookResult<Vec<VerificationKey>> {
    let set: JwkSet = serde_json::from_str(body)?;

    Ok(set
        .keys
        .into_iter()
        .filter(|jwk| jwk.kty.as_deref() == Some("OKP") && jwk.crv.as_deref() == Some("Ed25519"))
        .filter_map(|jwk| {
            let x = jwk.x.as_deref()?.trim().trim_end_matches('=');
            match URL_SAFE_NO_PAD.decode(x) {
                Ok(bytes) => Some(VerificationKey { kid: jwk.kid, bytes }),
                Err(e) => {
                    warn!(kid = ?jwk.kid, error = %e, "Skipping undecodable key");
                    None
                }
            }
        })
        .collect())
}
