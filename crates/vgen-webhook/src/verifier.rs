//! Ed25519 webhook signature verification.
//!
//! The signed message is the request id, user id, timestamp and hex SHA-256
//! of the raw body, joined by newlines. A delivery is accepted when any
//! published key verifies the signature.

use std::sync::Arc;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use reqwest::header::HeaderMap;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use vgen_models::webhook::{HEADER_REQUEST_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP, HEADER_USER_ID};
use vgen_models::WebhookEnvelope;

use crate::clock::{Clock, SystemClock};
use crate::config::WebhookConfig;
use crate::error::WebhookResult;
use crate::key_cache::KeyCache;
use crate::metrics::record_verification;

/// Webhook authenticator.
pub struct WebhookVerifier {
    keys: KeyCache,
    clock: Arc<dyn Clock>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    /// Create a verifier using the wall clock.
    pub fn new(config: WebhookConfig) -> WebhookResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: WebhookConfig, clock: Arc<dyn Clock>) -> WebhookResult<Self> {
        Ok(Self {
            keys: KeyCache::new(&config, Arc::clone(&clock))?,
            clock,
            tolerance_secs: config.tolerance_secs,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> WebhookResult<Self> {
        Self::new(WebhookConfig::from_env())
    }

    pub fn key_cache(&self) -> &KeyCache {
        &self.keys
    }

    /// Verify a delivery from its headers and exact body bytes.
    ///
    /// Returns `Ok(false)` for anything unauthentic. Errors only when key
    /// material cannot be obtained.
    pub async fn verify(&self, headers: &HeaderMap, raw_body: &[u8]) -> WebhookResult<bool> {
        match envelope_from_headers(headers, raw_body) {
            Some(envelope) => self.verify_envelope(&envelope).await,
            None => {
                debug!("Webhook rejected: missing signature headers");
                record_verification("missing_headers");
                Ok(false)
            }
        }
    }

    pub async fn verify_envelope(&self, envelope: &WebhookEnvelope) -> WebhookResult<bool> {
        let Some(timestamp) = envelope.timestamp_seconds() else {
            record_verification("bad_timestamp");
            return Ok(false);
        };

        let skew = self.clock.now_seconds().abs_diff(timestamp);
        if skew > self.tolerance_secs.unsigned_abs() {
            debug!(skew, "Webhook rejected: timestamp outside tolerance");
            record_verification("stale_timestamp");
            return Ok(false);
        }

        let Some(signature) = decode_signature(&envelope.signature_hex) else {
            record_verification("bad_signature");
            return Ok(false);
        };

        let keys = match self.keys.get_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                record_verification("key_error");
                return Err(e);
            }
        };

        let digest = hex::encode(Sha256::digest(&envelope.raw_body));
        let message = envelope.signed_message(&digest);

        for key in keys.iter() {
            let verifying_key = match <[u8; 32]>::try_from(key.bytes.as_slice())
                .ok()
                .and_then(|bytes| VerifyingKey::from_bytes(&bytes).ok())
            {
                Some(k) => k,
                None => {
                    warn!(kid = ?key.kid, len = key.bytes.len(), "Skipping malformed verification key");
                    continue;
                }
            };

            if verifying_key.verify(message.as_bytes(), &signature).is_ok() {
                record_verification("valid");
                return Ok(true);
            }
        }

        record_verification("invalid");
        Ok(false)
    }
}

/// Collect the signature headers into an envelope. `None` if any is missing.
pub fn envelope_from_headers(headers: &HeaderMap, raw_body: &[u8]) -> Option<WebhookEnvelope> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Some(WebhookEnvelope {
        request_id: header(HEADER_REQUEST_ID)?,
        user_id: header(HEADER_USER_ID)?,
        timestamp: header(HEADER_TIMESTAMP)?,
        signature_hex: header(HEADER_SIGNATURE)?,
        raw_body: raw_body.to_vec(),
    })
}

fn decode_signature(signature_hex: &str) -> Option<Signature> {
    let bytes = hex::decode(signature_hex.trim()).ok()?;
    let bytes: [u8; 64] = bytes.as_slice().try_into().ok()?;
    Some(Signature::from_bytes(&bytes))
}
