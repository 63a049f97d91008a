//! Webhook authentication for provider callbacks.
//!
//! Verifies detached Ed25519 signatures over the request id, user id,
//! timestamp and body digest, using keys from the provider's published key
//! set. Keys are cached process-wide and refreshed lazily.

pub mod clock;
pub mod config;
pub mod error;
pub mod key_cache;
pub mod metrics;
pub mod verifier;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::WebhookConfig;
pub use error::{WebhookError, WebhookResult};
pub use key_cache::{parse_key_set, KeyCache, VerificationKey};
pub use verifier::{envelope_from_headers, WebhookVerifier};
