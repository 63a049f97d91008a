//! Video generation provider adapter.
//!
//! Translates generic generation requests into the provider's per-model
//! payloads, submits them to the provider queue, and polls jobs back into a
//! canonical `PollResult`:
//! - Per-engine payload builders with pre-network validation
//! - Queue submission with a distinct timeout error
//! - Status polling across ordered endpoint candidates
//! - Normalization of heterogeneous response shapes into a `VideoAsset`

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod metrics;
pub mod normalizer;
pub mod payload;
pub mod response;

pub use client::{ProviderClient, PROVIDER_NAME};
pub use config::ProviderConfig;
pub use endpoints::{poll_candidates, EndpointCandidate, EndpointKind};
pub use error::{ProviderError, ProviderResult};
pub use normalizer::extract_asset;
pub use payload::{Payload, PayloadBuilder, PayloadBuilders};
pub use response::map_poll_response;
