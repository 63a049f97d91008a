//! Shared data models for the video generation provider adapter.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests and submission handles
//! - Canonical job status and poll results
//! - Model specs and the read-only model catalog
//! - Signed webhook envelopes

pub mod catalog;
pub mod job;
pub mod job_status;
pub mod model_spec;
pub mod poll;
pub mod webhook;

// Re-export common types
pub use catalog::{ModelCatalog, StaticCatalog};
pub use job::{AdvancedParams, InputAssets, JobRequest, ProviderJob};
pub use job_status::JobStatus;
pub use model_spec::{ModelConstraints, ModelDefaults, ModelSpec, RangeOption};
pub use poll::{PollResult, VideoAsset};
pub use webhook::WebhookEnvelope;
