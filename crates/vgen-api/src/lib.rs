//! Axum webhook receiver.
//!
//! This crate provides:
//! - Signed provider callback verification
//! - Fan-out of mapped poll results to in-process subscribers
//! - Health and Prometheus endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::{create_router, WEBHOOK_PATH};
pub use state::{AppState, WebhookUpdate};
