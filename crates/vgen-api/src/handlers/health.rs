//! Health check handler.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Verification keys held by the webhook key cache.
    pub cached_keys: usize,
    /// Live receivers of webhook updates.
    pub update_subscribers: usize,
}

/// Liveness check. Never fetches keys.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        cached_keys: state.verifier.key_cache().cached_key_count().await,
        update_subscribers: state.updates.receiver_count(),
    })
}
