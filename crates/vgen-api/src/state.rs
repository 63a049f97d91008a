//! Application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use vgen_models::PollResult;
use vgen_webhook::{WebhookResult, WebhookVerifier};

use crate::config::ApiConfig;

/// A verified webhook delivery mapped to a poll result.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookUpdate {
    pub request_id: String,
    pub result: PollResult,
    pub received_at: DateTime<Utc>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub verifier: Arc<WebhookVerifier>,
    pub updates: broadcast::Sender<WebhookUpdate>,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: ApiConfig) -> WebhookResult<Self> {
        let verifier = WebhookVerifier::from_env()?;
        Ok(Self::with_verifier(config, Arc::new(verifier)))
    }

    pub fn with_verifier(config: ApiConfig, verifier: Arc<WebhookVerifier>) -> Self {
        let (updates, _) = broadcast::channel(config.update_channel_capacity);
        Self {
            config,
            verifier,
            updates,
        }
    }

    /// Subscribe to verified webhook updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WebhookUpdate> {
        self.updates.subscribe()
    }
}
