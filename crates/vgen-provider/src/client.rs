//! Provider HTTP client.
//!
//! Submits generation jobs to the provider queue and polls them back:
//! - Pre-network validation and payload building
//! - Per-operation deadline distinct from network failures
//! - Ordered endpoint fallback when polling
//! - Observability (tracing spans, metrics)

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};
use validator::Validate;
use vgen_models::{JobRequest, JobStatus, ModelCatalog, ModelSpec, PollResult, ProviderJob};

use crate::config::ProviderConfig;
use crate::endpoints::{poll_candidates, EndpointKind};
use crate::error::{ProviderError, ProviderResult};
use crate::metrics::{record_fallthrough, record_request};
use crate::payload::{Payload, PayloadBuilders};
use crate::response::map_poll_response;

/// Provider name reported on submission handles.
pub const PROVIDER_NAME: &str = "fal";

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    eta: Option<f64>,
}

/// Provider adapter client.
#[derive(Clone)]
pub struct ProviderClient {
    http: Client,
    config: ProviderConfig,
    catalog: Arc<dyn ModelCatalog>,
    builders: Arc<PayloadBuilders>,
}

impl ProviderClient {
    /// Create a new provider client.
    pub fn new(config: ProviderConfig, catalog: Arc<dyn ModelCatalog>) -> ProviderResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("vgen-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self {
            http,
            config,
            catalog,
            builders: Arc::new(PayloadBuilders::standard()),
        })
    }

    /// Create from environment variables.
    pub fn from_env(catalog: Arc<dyn ModelCatalog>) -> ProviderResult<Self> {
        Self::new(ProviderConfig::from_env(), catalog)
    }

    /// Replace the payload builder table.
    pub fn with_builders(mut self, builders: PayloadBuilders) -> Self {
        self.builders = Arc::new(builders);
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn api_key(&self) -> ProviderResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::config("FAL_KEY or FAL_API_KEY must be set to call the provider"))
    }

    fn resolve_spec(&self, engine: &str) -> ProviderResult<&ModelSpec> {
        self.catalog
            .get(engine)
            .ok_or_else(|| ProviderError::UnknownEngine(engine.to_string()))
    }

    /// Validate a request and build its provider payload without any I/O.
    pub fn prepare(&self, request: &JobRequest) -> ProviderResult<(&ModelSpec, Payload)> {
        request
            .validate()
            .map_err(|e| ProviderError::validation(e.to_string()))?;

        let spec = self.resolve_spec(&request.engine)?;
        let mut payload = self.builders.build(request, spec)?;

        if let Some(webhook_url) = request.webhook_url.as_ref().or(self.config.webhook_url.as_ref()) {
            payload.insert("webhook_url".into(), Value::String(webhook_url.clone()));
        }

        Ok((spec, payload))
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit a generation job to the provider queue.
    pub async fn submit(&self, request: &JobRequest) -> ProviderResult<ProviderJob> {
        let (spec, payload) = self.prepare(request)?;
        let key = self.api_key()?;
        let url = format!("{}/{}", self.config.queue_base.trim_end_matches('/'), spec.slug);

        let span = info_span!("provider_request", operation = "submit", engine = %spec.engine);
        self.execute_request("submit", span, async {
            let raw = self
                .send_json(self.http.post(&url).header(AUTHORIZATION, format!("Key {}", key)).json(&payload))
                .await?;

            let submitted: SubmitResponse = serde_json::from_value(raw)
                .map_err(|e| ProviderError::InvalidResponse(format!("submission response: {}", e)))?;

            let status = submitted
                .status
                .as_deref()
                .map(JobStatus::from_provider_text)
                .unwrap_or_default();

            info!(request_id = %submitted.request_id, status = %status, "Submitted generation job");

            Ok(ProviderJob {
                external_job_id: submitted.request_id,
                provider: PROVIDER_NAME.to_string(),
                status,
                estimated_seconds: submitted.eta.unwrap_or(request.duration_seconds),
            })
        })
        .await
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Poll a job using the configured logs preference.
    ///
    /// `engine` selects the model family's queue namespace; without it only
    /// the generic endpoints are tried.
    pub async fn poll(&self, job_id: &str, engine: Option<&str>) -> ProviderResult<PollResult> {
        self.poll_with_logs(job_id, engine, self.config.request_logs).await
    }

    /// Poll a job, optionally asking for verbose provider logs.
    pub async fn poll_with_logs(
        &self,
        job_id: &str,
        engine: Option<&str>,
        include_logs: bool,
    ) -> ProviderResult<PollResult> {
        let key = self.api_key()?;
        let queue_root = match engine {
            Some(engine) => self.resolve_spec(engine)?.queue_root.as_deref(),
            None => None,
        };
        let candidates = poll_candidates(&self.config, queue_root, job_id, include_logs);

        let span = info_span!("provider_request", operation = "poll", job_id = %job_id);
        self.execute_request("poll", span, async {
            let mut last_error: Option<ProviderError> = None;
            let mut status_only: Option<PollResult> = None;

            for candidate in candidates {
                let request = self.http.get(&candidate.url).header(AUTHORIZATION, format!("Key {}", key));
                match self.send_json(request).await {
                    Ok(raw) => {
                        let result = map_poll_response(job_id, &raw, include_logs);
                        if candidate.kind == EndpointKind::Status && result.output_url.is_none() {
                            if result.status == JobStatus::Failed {
                                return Ok(result);
                            }
                            debug!(url = %candidate.url, status = %result.status, "Status endpoint has no output yet, continuing");
                            status_only = Some(result);
                            continue;
                        }
                        return Ok(result);
                    }
                    Err(e) if e.is_fallthrough() => {
                        debug!(url = %candidate.url, error = %e, "Poll endpoint unavailable, trying next");
                        record_fallthrough(candidate.kind.as_str());
                        last_error = Some(e);
                    }
                    Err(e) => match status_only.take() {
                        Some(result) if result.status.is_terminal() => {
                            warn!(url = %candidate.url, error = %e, "Poll endpoint failed after terminal status, keeping status");
                            return Ok(result);
                        }
                        _ => return Err(e),
                    },
                }
            }

            if let Some(result) = status_only {
                return Ok(result);
            }

            Err(last_error.unwrap_or_else(|| ProviderError::EndpointsExhausted(job_id.to_string())))
        })
        .await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Send a request and decode a JSON body, mapping non-2xx to `Http`.
    async fn send_json(&self, request: RequestBuilder) -> ProviderResult<Value> {
        let timeout_ms = self.config.timeout_ms();

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(e, timeout_ms))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(e, timeout_ms))?;

        if !status.is_success() {
            return Err(ProviderError::http(status.as_u16(), body));
        }
        if body.trim().is_empty() {
            return Err(ProviderError::InvalidResponse("empty response body".to_string()));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Run an operation under the configured deadline, with span and metrics.
    async fn execute_request<T, F>(&self, operation: &str, span: tracing::Span, fut: F) -> ProviderResult<T>
    where
        F: std::future::Future<Output = ProviderResult<T>>,
    {
        let timeout_ms = self.config.timeout_ms();
        let start = Instant::now();

        let result = match tokio::time::timeout(self.config.timeout, fut.instrument(span)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout { timeout_ms }),
        };

        let latency_ms = start.elapsed().as_millis() as f64;
        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgen_models::StaticCatalog;

    fn client(config: ProviderConfig) -> ProviderClient {
        ProviderClient::new(config, Arc::new(StaticCatalog::builtin())).unwrap()
    }

    #[test]
    fn test_prepare_attaches_configured_webhook() {
        let mut config = ProviderConfig::default();
        config.webhook_url = Some("https://app.example.com/api/fal/webhook".to_string());
        let client = client(config);

        let request = JobRequest::new("kling-pro", "waves", "16:9", 8.0);
        let (spec, payload) = client.prepare(&request).unwrap();
        assert_eq!(spec.engine, "kling-pro");
        assert_eq!(payload["webhook_url"], "https://app.example.com/api/fal/webhook");
    }

    #[test]
    fn test_request_webhook_overrides_config() {
        let mut config = ProviderConfig::default();
        config.webhook_url = Some("https://app.example.com/default".to_string());
        let client = client(config);

        let request = JobRequest::new("veo3", "waves", "16:9", 8.0).with_webhook_url("https://other.example.com/hook");
        let (_, payload) = client.prepare(&request).unwrap();
        assert_eq!(payload["webhook_url"], "https://other.example.com/hook");
    }

    #[test]
    fn test_prepare_rejects_invalid_request() {
        let client = client(ProviderConfig::default());

        let empty_prompt = JobRequest::new("veo3", "", "16:9", 8.0);
        assert!(matches!(client.prepare(&empty_prompt), Err(ProviderError::Validation(_))));

        let unknown = JobRequest::new("sora-9", "waves", "16:9", 8.0);
        assert!(matches!(client.prepare(&unknown), Err(ProviderError::UnknownEngine(_))));
    }

    #[tokio::test]
    async fn test_submit_without_key_is_config_error() {
        let client = client(ProviderConfig::default());
        let request = JobRequest::new("veo3", "waves", "16:9", 8.0);
        assert!(matches!(client.submit(&request).await, Err(ProviderError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_image_fails_before_key_check() {
        let client = client(ProviderConfig::default());
        let request = JobRequest::new("cogvideox-5b", "forest", "16:9", 6.0);
        assert!(matches!(client.submit(&request).await, Err(ProviderError::Validation(_))));
    }
}
