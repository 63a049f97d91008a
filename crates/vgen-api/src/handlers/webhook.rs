//! Provider webhook receiver.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use vgen_models::JobStatus;
use vgen_provider::map_poll_response;

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_webhook_update;
use crate::state::{AppState, WebhookUpdate};

/// Acknowledgement returned to the provider.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub ok: bool,
    pub request_id: String,
    pub status: JobStatus,
    pub progress: u8,
}

/// Verify a provider callback and fan it out to subscribers.
///
/// The body is taken as raw bytes because the signature covers them exactly.
pub async fn fal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let verified = state.verifier.verify(&headers, &body).await.map_err(|e| {
        error!(error = %e, "Webhook verification could not run");
        ApiError::from(e)
    })?;

    if !verified {
        warn!("Rejected webhook with invalid signature");
        return Err(ApiError::unauthorized("invalid signature"));
    }

    let payload: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("invalid payload"))?;

    let request_id = payload
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing request_id"))?
        .to_string();

    let include_logs = payload
        .get("logs")
        .and_then(Value::as_array)
        .is_some_and(|logs| !logs.is_empty());
    let result = map_poll_response(&request_id, &payload, include_logs);

    info!(
        request_id = %request_id,
        status = %result.status,
        has_output = result.output_url.is_some(),
        "Received provider webhook"
    );
    record_webhook_update(result.status.as_str());

    let ack = WebhookAck {
        ok: true,
        request_id: request_id.clone(),
        status: result.status,
        progress: result.progress,
    };

    let update = WebhookUpdate {
        request_id,
        result,
        received_at: Utc::now(),
    };
    if state.updates.send(update).is_err() {
        debug!("No subscribers for webhook update");
    }

    Ok(Json(ack))
}
