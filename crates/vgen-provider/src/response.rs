//! Map raw provider responses onto `PollResult`.
//!
//! Shared by the poller and the webhook receiver so both paths agree on
//! status, progress, and asset extraction.

use serde_json::Value;
use vgen_models::{JobStatus, PollResult};

use crate::normalizer::extract_asset;

const COST_POINTERS: &[&str] = &["/response/cost_cents", "/cost_cents", "/usage/total_cost_cents"];

/// Status text reported by the provider, if any.
pub fn status_text(raw: &Value) -> Option<&str> {
    ["status", "state"]
        .iter()
        .filter_map(|key| raw.get(*key))
        .find_map(Value::as_str)
}

/// Build a `PollResult` from a status, result, or webhook body.
///
/// Result endpoints return bare model output with no status field; such a
/// body counts as completed when it carries a video.
pub fn map_poll_response(job_id: &str, raw: &Value, include_logs: bool) -> PollResult {
    let asset = extract_asset(raw);
    let text = status_text(raw);

    let status = match text {
        Some(text) => JobStatus::from_provider_text(text),
        None if asset.is_some() => JobStatus::Completed,
        None => JobStatus::Pending,
    };

    let mut result = PollResult::with_status(job_id, status);
    if let Some(asset) = asset {
        result.set_asset(asset);
    }

    result.cost_cents = COST_POINTERS
        .iter()
        .filter_map(|p| raw.pointer(p))
        .find_map(Value::as_f64);

    if status == JobStatus::Failed {
        result.error = Some(failure_message(raw, text));
    }

    if include_logs {
        result.logs = log_messages(raw);
    }

    result
}

fn failure_message(raw: &Value, status: Option<&str>) -> String {
    let from_body = match raw.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        None => None,
    };

    from_body
        .or_else(|| raw.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| match status {
            Some(status) => format!("Provider reported {}", status),
            None => "Provider reported a failure".to_string(),
        })
}

fn log_messages(raw: &Value) -> Option<Vec<String>> {
    let logs = raw.get("logs")?.as_array()?;
    Some(
        logs.iter()
            .filter_map(|entry| match entry {
                Value::String(line) => Some(line.clone()),
                other => other.get("message").and_then(Value::as_str).map(str::to_string),
            })
            .collect(),
    )
}
