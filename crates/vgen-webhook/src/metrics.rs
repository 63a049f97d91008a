//! Webhook authentication metrics.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Webhook verifications by outcome.
    pub const VERIFICATIONS_TOTAL: &str = "vgen_webhook_verifications_total";

    /// Key-set refresh attempts by result.
    pub const KEY_REFRESH_TOTAL: &str = "vgen_webhook_key_refresh_total";
}

/// Record the outcome of a verification.
pub fn record_verification(outcome: &str) {
    counter!(
        names::VERIFICATIONS_TOTAL,
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a key-set refresh attempt.
pub fn record_key_refresh(result: &str) {
    counter!(
        names::KEY_REFRESH_TOTAL,
        "result" => result.to_string()
    )
    .increment(1);
}
