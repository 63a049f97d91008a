//! Provider adapter metrics.
//!
//! - Request counters by operation and status
//! - Latency histograms
//! - Endpoint fallthrough counters

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total provider requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "vgen_provider_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "vgen_provider_latency_seconds";

    /// Poll candidates skipped because they did not answer.
    pub const FALLTHROUGH_TOTAL: &str = "vgen_provider_fallthrough_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed provider operation.
///
/// `status` is an HTTP status, or 0 when no response was received.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a poll candidate that was skipped.
pub fn record_fallthrough(kind: &str) {
    counter!(
        names::FALLTHROUGH_TOTAL,
        "kind" => kind.to_string()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
