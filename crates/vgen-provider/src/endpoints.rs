//! Poll endpoint candidates.
//!
//! The provider exposes the same job under several URLs depending on model
//! family and API generation. Candidates are tried strictly in order.

use std::fmt;

use crate::config::ProviderConfig;

/// What a candidate endpoint returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Status document; may omit the output even when the job is done
    Status,
    /// Final model output
    Result,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Status => "status",
            EndpointKind::Result => "result",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single poll target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    pub kind: EndpointKind,
    pub url: String,
}

impl EndpointCandidate {
    fn new(kind: EndpointKind, url: String) -> Self {
        Self { kind, url }
    }
}

/// Ordered poll candidates for a job.
///
/// 1. Queue-root status endpoint, only when logs are requested.
/// 2. Queue-root result endpoint.
/// 3. Generic result endpoint on each distinct configured base.
pub fn poll_candidates(
    config: &ProviderConfig,
    queue_root: Option<&str>,
    job_id: &str,
    include_logs: bool,
) -> Vec<EndpointCandidate> {
    let queue_base = config.queue_base.trim_end_matches('/');
    let logs_query = if include_logs { "?logs=1" } else { "" };
    let mut candidates = Vec::new();

    if let Some(root) = queue_root.map(|r| r.trim_matches('/')).filter(|r| !r.is_empty()) {
        if include_logs {
            candidates.push(EndpointCandidate::new(
                EndpointKind::Status,
                format!("{}/{}/requests/{}/status?logs=1", queue_base, root, job_id),
            ));
        }
        candidates.push(EndpointCandidate::new(
            EndpointKind::Result,
            format!("{}/{}/requests/{}", queue_base, root, job_id),
        ));
    }

    let mut bases: Vec<&str> = Vec::new();
    for base in [queue_base, config.api_base.trim_end_matches('/')] {
        if !bases.contains(&base) {
            bases.push(base);
        }
    }
    for base in bases {
        candidates.push(EndpointCandidate::new(
            EndpointKind::Result,
            format!("{}/requests/{}{}", base, job_id, logs_query),
        ));
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_with_logs() {
        let config = ProviderConfig::default();
        let candidates = poll_candidates(&config, Some("fal-ai/kling-video"), "abc", true);
        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://queue.fal.run/fal-ai/kling-video/requests/abc/status?logs=1",
                "https://queue.fal.run/fal-ai/kling-video/requests/abc",
                "https://queue.fal.run/requests/abc?logs=1",
                "https://fal.run/requests/abc?logs=1",
            ]
        );
        assert_eq!(candidates[0].kind, EndpointKind::Status);
        assert!(candidates[1..].iter().all(|c| c.kind == EndpointKind::Result));
    }

    #[test]
    fn test_no_status_endpoint_without_logs() {
        let config = ProviderConfig::default();
        let candidates = poll_candidates(&config, Some("fal-ai/veo3"), "abc", false);
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.kind == EndpointKind::Result));
    }

    #[test]
    fn test_generic_only_and_deduplicated() {
        let config = ProviderConfig::default().with_base("http://127.0.0.1:9000");
        let candidates = poll_candidates(&config, None, "abc", false);
        assert_eq!(
            candidates,
            vec![EndpointCandidate::new(
                EndpointKind::Result,
                "http://127.0.0.1:9000/requests/abc".to_string()
            )]
        );
    }
}
