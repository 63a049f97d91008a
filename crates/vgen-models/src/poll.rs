//! Poll results and the canonical video asset.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::JobStatus;

/// Normalized generated video, independent of the provider response shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoAsset {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
}

impl VideoAsset {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Snapshot of a provider job, produced fresh on every poll or webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PollResult {
    pub job_id: String,
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_cents: Option<f64>,
    /// Provider error message, set only when the job failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<VideoAsset>,
}

impl PollResult {
    /// A result carrying only a status and its progress hint.
    pub fn with_status(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            progress: status.progress_hint(),
            output_url: None,
            thumbnail_url: None,
            duration_seconds: None,
            cost_cents: None,
            error: None,
            logs: None,
            asset: None,
        }
    }

    /// Attach an extracted asset, copying its headline fields.
    pub fn set_asset(&mut self, asset: VideoAsset) {
        self.output_url = Some(asset.url.clone());
        self.thumbnail_url = asset.thumbnail_url.clone();
        self.duration_seconds = asset.duration_sec;
        self.asset = Some(asset);
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
