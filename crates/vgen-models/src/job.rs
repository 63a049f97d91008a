//! Generation job request and submission handle.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::JobStatus;

/// Generic video generation request, independent of the provider model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct JobRequest {
    /// Text prompt
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
    /// Engine identifier (e.g. "kling-pro")
    #[validate(length(min = 1, message = "engine must not be empty"))]
    pub engine: String,
    /// Aspect ratio such as "16:9"
    pub aspect_ratio: String,
    /// Requested clip length in seconds
    #[validate(range(min = 0.0, max = 600.0, message = "duration must be between 0 and 600 seconds"))]
    pub duration_seconds: f64,
    /// Resolution override ("720p", "1080p"); the model default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Whether to generate an audio track
    #[serde(default)]
    pub with_audio: bool,
    #[serde(default)]
    pub input_assets: InputAssets,
    #[serde(default)]
    pub advanced: AdvancedParams,
    /// Callback URL the provider should notify on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl JobRequest {
    /// Create a request with the required fields; everything else defaults.
    pub fn new(
        engine: impl Into<String>,
        prompt: impl Into<String>,
        aspect_ratio: impl Into<String>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            engine: engine.into(),
            aspect_ratio: aspect_ratio.into(),
            duration_seconds,
            resolution: None,
            seed: None,
            negative_prompt: None,
            with_audio: false,
            input_assets: InputAssets::default(),
            advanced: AdvancedParams::default(),
            webhook_url: None,
        }
    }

    pub fn with_init_image(mut self, url: impl Into<String>) -> Self {
        self.input_assets.init_image_url = Some(url.into());
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Duration rounded to whole seconds, never below one second.
    pub fn whole_seconds(&self) -> u32 {
        self.duration_seconds.round().max(1.0) as u32
    }
}

/// Optional media inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InputAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_video_url: Option<String>,
}

/// Sampler parameters. Each is clamped to the model constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AdvancedParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

/// Handle returned by a successful submission.
///
/// The caller owns persistence; `external_job_id` is the only correlation
/// handle needed to resume polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderJob {
    pub external_job_id: String,
    pub provider: String,
    pub status: JobStatus,
    pub estimated_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_seconds_rounds_and_floors() {
        assert_eq!(JobRequest::new("veo3", "a cat", "16:9", 7.6).whole_seconds(), 8);
        assert_eq!(JobRequest::new("veo3", "a cat", "16:9", 0.2).whole_seconds(), 1);
    }

    #[test]
    fn test_validation_rejects_empty_prompt() {
        let request = JobRequest::new("veo3", "", "16:9", 8.0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_deserialize_minimal_request() {
        let request: JobRequest = serde_json::from_value(serde_json::json!({
            "prompt": "waves at dusk",
            "engine": "luma-dream",
            "aspect_ratio": "16:9",
            "duration_seconds": 6
        }))
        .unwrap();

        assert!(request.input_assets.init_image_url.is_none());
        assert!(request.advanced.cfg_scale.is_none());
        assert!(!request.with_audio);
    }
}
