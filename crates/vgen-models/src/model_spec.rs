//! Per-engine model specification.
//!
//! A `ModelSpec` maps a generic engine id onto the provider model slug and
//! carries the constraints and defaults payload builders clamp against.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Numeric range with an optional default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RangeOption {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
}

impl RangeOption {
    pub const fn new(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            step: None,
            default: Some(default),
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Field constraints published for a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelConstraints {
    /// Allowed aspect ratios. Empty means any ratio is accepted.
    #[serde(default)]
    pub ratios: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<RangeOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<RangeOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<RangeOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<RangeOption>,
}

/// Default values applied when the request leaves a field unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_audio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// Read-only model specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelSpec {
    /// Catalog id, e.g. "fal:kling-pro"
    pub id: String,
    /// Engine id used by callers, e.g. "kling-pro"
    pub engine: String,
    pub label: String,
    /// Provider model slug used for submission
    pub slug: String,
    /// Queue namespace shared by a model family, used for status lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_root: Option<String>,
    /// Submission is rejected unless an init image is supplied
    #[serde(default)]
    pub requires_init_image: bool,
    #[serde(default)]
    pub constraints: ModelConstraints,
    #[serde(default)]
    pub defaults: ModelDefaults,
}

impl ModelSpec {
    /// Check a ratio against the allow-list.
    pub fn supports_ratio(&self, ratio: &str) -> bool {
        self.constraints.ratios.is_empty() || self.constraints.ratios.iter().any(|r| r == ratio)
    }

    /// Requested cfg scale, falling back to defaults, clamped to the constraint.
    pub fn resolve_cfg_scale(&self, requested: Option<f64>) -> Option<f64> {
        let range = self.constraints.cfg_scale;
        let value = requested
            .or(self.defaults.cfg_scale)
            .or_else(|| range.and_then(|r| r.default))?;
        Some(range.map_or(value, |r| r.clamp(value)))
    }

    pub fn resolve_steps(&self, requested: Option<u32>) -> Option<u32> {
        let range = self.constraints.steps;
        let value = requested
            .map(f64::from)
            .or(self.defaults.steps.map(f64::from))
            .or_else(|| range.and_then(|r| r.default))?;
        Some(range.map_or(value, |r| r.clamp(value)).round() as u32)
    }

    pub fn resolve_fps(&self, requested: Option<u32>) -> Option<u32> {
        let range = self.constraints.fps;
        let value = requested
            .map(f64::from)
            .or(self.defaults.fps.map(f64::from))
            .or_else(|| range.and_then(|r| r.default))?;
        Some(range.map_or(value, |r| r.clamp(value)).round() as u32)
    }

    pub fn resolve_resolution(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .or_else(|| self.defaults.resolution.clone())
            .unwrap_or_else(|| "720p".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ModelSpec {
        ModelSpec {
            id: "fal:test".into(),
            engine: "test".into(),
            label: "Test".into(),
            slug: "fal-ai/test".into(),
            queue_root: None,
            requires_init_image: false,
            constraints: ModelConstraints {
                ratios: vec!["16:9".into(), "9:16".into()],
                cfg_scale: Some(RangeOption::new(1.0, 10.0, 6.0)),
                steps: Some(RangeOption::new(10.0, 50.0, 30.0)),
                ..Default::default()
            },
            defaults: ModelDefaults {
                cfg_scale: Some(5.0),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_ratio_allow_list() {
        let spec = spec();
        assert!(spec.supports_ratio("16:9"));
        assert!(!spec.supports_ratio("1:1"));
    }

    #[test]
    fn test_cfg_scale_clamped_with_default_fallback() {
        let spec = spec();
        assert_eq!(spec.resolve_cfg_scale(Some(42.0)), Some(10.0));
        assert_eq!(spec.resolve_cfg_scale(None), Some(5.0));
    }

    #[test]
    fn test_steps_use_constraint_default() {
        let spec = spec();
        assert_eq!(spec.resolve_steps(None), Some(30));
        assert_eq!(spec.resolve_steps(Some(3)), Some(10));
        assert_eq!(spec.resolve_fps(None), None);
    }
}
