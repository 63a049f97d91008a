//! Model spec registry access.
//!
//! The catalog is owned by a collaborator and consumed read-only. A built-in
//! catalog covering the supported engines is provided for binaries and tests.

use crate::model_spec::{ModelConstraints, ModelDefaults, ModelSpec, RangeOption};

/// Prefix used by catalog ids ("fal:veo3").
pub const CATALOG_ID_PREFIX: &str = "fal:";

/// Read-only lookup of model specs by engine id.
pub trait ModelCatalog: Send + Sync {
    /// Find a spec by engine id ("veo3") or catalog id ("fal:veo3").
    fn get(&self, engine: &str) -> Option<&ModelSpec>;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    specs: Vec<ModelSpec>,
}

impl StaticCatalog {
    pub fn new(specs: Vec<ModelSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[ModelSpec] {
        &self.specs
    }

    /// Catalog of the engines supported out of the box.
    pub fn builtin() -> Self {
        Self::new(vec![
            spec("veo3", "Veo 3", "fal-ai/veo3", "fal-ai/veo3", false)
                .ratios(&["16:9", "9:16", "1:1"])
                .duration(RangeOption::new(4.0, 12.0, 8.0))
                .fps(RangeOption::new(24.0, 30.0, 24.0))
                .cfg(RangeOption::new(1.0, 18.0, 9.0))
                .defaults(8.0, 24, Some(9.0), None, true, "720p")
                .build(),
            spec("veo3-fast", "Veo 3 Fast", "fal-ai/veo3/fast/image-to-video", "fal-ai/veo3", true)
                .ratios(&["16:9", "9:16", "1:1"])
                .duration(RangeOption::new(4.0, 8.0, 6.0))
                .fps(RangeOption::new(24.0, 30.0, 24.0))
                .cfg(RangeOption::new(1.0, 12.0, 8.0))
                .defaults(6.0, 24, Some(8.0), None, false, "720p")
                .build(),
            spec(
                "kling-pro",
                "Kling 2.5 Turbo Pro",
                "fal-ai/kling-video/v2.5-turbo/pro/image-to-video",
                "fal-ai/kling-video",
                false,
            )
            .ratios(&["16:9"])
            .duration(RangeOption::new(5.0, 10.0, 5.0))
            .fps(RangeOption::new(24.0, 24.0, 24.0))
            .cfg(RangeOption::new(0.0, 1.0, 0.5))
            .defaults(5.0, 24, Some(0.5), None, false, "1080p")
            .build(),
            spec(
                "kling-pro-t2v",
                "Kling 2.5 Turbo Pro (text to video)",
                "fal-ai/kling-video/v2.5-turbo/pro/text-to-video",
                "fal-ai/kling-video",
                false,
            )
            .ratios(&["16:9", "9:16"])
            .duration(RangeOption::new(5.0, 10.0, 5.0))
            .fps(RangeOption::new(24.0, 24.0, 24.0))
            .cfg(RangeOption::new(0.0, 1.0, 0.5))
            .defaults(5.0, 24, Some(0.5), None, false, "720p")
            .build(),
            spec("pika-v2-2", "Pika v2.2", "fal-ai/pika/v2.2/text-to-video", "fal-ai/pika", false)
                .ratios(&["16:9", "9:16", "1:1", "4:5", "5:4", "3:2", "2:3"])
                .duration(RangeOption::new(3.0, 8.0, 5.0))
                .fps(RangeOption::new(24.0, 30.0, 24.0))
                .cfg(RangeOption::new(0.0, 1.0, 0.6))
                .defaults(5.0, 24, Some(0.6), None, true, "720p")
                .build(),
            spec(
                "luma-dream",
                "Luma Dream Machine",
                "fal-ai/luma-dream-machine",
                "fal-ai/luma-dream-machine",
                false,
            )
            .ratios(&["21:9", "16:9", "9:16"])
            .duration(RangeOption::new(4.0, 10.0, 6.0))
            .fps(RangeOption::new(24.0, 24.0, 24.0))
            .cfg(RangeOption::new(1.0, 12.0, 7.0))
            .defaults(6.0, 24, Some(7.0), None, false, "720p")
            .build(),
            spec(
                "pixverse-v4-5",
                "Pixverse v4.5",
                "fal-ai/pixverse/v4.5/text-to-video",
                "fal-ai/pixverse",
                false,
            )
            .ratios(&["16:9", "9:16", "1:1"])
            .duration(RangeOption::new(5.0, 8.0, 5.0))
            .fps(RangeOption::new(24.0, 30.0, 24.0))
            .cfg(RangeOption::new(1.0, 12.0, 7.0))
            .defaults(5.0, 24, Some(7.0), None, false, "720p")
            .build(),
            spec(
                "cogvideox-5b",
                "CogVideoX 5B",
                "fal-ai/cogvideox-5b/image-to-video",
                "fal-ai/cogvideox-5b",
                true,
            )
            .ratios(&["16:9", "9:16"])
            .duration(RangeOption::new(4.0, 12.0, 6.0))
            .fps(RangeOption::new(12.0, 24.0, 24.0))
            .cfg(RangeOption::new(1.0, 10.0, 6.0))
            .steps(RangeOption::new(10.0, 50.0, 30.0))
            .defaults(6.0, 24, Some(6.0), Some(30), false, "720p")
            .build(),
            spec("wan-2-1-t2v", "WAN 2.1 (text to video)", "fal-ai/wan-t2v", "fal-ai/wan-t2v", false)
                .ratios(&["16:9", "9:16"])
                .duration(RangeOption::new(5.0, 8.0, 5.0))
                .fps(RangeOption::new(12.0, 24.0, 16.0))
                .defaults(5.0, 16, None, None, false, "720p")
                .build(),
            spec(
                "hunyuan-video",
                "Hunyuan Video",
                "fal-ai/hunyuan-video",
                "fal-ai/hunyuan-video",
                false,
            )
            .ratios(&["16:9", "9:16"])
            .duration(RangeOption::new(5.0, 8.0, 5.0))
            .fps(RangeOption::new(16.0, 24.0, 16.0))
            .defaults(5.0, 16, None, None, false, "720p")
            .build(),
            spec(
                "hailuo-02-pro",
                "Hailuo-02 Pro",
                "fal-ai/minimax/hailuo-02/pro/image-to-video",
                "fal-ai/minimax/hailuo-02",
                true,
            )
            .ratios(&["16:9", "9:16"])
            .duration(RangeOption::new(4.0, 6.0, 5.0))
            .fps(RangeOption::new(16.0, 24.0, 24.0))
            .cfg(RangeOption::new(0.0, 10.0, 5.0))
            .defaults(5.0, 24, Some(5.0), None, false, "720p")
            .build(),
        ])
    }
}

impl ModelCatalog for StaticCatalog {
    fn get(&self, engine: &str) -> Option<&ModelSpec> {
        let engine = engine.strip_prefix(CATALOG_ID_PREFIX).unwrap_or(engine);
        self.specs.iter().find(|s| s.engine == engine)
    }
}

// =============================================================================
// Builder helpers for the built-in table
// =============================================================================

struct SpecBuilder {
    spec: ModelSpec,
}

fn spec(engine: &str, label: &str, slug: &str, queue_root: &str, requires_init_image: bool) -> SpecBuilder {
    SpecBuilder {
        spec: ModelSpec {
            id: format!("{}{}", CATALOG_ID_PREFIX, engine),
            engine: engine.to_string(),
            label: label.to_string(),
            slug: slug.to_string(),
            queue_root: Some(queue_root.to_string()),
            requires_init_image,
            constraints: ModelConstraints::default(),
            defaults: ModelDefaults::default(),
        },
    }
}

impl SpecBuilder {
    fn ratios(mut self, ratios: &[&str]) -> Self {
        self.spec.constraints.ratios = ratios.iter().map(|r| r.to_string()).collect();
        self
    }

    fn duration(mut self, range: RangeOption) -> Self {
        self.spec.constraints.duration_seconds = Some(range);
        self
    }

    fn fps(mut self, range: RangeOption) -> Self {
        self.spec.constraints.fps = Some(range);
        self
    }

    fn cfg(mut self, range: RangeOption) -> Self {
        self.spec.constraints.cfg_scale = Some(range);
        self
    }

    fn steps(mut self, range: RangeOption) -> Self {
        self.spec.constraints.steps = Some(range);
        self
    }

    fn defaults(
        mut self,
        duration_seconds: f64,
        fps: u32,
        cfg_scale: Option<f64>,
        steps: Option<u32>,
        with_audio: bool,
        resolution: &str,
    ) -> Self {
        self.spec.defaults = ModelDefaults {
            duration_seconds: Some(duration_seconds),
            fps: Some(fps),
            cfg_scale,
            steps,
            with_audio: Some(with_audio),
            resolution: Some(resolution.to_string()),
        };
        self
    }

    fn build(self) -> ModelSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_engine_and_catalog_id() {
        let catalog = StaticCatalog::builtin();
        let by_engine = catalog.get("kling-pro").unwrap();
        let by_id = catalog.get("fal:kling-pro").unwrap();
        assert_eq!(by_engine, by_id);
        assert_eq!(by_engine.queue_root.as_deref(), Some("fal-ai/kling-video"));
    }

    #[test]
    fn test_unknown_engine() {
        assert!(StaticCatalog::builtin().get("sora-9").is_none());
    }

    #[test]
    fn test_builtin_engines_are_unique() {
        let catalog = StaticCatalog::builtin();
        let mut engines: Vec<&str> = catalog.specs().iter().map(|s| s.engine.as_str()).collect();
        let total = engines.len();
        engines.sort_unstable();
        engines.dedup();
        assert_eq!(engines.len(), total);
    }
}
