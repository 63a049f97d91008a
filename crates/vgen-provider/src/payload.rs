//! Payload builders.
//!
//! Each engine family has its own request schema. Builders translate a
//! generic `JobRequest` into that schema and reject requests the model
//! cannot accept before any network call is made.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use vgen_models::{JobRequest, ModelSpec};

use crate::error::{ProviderError, ProviderResult};

/// Model-specific JSON request body.
pub type Payload = Map<String, Value>;

/// Translates a generic request into a model-specific payload.
pub trait PayloadBuilder: Send + Sync {
    fn build(&self, request: &JobRequest, spec: &ModelSpec) -> ProviderResult<Payload>;
}

/// Engine id to builder table with a generic fallback.
pub struct PayloadBuilders {
    builders: HashMap<String, Box<dyn PayloadBuilder>>,
    fallback: Box<dyn PayloadBuilder>,
}

impl Default for PayloadBuilders {
    fn default() -> Self {
        Self::standard()
    }
}

impl PayloadBuilders {
    /// Table with a dedicated builder for each supported engine family.
    pub fn standard() -> Self {
        let mut builders = Self {
            builders: HashMap::new(),
            fallback: Box::new(GenericBuilder),
        };
        builders.register("veo3", Veo3Builder { image_to_video: false });
        builders.register("veo3-fast", Veo3Builder { image_to_video: true });
        builders.register("kling-pro", KlingBuilder);
        builders.register("pika-v2-2", PikaBuilder);
        builders.register("luma-dream", LumaBuilder);
        builders.register("pixverse-v4-5", PixverseBuilder);
        builders.register("cogvideox-5b", CogVideoXBuilder);
        builders
    }

    /// Register or replace the builder for an engine.
    pub fn register(&mut self, engine: impl Into<String>, builder: impl PayloadBuilder + 'static) {
        self.builders.insert(engine.into(), Box::new(builder));
    }

    pub fn has_dedicated(&self, engine: &str) -> bool {
        self.builders.contains_key(engine)
    }

    /// Validate the request against the engine's model spec and build its payload.
    pub fn build(&self, request: &JobRequest, spec: &ModelSpec) -> ProviderResult<Payload> {
        check_request(request, spec)?;

        let builder = self
            .builders
            .get(spec.engine.as_str())
            .unwrap_or(&self.fallback);
        builder.build(request, spec)
    }
}

// =============================================================================
// Shared checks and encodings
// =============================================================================

fn check_request(request: &JobRequest, spec: &ModelSpec) -> ProviderResult<()> {
    if !spec.supports_ratio(&request.aspect_ratio) {
        return Err(ProviderError::validation(format!(
            "{} does not support aspect ratio {} (allowed: {})",
            spec.label,
            request.aspect_ratio,
            spec.constraints.ratios.join(", ")
        )));
    }
    if spec.requires_init_image {
        require_init_image(request, spec)?;
    }
    Ok(())
}

fn init_image(request: &JobRequest) -> Option<&str> {
    request
        .input_assets
        .init_image_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

fn require_init_image<'a>(request: &'a JobRequest, spec: &ModelSpec) -> ProviderResult<&'a str> {
    init_image(request).ok_or_else(|| {
        ProviderError::validation(format!(
            "{} requires an init image. Upload one before launching the job.",
            spec.label
        ))
    })
}

/// "8s"
fn suffixed_seconds(request: &JobRequest) -> String {
    format!("{}s", request.whole_seconds())
}

/// "8"
fn plain_seconds(request: &JobRequest) -> String {
    request.whole_seconds().to_string()
}

/// Insert only when a value is present; absent optionals are omitted.
fn put<T: Into<Value>>(payload: &mut Payload, key: &str, value: Option<T>) {
    if let Some(value) = value {
        payload.insert(key.to_string(), value.into());
    }
}

fn base_payload(request: &JobRequest) -> Payload {
    let mut payload = Payload::new();
    payload.insert("prompt".into(), Value::String(request.prompt.clone()));
    payload
}

fn aspect_ratio_to_size(ratio: &str) -> (u32, u32) {
    match ratio {
        "9:16" => (720, 1280),
        "1:1" => (720, 720),
        "21:9" => (1920, 822),
        _ => (1280, 720),
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Minimal mapping for engines without a dedicated builder.
pub struct GenericBuilder;

impl PayloadBuilder for GenericBuilder {
    fn build(&self, request: &JobRequest, _spec: &ModelSpec) -> ProviderResult<Payload> {
        let mut payload = base_payload(request);
        payload.insert("aspect_ratio".into(), json!(request.aspect_ratio));
        payload.insert("duration".into(), json!(suffixed_seconds(request)));
        payload.insert("with_audio".into(), json!(request.with_audio));
        put(&mut payload, "seed", request.seed);
        put(&mut payload, "image_url", init_image(request));
        Ok(payload)
    }
}

/// Veo 3 text-to-video, or image-to-video for the fast variant.
pub struct Veo3Builder {
    pub image_to_video: bool,
}

impl PayloadBuilder for Veo3Builder {
    fn build(&self, request: &JobRequest, spec: &ModelSpec) -> ProviderResult<Payload> {
        let mut payload = base_payload(request);
        if self.image_to_video {
            let image = require_init_image(request, spec)?;
            payload.insert("image_url".into(), json!(image));
        }
        payload.insert("aspect_ratio".into(), json!(request.aspect_ratio));
        payload.insert("duration".into(), json!(suffixed_seconds(request)));
        payload.insert(
            "resolution".into(),
            json!(spec.resolve_resolution(request.resolution.as_deref())),
        );
        payload.insert("generate_audio".into(), json!(request.with_audio));
        put(&mut payload, "negative_prompt", request.negative_prompt.clone());
        put(&mut payload, "seed", request.seed);
        put(&mut payload, "cfg_scale", spec.resolve_cfg_scale(request.advanced.cfg_scale));
        Ok(payload)
    }
}

/// Kling video. Duration is a whole-second string.
pub struct KlingBuilder;

impl PayloadBuilder for KlingBuilder {
    fn build(&self, request: &JobRequest, spec: &ModelSpec) -> ProviderResult<Payload> {
        let mut payload = base_payload(request);
        payload.insert("duration".into(), json!(plain_seconds(request)));
        payload.insert("aspect_ratio".into(), json!(request.aspect_ratio));
        put(&mut payload, "image_url", init_image(request));
        put(&mut payload, "negative_prompt", request.negative_prompt.clone());
        put(&mut payload, "cfg_scale", spec.resolve_cfg_scale(request.advanced.cfg_scale));
        put(&mut payload, "seed", request.seed);
        Ok(payload)
    }
}

/// Pika. Duration is an integer; cfg scale is sent as guidance scale.
pub struct PikaBuilder;

impl PayloadBuilder for PikaBuilder {
    fn build(&self, request: &JobRequest, spec: &ModelSpec) -> ProviderResult<Payload> {
        let mut payload = base_payload(request);
        payload.insert("aspect_ratio".into(), json!(request.aspect_ratio));
        payload.insert("duration".into(), json!(request.whole_seconds()));
        payload.insert(
            "resolution".into(),
            json!(spec.resolve_resolution(request.resolution.as_deref())),
        );
        put(&mut payload, "negative_prompt", request.negative_prompt.clone());
        put(&mut payload, "seed", request.seed);
        put(
            &mut payload,
            "guidance_scale",
            spec.resolve_cfg_scale(request.advanced.cfg_scale),
        );
        Ok(payload)
    }
}

pub struct LumaBuilder;

impl PayloadBuilder for LumaBuilder {
    fn build(&self, request: &JobRequest, spec: &ModelSpec) -> ProviderResult<Payload> {
        let mut payload = base_payload(request);
        payload.insert("aspect_ratio".into(), json!(request.aspect_ratio));
        payload.insert("duration".into(), json!(suffixed_seconds(request)));
        put(&mut payload, "negative_prompt", request.negative_prompt.clone());
        put(&mut payload, "seed", request.seed);
        put(&mut payload, "cfg_scale", spec.resolve_cfg_scale(request.advanced.cfg_scale));
        Ok(payload)
    }
}

pub struct PixverseBuilder;

impl PayloadBuilder for PixverseBuilder {
    fn build(&self, request: &JobRequest, spec: &ModelSpec) -> ProviderResult<Payload> {
        let mut payload = base_payload(request);
        payload.insert("aspect_ratio".into(), json!(request.aspect_ratio));
        payload.insert("duration".into(), json!(plain_seconds(request)));
        payload.insert(
            "resolution".into(),
            json!(spec.resolve_resolution(request.resolution.as_deref())),
        );
        put(&mut payload, "negative_prompt", request.negative_prompt.clone());
        put(&mut payload, "seed", request.seed);
        put(&mut payload, "cfg_scale", spec.resolve_cfg_scale(request.advanced.cfg_scale));
        Ok(payload)
    }
}

/// CogVideoX image-to-video. Sizes are derived from the aspect ratio.
pub struct CogVideoXBuilder;

impl PayloadBuilder for CogVideoXBuilder {
    fn build(&self, request: &JobRequest, spec: &ModelSpec) -> ProviderResult<Payload> {
        let image = require_init_image(request, spec)?;
        let (width, height) = aspect_ratio_to_size(&request.aspect_ratio);

        let mut payload = base_payload(request);
        payload.insert("image_url".into(), json!(image));
        payload.insert("video_size".into(), json!({ "width": width, "height": height }));
        payload.insert(
            "num_inference_steps".into(),
            json!(spec.resolve_steps(request.advanced.steps).unwrap_or(30)),
        );
        payload.insert(
            "guidance_scale".into(),
            json!(spec.resolve_cfg_scale(request.advanced.cfg_scale).unwrap_or(6.0)),
        );
        payload.insert(
            "export_fps".into(),
            json!(spec.resolve_fps(request.advanced.fps).unwrap_or(24)),
        );
        put(&mut payload, "negative_prompt", request.negative_prompt.clone());
        put(&mut payload, "seed", request.seed);
        Ok(payload)
    }
}
