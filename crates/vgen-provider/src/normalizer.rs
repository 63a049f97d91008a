//! Response normalizer.
//!
//! Provider responses place the generated video under several different
//! shapes. Extractors are tried in a fixed order and the first one that
//! yields a usable URL wins. Fields the matched object omits are backfilled
//! from its parent and from the response root.

use serde_json::Value;
use tracing::trace;
use vgen_models::VideoAsset;

type Extractor = fn(&Value) -> Option<VideoAsset>;

/// Extractors in priority order.
const EXTRACTORS: &[(&str, Extractor)] = &[
    ("videos", from_videos_array),
    ("video", from_video_object),
    ("output", from_output),
    ("outputs", from_outputs),
    ("video_url", from_bare_video_url),
];

/// Wrapper keys searched when nothing matches at the top level.
const CONTAINER_KEYS: &[&str] = &["response", "data", "result", "payload"];

const URL_POINTERS: &[&str] = &["/url", "/video_url", "/file/url", "/signed_url", "/file/download_url"];
const THUMBNAIL_POINTERS: &[&str] = &["/thumbnail", "/thumbnail_url", "/preview_url", "/poster"];
const PARENT_THUMBNAIL_POINTERS: &[&str] = &["/thumbnails/0", "/thumbnail_url", "/thumbnail"];
const DURATION_POINTERS: &[&str] = &["/duration", "/seconds", "/duration_seconds", "/metadata/duration"];
const PARENT_DURATION_POINTERS: &[&str] = &["/duration", "/duration_seconds"];
const MIME_POINTERS: &[&str] = &["/content_type", "/mime", "/mimetype", "/file/content_type"];
const WIDTH_POINTERS: &[&str] = &["/width", "/metadata/width"];
const HEIGHT_POINTERS: &[&str] = &["/height", "/metadata/height"];
const FILE_NAME_POINTERS: &[&str] = &["/file_name", "/file/file_name"];
const FILE_SIZE_POINTERS: &[&str] = &["/file_size", "/file/file_size"];

/// Extract the generated video from a raw provider response.
///
/// Returns `None` when no shape carries a URL; callers treat that as the job
/// still being in progress.
pub fn extract_asset(raw: &Value) -> Option<VideoAsset> {
    extract_at(raw).or_else(|| {
        CONTAINER_KEYS
            .iter()
            .filter_map(|key| raw.get(*key))
            .filter(|inner| inner.is_object())
            .find_map(extract_at)
    })
}

fn extract_at(root: &Value) -> Option<VideoAsset> {
    EXTRACTORS.iter().find_map(|(shape, extractor)| {
        let asset = extractor(root)?;
        trace!(shape, url = %asset.url, "Matched video asset");
        Some(asset)
    })
}

// =============================================================================
// Extractors
// =============================================================================

fn from_videos_array(root: &Value) -> Option<VideoAsset> {
    let first = root.get("videos")?.as_array()?.first()?;
    candidate(first, &[root])
}

fn from_video_object(root: &Value) -> Option<VideoAsset> {
    candidate(root.get("video")?, &[root])
}

fn from_output(root: &Value) -> Option<VideoAsset> {
    nested_output(root.get("output")?, root)
}

fn from_outputs(root: &Value) -> Option<VideoAsset> {
    nested_output(root.get("outputs")?, root)
}

fn from_bare_video_url(root: &Value) -> Option<VideoAsset> {
    candidate(root.get("video_url")?, &[root])
}

/// `output`/`outputs` may be an array of entries, a single entry, or a URL.
/// An entry may carry the video itself or wrap it under `video`.
fn nested_output(value: &Value, root: &Value) -> Option<VideoAsset> {
    match value {
        Value::Array(items) => items.iter().find_map(|item| output_entry(item, root)),
        Value::Object(_) => output_entry(value, root),
        Value::String(_) => candidate(value, &[root]),
        _ => None,
    }
}

fn output_entry(entry: &Value, root: &Value) -> Option<VideoAsset> {
    candidate(entry, &[root]).or_else(|| candidate(entry.get("video")?, &[entry, root]))
}

// =============================================================================
// Field resolution
// =============================================================================

/// Build an asset from a candidate value. `parents` are searched, nearest
/// first, for fields the candidate itself does not carry.
fn candidate(value: &Value, parents: &[&Value]) -> Option<VideoAsset> {
    let mut asset = match value {
        Value::String(url) => VideoAsset::new(non_empty(url)?),
        Value::Object(_) => {
            let url = first_str(value, URL_POINTERS)?;
            VideoAsset {
                url: url.to_string(),
                mime: first_str(value, MIME_POINTERS).map(str::to_string),
                width: first_u64(value, WIDTH_POINTERS).and_then(|w| u32::try_from(w).ok()),
                height: first_u64(value, HEIGHT_POINTERS).and_then(|h| u32::try_from(h).ok()),
                duration_sec: first_f64(value, DURATION_POINTERS),
                thumbnail_url: first_str(value, THUMBNAIL_POINTERS).map(str::to_string),
                file_name: first_str(value, FILE_NAME_POINTERS).map(str::to_string),
                file_size_bytes: first_u64(value, FILE_SIZE_POINTERS),
            }
        }
        _ => return None,
    };

    for parent in parents {
        if asset.thumbnail_url.is_none() {
            asset.thumbnail_url = first_str(parent, PARENT_THUMBNAIL_POINTERS).map(str::to_string);
        }
        if asset.duration_sec.is_none() {
            asset.duration_sec = first_f64(parent, PARENT_DURATION_POINTERS);
        }
    }

    if asset.mime.is_none() {
        asset.mime = guess_mime(&asset.url).map(str::to_string);
    }

    Some(asset)
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

fn first_str<'a>(value: &'a Value, pointers: &[&str]) -> Option<&'a str> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter_map(Value::as_str)
        .find_map(non_empty)
}

/// Numbers, or strings holding a number.
fn first_f64(value: &Value, pointers: &[&str]) -> Option<f64> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .find_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter(|n: &f64| n.is_finite())
}

fn first_u64(value: &Value, pointers: &[&str]) -> Option<u64> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .find_map(|v| match v {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

/// Best-effort content type from the URL path extension.
fn guess_mime(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "mp4" | "m4v" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        "mkv" => Some("video/x-matroska"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
