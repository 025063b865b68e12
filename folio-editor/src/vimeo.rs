//! Vimeo metadata mirrored from embedded videos in the rich-text body.
//!
//! Lesson-like post types keep the first Vimeo embed of their content in
//! meta so listings can show a thumbnail without parsing the document.

use folio_model::{CustomFieldValue, MetaMap};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::LazyLock;
use tracing::debug;

/// Post types whose saves carry Vimeo meta.
pub const VIMEO_POST_TYPES: &[&str] = &["lessons", "topics", "quizzes"];

pub const VIDEO_ID_KEY: &str = "vimeoVideoId";
pub const EMBED_URL_KEY: &str = "vimeoEmbedUrl";
pub const THUMBNAIL_URL_KEY: &str = "vimeoThumbnailUrl";
pub const SOURCE_KEY: &str = "source";
pub const SOURCE_VIMEO: &str = "vimeo";

static VIMEO_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)vimeo\.com").expect("host pattern is valid"));

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)vimeo\.com/(?:[^"'\s?#]*?/)?(\d+)"#).expect("video id pattern is valid")
});

static IFRAME_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)src="([^"]+)""#).expect("src pattern is valid"));

pub fn tracks_vimeo(post_type_slug: &str) -> bool {
    VIMEO_POST_TYPES.contains(&post_type_slug)
}

/// What the first Vimeo embed of a document says about its video.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VimeoMeta {
    pub video_id: Option<String>,
    pub embed_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Numeric video id from a Vimeo URL or embed HTML.
pub fn extract_vimeo_id(text: &str) -> Option<String> {
    VIDEO_ID
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

/// Walks the serialized editor state breadth-first from `root.children` and
/// reads the first oEmbed node pointing at Vimeo. Content that is not an
/// editor document yields `None`.
pub fn derive_vimeo_meta(content: &str) -> Option<VimeoMeta> {
    if content.trim().is_empty() {
        return None;
    }
    let document: Value = serde_json::from_str(content).ok()?;
    let root_children = node_array(document.get("root")?.get("children")?)?;

    let mut queue: VecDeque<&Map<String, Value>> = root_children.into();
    while let Some(node) = queue.pop_front() {
        if let Some(children) = node.get("children").and_then(node_array) {
            queue.extend(children);
        }
        if text_field(node, "type") == Some("oembed") && is_vimeo_node(node) {
            return Some(read_embed(node));
        }
    }
    None
}

fn read_embed(node: &Map<String, Value>) -> VimeoMeta {
    let html = text_field(node, "html");
    let embed_url = text_field(node, "url")
        .map(String::from)
        .or_else(|| {
            html.and_then(|html| IFRAME_SRC.captures(html))
                .and_then(|caps| caps.get(1))
                .map(|src| src.as_str().to_string())
        });
    let video_id = text_field(node, "videoId")
        .map(String::from)
        .or_else(|| extract_vimeo_id(embed_url.as_deref().or(html).unwrap_or_default()));

    VimeoMeta {
        video_id,
        embed_url,
        thumbnail_url: text_field(node, "thumbnailUrl").map(String::from),
    }
}

fn is_vimeo_node(node: &Map<String, Value>) -> bool {
    let on_host = |key: &str| text_field(node, key).is_some_and(|s| VIMEO_HOST.is_match(s));
    on_host("url")
        || on_host("html")
        || text_field(node, "providerName").is_some_and(|p| p.eq_ignore_ascii_case("vimeo"))
}

/// Non-empty string property of a node.
fn text_field<'a>(node: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Children are only followed when every entry is an object.
fn node_array(value: &Value) -> Option<Vec<&Map<String, Value>>> {
    value
        .as_array()?
        .iter()
        .map(Value::as_object)
        .collect::<Option<Vec<_>>>()
}

/// Writes derived Vimeo meta into `payload`. Keys that were stored before
/// but have no derived value are cleared with `""`.
pub fn apply_vimeo_meta(derived: Option<&VimeoMeta>, stored: &MetaMap, payload: &mut MetaMap) {
    let derived_fields = [
        (VIDEO_ID_KEY, derived.and_then(|m| m.video_id.as_deref())),
        (EMBED_URL_KEY, derived.and_then(|m| m.embed_url.as_deref())),
        (THUMBNAIL_URL_KEY, derived.and_then(|m| m.thumbnail_url.as_deref())),
    ];
    for (key, value) in derived_fields {
        match value {
            Some(value) => {
                payload.insert(key.to_string(), value.into());
            }
            None if stored.contains_key(key) => {
                payload.insert(key.to_string(), "".into());
            }
            None => {}
        }
    }

    if derived.is_some() {
        payload.insert(SOURCE_KEY.to_string(), SOURCE_VIMEO.into());
    } else if stored.get(SOURCE_KEY).and_then(CustomFieldValue::as_str) == Some(SOURCE_VIMEO) {
        debug!("Clearing stale vimeo source");
        payload.insert(SOURCE_KEY.to_string(), "".into());
    }
}
