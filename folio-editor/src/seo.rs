//! Search snippet preview and per-entry SEO meta.

use crate::attachments::{ATTACHMENTS_META_KEY, parse_entries};
use crate::context::EditContext;
use folio_model::{CustomFieldValue, MetaMap};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const SEO_TITLE_KEY: &str = "seo_title";
pub const SEO_DESCRIPTION_KEY: &str = "seo_description";
pub const SEO_CANONICAL_KEY: &str = "seo_canonical";
pub const SEO_NOINDEX_KEY: &str = "seo_noindex";
pub const SEO_NOFOLLOW_KEY: &str = "seo_nofollow";

pub const TITLE_LIMIT: usize = 70;
pub const DESCRIPTION_LIMIT: usize = 160;

/// Host shown in the preview when there is no URL yet.
const PLACEHOLDER_HOST: &str = "yourdomain.com";

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|webp|avif|svg)$").expect("image pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OgImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Everything the SEO tab previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoSnippet {
    pub title: String,
    pub description: String,
    /// Unclamped lengths, for the "n/70" counters.
    pub title_length: usize,
    pub description_length: usize,
    pub preview_url: Option<String>,
    pub host_label: String,
    pub og_image: Option<OgImage>,
    pub noindex: bool,
    pub nofollow: bool,
}

/// First `max` characters of `value`.
pub fn clamp(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

fn text_value(ctx: &EditContext, key: &str) -> String {
    ctx.get_meta_value(key)
        .map(CustomFieldValue::to_display_string)
        .unwrap_or_default()
}

fn flag_value(ctx: &EditContext, key: &str) -> bool {
    ctx.get_meta_value(key).is_some_and(CustomFieldValue::coerce_bool)
}

pub fn snippet(ctx: &EditContext) -> SeoSnippet {
    let (fallback_title, fallback_description) = match (ctx.general(), ctx.post()) {
        (Some(general), _) => (general.title().to_string(), general.excerpt().to_string()),
        (None, Some(post)) => (
            post.title.clone().unwrap_or_default(),
            post.excerpt
                .clone()
                .or_else(|| post.content.clone())
                .unwrap_or_default(),
        ),
        (None, None) => (String::new(), String::new()),
    };

    let seo_title = text_value(ctx, SEO_TITLE_KEY);
    let seo_description = text_value(ctx, SEO_DESCRIPTION_KEY);

    let title = match seo_title.trim() {
        "" => fallback_title.trim().to_string(),
        title => title.to_string(),
    };
    let description = match seo_description.trim() {
        "" => fallback_description,
        description => description.to_string(),
    };
    let description = WHITESPACE.replace_all(&description, " ").trim().to_string();

    let canonical = text_value(ctx, SEO_CANONICAL_KEY);
    let preview_url = match canonical.trim() {
        "" => ctx.slug_preview_url(),
        canonical => Some(canonical.to_string()),
    };
    let host_label = preview_url
        .as_deref()
        .map(host_label)
        .unwrap_or_else(|| PLACEHOLDER_HOST.to_string());

    SeoSnippet {
        title_length: title.chars().count(),
        description_length: description.chars().count(),
        title: clamp(&title, TITLE_LIMIT),
        description: clamp(&description, DESCRIPTION_LIMIT),
        preview_url,
        host_label,
        og_image: og_image(ctx),
        noindex: flag_value(ctx, SEO_NOINDEX_KEY),
        nofollow: flag_value(ctx, SEO_NOFOLLOW_KEY),
    }
}

/// Payload written by the SEO tab: trimmed strings and coerced flags.
pub fn collect_seo_meta(ctx: &EditContext) -> MetaMap {
    let mut payload = MetaMap::new();
    for key in [SEO_TITLE_KEY, SEO_DESCRIPTION_KEY, SEO_CANONICAL_KEY] {
        payload.insert(key.to_string(), text_value(ctx, key).trim().into());
    }
    for key in [SEO_NOINDEX_KEY, SEO_NOFOLLOW_KEY] {
        payload.insert(key.to_string(), flag_value(ctx, key).into());
    }
    payload
}

fn is_image(url: &str, mime_type: Option<&str>) -> bool {
    mime_type.is_some_and(|mime| mime.starts_with("image/")) || IMAGE_URL.is_match(url)
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

/// Open Graph image: the first image among the live attachments, else the
/// first attachment of any kind, else the first image in stored meta.
pub fn og_image(ctx: &EditContext) -> Option<OgImage> {
    let attachments = ctx.attachments().map(|a| a.attachments()).unwrap_or_default();

    let first_image = attachments
        .iter()
        .filter(|entry| !entry.url.trim().is_empty())
        .find(|entry| is_image(&entry.url, entry.mime_type.as_deref()));
    if let Some(entry) = first_image {
        return Some(OgImage {
            url: entry.url.clone(),
            alt: non_blank(entry.alt.as_ref()),
        });
    }

    if let Some(first) = attachments.first().filter(|entry| !entry.url.trim().is_empty()) {
        return Some(OgImage {
            url: first.url.trim().to_string(),
            alt: None,
        });
    }

    parse_entries(ctx.get_meta_value(ATTACHMENTS_META_KEY))
        .into_iter()
        .find(|entry| is_image(&entry.url, entry.mime_type.as_deref()))
        .map(|entry| OgImage {
            alt: non_blank(entry.alt.as_ref()),
            url: entry.url,
        })
}

/// `host[:port]` of a URL, or the text before the first `/` when it does
/// not parse.
pub fn host_label(raw: &str) -> String {
    if let Ok(parsed) = url::Url::parse(raw)
        && let Some(host) = parsed.host_str()
    {
        return match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
    }
    let lowered = raw.to_ascii_lowercase();
    let without_scheme = if lowered.starts_with("https://") {
        &raw[8..]
    } else if lowered.starts_with("http://") {
        &raw[7..]
    } else {
        raw
    };
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_counts_chars() {
        assert_eq!(clamp("héllo", 2), "hé");
        assert_eq!(clamp("short", 70), "short");
    }

    #[test]
    fn host_label_falls_back_to_prefix() {
        assert_eq!(host_label("https://example.com/a/b"), "example.com");
        assert_eq!(host_label("http://localhost:3000/x"), "localhost:3000");
        assert_eq!(host_label("example.org/page"), "example.org");
    }

    #[test]
    fn image_detection() {
        assert!(is_image("https://cdn.test/a.JPG", None));
        assert!(is_image("https://cdn.test/signed?sig=1", Some("image/png")));
        assert!(!is_image("https://cdn.test/doc.pdf", Some("application/pdf")));
    }
}
