//! Attachments sub-context, backed by the `attachments` meta key.
//!
//! The key stores a JSON array of entries. Malformed or foreign data never
//! fails the editor: it loads as an empty list and a warning is logged.

use folio_model::{CustomFieldValue, MediaItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const ATTACHMENTS_META_KEY: &str = "attachments";

/// One attached media item as stored in meta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentEntry {
    pub media_item_id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl AttachmentEntry {
    pub fn new(media_item_id: &str, url: &str) -> Self {
        Self {
            media_item_id: media_item_id.into(),
            url: url.into(),
            title: None,
            alt: None,
            mime_type: None,
            width: None,
            height: None,
        }
    }

    /// Lenient read of one stored element. Entries missing an id or URL are
    /// dropped; optional fields of the wrong type are ignored. Optional
    /// strings are kept as stored, blank ones included.
    fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(String::from);
        let required = |key: &str| text(key).filter(|s| !s.trim().is_empty());
        let dimension = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
        };
        Some(Self {
            media_item_id: required("mediaItemId")?,
            url: required("url")?,
            title: text("title"),
            alt: text("alt"),
            mime_type: text("mimeType"),
            width: dimension("width"),
            height: dimension("height"),
        })
    }
}

impl From<&MediaItem> for AttachmentEntry {
    fn from(item: &MediaItem) -> Self {
        Self {
            media_item_id: item.id.to_string(),
            url: item.url.clone(),
            title: item.title.clone(),
            alt: item.alt.clone(),
            mime_type: item.mime_type.clone(),
            width: item.width,
            height: item.height,
        }
    }
}

/// Feedback for a selection that changed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentNotice {
    #[error("This media item is already attached.")]
    Duplicate { media_item_id: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentsContext {
    entries: Vec<AttachmentEntry>,
    dialog_open: bool,
}

impl AttachmentsContext {
    /// Parses the stored meta value. Anything but a JSON array of objects
    /// yields an empty list.
    pub fn from_stored(raw: Option<&CustomFieldValue>) -> Self {
        Self {
            entries: parse_entries(raw),
            dialog_open: false,
        }
    }

    pub fn attachments(&self) -> &[AttachmentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, media_item_id: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.media_item_id == media_item_id)
    }

    /// Appends a library item unless it is already attached.
    pub fn select(&mut self, item: &MediaItem) -> Result<(), AttachmentNotice> {
        self.select_entry(AttachmentEntry::from(item))
    }

    pub fn select_entry(&mut self, entry: AttachmentEntry) -> Result<(), AttachmentNotice> {
        if self.contains(&entry.media_item_id) {
            return Err(AttachmentNotice::Duplicate {
                media_item_id: entry.media_item_id,
            });
        }
        debug!(media_item_id = %entry.media_item_id, "Attachment added");
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, media_item_id: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.media_item_id != media_item_id);
        self.entries.len() != before
    }

    /// Moves `active` to the position of `over`, shifting the items between
    /// them. A no-op if either id is missing or both are the same.
    pub fn reorder(&mut self, active: &str, over: &str) -> bool {
        if active == over {
            return false;
        }
        let from = self.entries.iter().position(|e| e.media_item_id == active);
        let to = self.entries.iter().position(|e| e.media_item_id == over);
        let (Some(from), Some(to)) = (from, to) else {
            return false;
        };
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        true
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn set_dialog_open(&mut self, open: bool) {
        self.dialog_open = open;
    }

    /// JSON for the meta payload; `None` when nothing is attached.
    pub fn serialized_value(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        match serde_json::to_string(&self.entries) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Failed to serialize attachments: {}", e);
                None
            }
        }
    }
}

pub(crate) fn parse_entries(raw: Option<&CustomFieldValue>) -> Vec<AttachmentEntry> {
    let Some(text) = raw.and_then(CustomFieldValue::as_str) else {
        return Vec::new();
    };
    if text.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items.iter().filter_map(AttachmentEntry::from_json).collect(),
        Ok(_) => {
            warn!("Stored attachments are not a JSON array; ignoring");
            Vec::new()
        }
        Err(e) => {
            warn!("Stored attachments are not valid JSON: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(ctx: &AttachmentsContext) -> Vec<&str> {
        ctx.attachments()
            .iter()
            .map(|e| e.media_item_id.as_str())
            .collect()
    }

    fn abc() -> AttachmentsContext {
        let mut ctx = AttachmentsContext::default();
        for id in ["A", "B", "C"] {
            ctx.select_entry(AttachmentEntry::new(id, &format!("https://cdn.test/{id}.png")))
                .unwrap();
        }
        ctx
    }

    #[test]
    fn reorder_moves_to_target_position() {
        let mut ctx = abc();
        assert!(ctx.reorder("C", "A"));
        assert_eq!(ids(&ctx), vec!["C", "A", "B"]);

        assert!(ctx.reorder("C", "B"));
        assert_eq!(ids(&ctx), vec!["A", "B", "C"]);
    }

    #[test]
    fn reorder_noops() {
        let mut ctx = abc();
        assert!(!ctx.reorder("A", "A"));
        assert!(!ctx.reorder("Z", "A"));
        assert!(!ctx.reorder("A", "Z"));
        assert_eq!(ids(&ctx), vec!["A", "B", "C"]);
    }

    #[test]
    fn blank_optional_strings_survive() {
        let mut entry = AttachmentEntry::new("a", "https://cdn.test/a.png");
        entry.title = Some(String::new());
        entry.alt = Some("  ".into());
        let raw = CustomFieldValue::from(serde_json::to_string(&vec![entry.clone()]).unwrap());

        let ctx = AttachmentsContext::from_stored(Some(&raw));
        assert_eq!(ctx.attachments(), &[entry]);
    }

    #[test]
    fn entries_without_id_or_url_are_skipped() {
        let raw = CustomFieldValue::from(
            r#"[{"mediaItemId":"a","url":"u","width":"wide"},{"url":"x"},{"mediaItemId":"b"},7]"#,
        );
        let ctx = AttachmentsContext::from_stored(Some(&raw));
        assert_eq!(ids(&ctx), vec!["a"]);
        assert_eq!(ctx.attachments()[0].width, None);
    }

    #[test]
    fn non_text_meta_is_empty() {
        let ctx = AttachmentsContext::from_stored(Some(&CustomFieldValue::Bool(true)));
        assert!(ctx.is_empty());
        assert_eq!(ctx.serialized_value(), None);
    }

    // ── Round trip ───────────────────────────────────────────────────

    fn arb_entry() -> impl Strategy<Value = AttachmentEntry> {
        (
            "[a-z0-9]{1,8}",
            "https://cdn\\.test/[a-z]{1,8}\\.png",
            proptest::option::of(".{0,12}"),
            proptest::option::of(".{0,12}"),
            proptest::option::of("(image|video)/[a-z]{2,4}"),
            proptest::option::of(any::<u32>()),
            proptest::option::of(any::<u32>()),
        )
            .prop_map(|(id, url, title, alt, mime_type, width, height)| AttachmentEntry {
                media_item_id: id,
                url,
                title,
                alt,
                mime_type,
                width,
                height,
            })
    }

    proptest! {
        #[test]
        fn serialized_entries_parse_back_unchanged(
            entries in proptest::collection::vec(arb_entry(), 1..8)
        ) {
            let mut ctx = AttachmentsContext::default();
            for entry in entries {
                let _ = ctx.select_entry(entry);
            }
            let raw = CustomFieldValue::from(ctx.serialized_value().unwrap());
            let reloaded = AttachmentsContext::from_stored(Some(&raw));
            prop_assert_eq!(reloaded.attachments(), ctx.attachments());
        }
    }
}
