//! Panels every editor gets.
//!
//! Each hook gates on the capability it needs and on the visibility flags,
//! and renders a JSON view for the outer UI layer.

use crate::context::EditContext;
use crate::registry::{HookToken, MetaBoxRegistry, PanelDescriptor, PanelView, Slot};
use crate::seo::{self, collect_seo_meta};
use crate::vimeo::{self, derive_vimeo_meta};
use folio_model::{CustomFieldValue, FieldDefinition};
use serde_json::{Value, json};
use std::collections::HashSet;

pub const GENERAL_PANEL: &str = "general";
pub const CONTENT_PANEL: &str = "content";
pub const CUSTOM_FIELDS_PANEL: &str = "custom-fields";
pub const ACTIONS_PANEL: &str = "actions";
pub const METADATA_PANEL: &str = "metadata";
pub const ATTACHMENTS_PANEL: &str = "attachments";
pub const VIMEO_PANEL: &str = "vimeo";
pub const SEO_PANEL: &str = "seo";

/// Plugin id the Vimeo panel belongs to.
pub const VIMEO_PLUGIN_ID: &str = "vimeo";

/// Registers the built-in panels and returns their tokens.
pub fn register_builtin_meta_boxes(registry: &mut MetaBoxRegistry) -> Vec<HookToken> {
    vec![
        registry.register(Slot::MAIN, GENERAL_PANEL, general_panel),
        registry.register(Slot::MAIN, CONTENT_PANEL, content_panel),
        registry.register(Slot::MAIN, ATTACHMENTS_PANEL, attachments_panel),
        registry.register(Slot::MAIN, CUSTOM_FIELDS_PANEL, custom_fields_panel),
        registry.register(Slot::SIDEBAR, ACTIONS_PANEL, actions_panel),
        registry.register(Slot::SIDEBAR, METADATA_PANEL, metadata_panel),
        registry.register(Slot::SIDEBAR, VIMEO_PANEL, vimeo_panel),
        registry.register(Slot::tab(SEO_PANEL), SEO_PANEL, seo_panel),
    ]
}

fn general_panel(ctx: &EditContext) -> Option<PanelDescriptor> {
    if !ctx.visibility().general_panel() {
        return None;
    }
    ctx.general()?;
    let panel = PanelDescriptor::new(GENERAL_PANEL, "General", Slot::MAIN, |ctx: &EditContext| {
        let Some(general) = ctx.general() else {
            return Value::Null;
        };
        json!({
            "title": general.title(),
            "slug": general.slug(),
            "excerpt": general.excerpt(),
            "status": general.status(),
            "slugPreviewUrl": ctx.slug_preview_url(),
            "dirty": general.any_dirty(),
        })
    });
    Some(panel.with_priority(0))
}

fn content_panel(ctx: &EditContext) -> Option<PanelDescriptor> {
    let supports_editor = ctx.post_type().is_none_or(|pt| pt.supports.editor);
    if !supports_editor {
        return None;
    }
    ctx.general()?;
    let panel = PanelDescriptor::new(CONTENT_PANEL, "Content", Slot::MAIN, |ctx: &EditContext| {
        json!({
            "content": ctx.general().map(|g| g.content()).unwrap_or_default(),
            "label": ctx.header_label(),
        })
    });
    Some(panel.with_priority(10))
}

fn attachments_panel(ctx: &EditContext) -> Option<PanelDescriptor> {
    ctx.attachments()?;
    let panel = PanelDescriptor::new(ATTACHMENTS_PANEL, "Attachments", Slot::MAIN, |ctx: &EditContext| {
        let Some(attachments) = ctx.attachments() else {
            return Value::Null;
        };
        json!({
            "attachments": attachments.attachments(),
            "dialogOpen": attachments.is_dialog_open(),
        })
    });
    Some(
        panel
            .with_priority(20)
            .with_description("Media attached to this entry."),
    )
}

/// Custom fields not claimed by one of the post type's meta boxes.
fn unassigned_fields(ctx: &EditContext) -> Vec<&FieldDefinition> {
    let Some(custom) = ctx.custom_fields() else {
        return Vec::new();
    };
    let assigned: HashSet<&str> = ctx
        .post_type()
        .map(|pt| {
            pt.meta_boxes
                .iter()
                .flat_map(|mb| mb.field_keys.iter().map(String::as_str))
                .collect()
        })
        .unwrap_or_default();
    custom
        .fields()
        .iter()
        .filter(|field| !assigned.contains(field.key.as_str()))
        .collect()
}

fn custom_fields_panel(ctx: &EditContext) -> Option<PanelDescriptor> {
    if !ctx.visibility().custom_fields_panel() || unassigned_fields(ctx).is_empty() {
        return None;
    }
    let panel = PanelDescriptor::new(CUSTOM_FIELDS_PANEL, "Custom Fields", Slot::MAIN, |ctx: &EditContext| {
        let keys: Vec<String> = unassigned_fields(ctx).iter().map(|f| f.key.clone()).collect();
        fields_view(ctx, keys.iter().map(String::as_str))
    });
    Some(panel.with_priority(90))
}

fn actions_panel(ctx: &EditContext) -> Option<PanelDescriptor> {
    if !ctx.visibility().sidebar_actions() {
        return None;
    }
    ctx.sidebar()?;
    let panel = PanelDescriptor::new(ACTIONS_PANEL, "Actions", Slot::SIDEBAR, |ctx: &EditContext| {
        let Some(sidebar) = ctx.sidebar() else {
            return Value::Null;
        };
        let can_duplicate = sidebar.can_duplicate();
        let mut view = serde_json::to_value(sidebar).unwrap_or(Value::Null);
        if let Some(object) = view.as_object_mut() {
            object.insert("canDuplicate".into(), can_duplicate.into());
        }
        view
    });
    Some(panel.with_priority(0))
}

fn metadata_panel(ctx: &EditContext) -> Option<PanelDescriptor> {
    if !ctx.visibility().sidebar_metadata() {
        return None;
    }
    ctx.general()?;
    let panel = PanelDescriptor::new(METADATA_PANEL, "Metadata", Slot::SIDEBAR, |ctx: &EditContext| {
        let post = ctx.post();
        json!({
            "postType": ctx.header_label(),
            "id": post.map(|p| p.id.to_string()),
            "createdAt": post.and_then(|p| p.created_at.to_rfc3339()),
            "updatedAt": post.and_then(|p| p.updated_at).and_then(|t| t.to_rfc3339()),
            "status": ctx.general().map(|g| g.status().label()),
        })
    });
    Some(panel.with_priority(10))
}

fn vimeo_panel(ctx: &EditContext) -> Option<PanelDescriptor> {
    if !vimeo::tracks_vimeo(ctx.slug()) || !ctx.plugin_enabled(VIMEO_PLUGIN_ID) {
        return None;
    }
    ctx.general()?;
    let panel = PanelDescriptor::new(VIMEO_PANEL, "Vimeo", Slot::SIDEBAR, |ctx: &EditContext| {
        let derived = ctx.general().and_then(|g| derive_vimeo_meta(g.content()));
        json!({
            "videoId": derived.as_ref().and_then(|m| m.video_id.clone()),
            "embedUrl": derived.as_ref().and_then(|m| m.embed_url.clone()),
            "thumbnailUrl": derived.as_ref().and_then(|m| m.thumbnail_url.clone()),
        })
    });
    Some(
        panel
            .with_priority(30)
            .with_description("Video detected in the lesson body."),
    )
}

fn seo_panel(ctx: &EditContext) -> Option<PanelDescriptor> {
    ctx.custom_fields()?;
    let panel = PanelDescriptor::new(SEO_PANEL, "SEO", Slot::tab(SEO_PANEL), |ctx: &EditContext| {
        serde_json::to_value(seo::snippet(ctx)).unwrap_or(Value::Null)
    })
    .with_priority(0)
    .with_mount(|ctx: &EditContext| {
        vec![ctx.register_meta_payload_collector(|ctx: &EditContext| Some(collect_seo_meta(ctx)))]
    });
    Some(panel)
}

/// JSON view of one field and its live value.
pub fn field_view(field: &FieldDefinition, value: Option<&CustomFieldValue>) -> PanelView {
    json!({
        "key": field.key,
        "name": field.name,
        "description": field.description,
        "type": field.field_type,
        "required": field.required,
        "readOnly": field.read_only || field.is_system,
        "options": field.options,
        "source": field.source.tag(),
        "value": value.cloned().unwrap_or_default(),
    })
}

/// `{"fields": [...]}` for the given keys, skipping unknown ones.
pub fn fields_view<'a>(ctx: &EditContext, keys: impl Iterator<Item = &'a str>) -> PanelView {
    let Some(custom) = ctx.custom_fields() else {
        return json!({ "fields": [] });
    };
    let fields: Vec<PanelView> = keys
        .filter_map(|key| custom.field(key))
        .map(|field| field_view(field, custom.value(&field.key)))
        .collect();
    json!({ "fields": fields })
}
