//! Resolution and composition of panels for a slot.
//!
//! [`resolve`] asks every hook of a slot for a panel and orders the answers.
//! [`Composer`] layers the post type's own field-backed meta boxes and the
//! configured allow-list on top, then renders.

use crate::builtins::fields_view;
use crate::config::EditorConfig;
use crate::context::{EditContext, panic_message};
use crate::registry::{MetaBoxRegistry, PanelDescriptor, PanelView, Slot};
use folio_model::MetaBoxDefinition;
use serde::Serialize;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

/// Location of a field-backed meta box that declares none.
const DEFAULT_META_BOX_LOCATION: &str = Slot::SIDEBAR;

/// Panels contributed to `slot` for `ctx`, ordered by priority then title.
///
/// A hook that panics is logged and counts as declining, unless the
/// registry has panic isolation switched off.
pub fn resolve(registry: &MetaBoxRegistry, slot: &str, ctx: &EditContext) -> Vec<PanelDescriptor> {
    resolve_with(registry, slot, ctx, registry.isolate_hook_panics())
}

fn resolve_with(
    registry: &MetaBoxRegistry,
    slot: &str,
    ctx: &EditContext,
    isolate: bool,
) -> Vec<PanelDescriptor> {
    let mut panels = Vec::new();
    let mut seen = HashSet::new();

    for (hook_id, hook) in registry.hooks(slot) {
        let resolved = if isolate {
            match catch_unwind(AssertUnwindSafe(|| hook.resolve(ctx))) {
                Ok(resolved) => resolved,
                Err(payload) => {
                    warn!(
                        slot,
                        hook_id,
                        panic = %panic_message(payload.as_ref()),
                        "Meta box hook failed; skipping"
                    );
                    None
                }
            }
        } else {
            hook.resolve(ctx)
        };

        let Some(panel) = resolved else {
            continue;
        };
        if !seen.insert(panel.id.clone()) {
            warn!(slot, hook_id, panel_id = %panel.id, "Duplicate panel id in slot");
        }
        panels.push(panel);
    }

    sort_panels(&mut panels);
    debug!(slot, panels = panels.len(), "Slot resolved");
    panels
}

/// Stable sort by priority ascending, then title by byte order.
pub fn sort_panels(panels: &mut [PanelDescriptor]) {
    panels.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.title.as_str().cmp(b.title.as_str()))
    });
}

/// Applies a slot allow-list.
///
/// `None` keeps every panel, resolved before fallback. `Some(ids)` keeps
/// only the listed ids, in list order. Either way a panel id appears at
/// most once and the first occurrence wins.
pub fn pick_panels(
    allow: Option<&[String]>,
    resolved: Vec<PanelDescriptor>,
    fallback: Vec<PanelDescriptor>,
) -> Vec<PanelDescriptor> {
    let mut seen = HashSet::new();
    let candidates: Vec<PanelDescriptor> = resolved
        .into_iter()
        .chain(fallback)
        .filter(|panel| seen.insert(panel.id.clone()))
        .collect();

    let Some(allow) = allow else {
        return candidates;
    };

    let mut picked = Vec::with_capacity(allow.len());
    let mut taken = HashSet::new();
    for id in allow {
        if !taken.insert(id.as_str()) {
            continue;
        }
        if let Some(panel) = candidates.iter().find(|panel| &panel.id == id) {
            picked.push(panel.clone());
        }
    }
    picked
}

/// Panels for the post type's own meta boxes located in `slot`.
///
/// A box with no matching field and no renderer key has nothing to show and
/// is left out.
pub fn field_backed_panels(slot: &str, ctx: &EditContext, default_priority: i32) -> Vec<PanelDescriptor> {
    let (Some(post_type), Some(custom)) = (ctx.post_type(), ctx.custom_fields()) else {
        return Vec::new();
    };

    post_type
        .meta_boxes
        .iter()
        .filter(|meta_box| meta_box.location.as_deref().unwrap_or(DEFAULT_META_BOX_LOCATION) == slot)
        .filter(|meta_box| {
            meta_box.renderer_key.is_some()
                || meta_box
                    .field_keys
                    .iter()
                    .any(|key| custom.field(key).is_some())
        })
        .map(|meta_box| meta_box_panel(meta_box, slot, default_priority))
        .collect()
}

fn meta_box_panel(meta_box: &MetaBoxDefinition, slot: &str, default_priority: i32) -> PanelDescriptor {
    let keys = meta_box.field_keys.clone();
    let renderer_key = meta_box.renderer_key.clone();
    let mut panel = PanelDescriptor::new(&meta_box.id, &meta_box.title, slot, move |ctx: &EditContext| {
        let mut view = fields_view(ctx, keys.iter().map(String::as_str));
        if let (Some(renderer), Some(object)) = (&renderer_key, view.as_object_mut()) {
            object.insert("renderer".into(), renderer.clone().into());
        }
        view
    })
    .with_priority(meta_box.priority.unwrap_or(default_priority));
    if let Some(description) = &meta_box.description {
        panel = panel.with_description(description.clone());
    }
    panel
}

/// A rendered panel, ready for the outer UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedPanel {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Slot,
    pub priority: i32,
    pub view: PanelView,
}

/// Turns a registry plus editor config into the panel list of a slot.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    registry: &'a MetaBoxRegistry,
    config: &'a EditorConfig,
}

impl<'a> Composer<'a> {
    pub fn new(registry: &'a MetaBoxRegistry, config: &'a EditorConfig) -> Self {
        Self { registry, config }
    }

    /// Panics are caught only while both the registry and the config ask
    /// for it.
    fn isolate(&self) -> bool {
        self.registry.isolate_hook_panics() && self.config.isolate_hook_panics
    }

    /// Ordered descriptors for `slot`: registered panels merged with the
    /// post type's field-backed meta boxes, filtered by the allow-list.
    pub fn panels(&self, slot: &str, ctx: &EditContext) -> Vec<PanelDescriptor> {
        let resolved = resolve_with(self.registry, slot, ctx, self.isolate());
        let fallback = field_backed_panels(slot, ctx, self.config.default_priority);
        match self.config.allow_list(slot) {
            Some(allow) => pick_panels(Some(allow), resolved, fallback),
            None => {
                let mut panels = pick_panels(None, resolved, fallback);
                sort_panels(&mut panels);
                panels
            }
        }
    }

    /// Renders every panel of `slot`. A panel whose render panics is left
    /// out when panic isolation is on.
    pub fn compose(&self, slot: &str, ctx: &EditContext) -> Vec<ComposedPanel> {
        self.panels(slot, ctx)
            .into_iter()
            .filter_map(|panel| {
                let view = self.render(&panel, slot, ctx)?;
                Some(ComposedPanel {
                    id: panel.id,
                    title: panel.title,
                    description: panel.description,
                    location: panel.location,
                    priority: panel.priority,
                    view,
                })
            })
            .collect()
    }

    fn render(&self, panel: &PanelDescriptor, slot: &str, ctx: &EditContext) -> Option<PanelView> {
        if !self.isolate() {
            return Some(panel.render(ctx));
        }
        match catch_unwind(AssertUnwindSafe(|| panel.render(ctx))) {
            Ok(view) => Some(view),
            Err(payload) => {
                warn!(
                    slot,
                    panel_id = %panel.id,
                    panic = %panic_message(payload.as_ref()),
                    "Panel render failed; skipping"
                );
                None
            }
        }
    }
}
