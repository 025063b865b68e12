//! Meta-box registry: named slots holding ordered hooks.
//!
//! A hook looks at an [`EditContext`] and either contributes a
//! [`PanelDescriptor`] to its slot or declines with `None`. The registry is
//! an explicit value handed to the editor by its composition root; nothing
//! is registered globally.

use crate::config::DEFAULT_PRIORITY;
use crate::context::{CollectorHandle, EditContext};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Opaque render output consumed by the outer UI layer.
pub type PanelView = serde_json::Value;

type RenderFn = Arc<dyn Fn(&EditContext) -> PanelView + Send + Sync>;
type MountFn = Arc<dyn Fn(&EditContext) -> Vec<CollectorHandle> + Send + Sync>;

/// A named location in the editor layout. Any string is a valid slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(String);

impl Slot {
    pub const MAIN: &'static str = "main";
    pub const SIDEBAR: &'static str = "sidebar";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn main() -> Self {
        Self::new(Self::MAIN)
    }

    pub fn sidebar() -> Self {
        Self::new(Self::SIDEBAR)
    }

    /// `tab:<id>`.
    pub fn tab(id: &str) -> Self {
        Self(format!("tab:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tab id, if this is a `tab:` slot.
    pub fn tab_id(&self) -> Option<&str> {
        self.0.strip_prefix("tab:")
    }
}

impl Borrow<str> for Slot {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Slot {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Slot {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One panel as resolved for the current context. Built fresh on every
/// resolution and never cached across contexts.
#[derive(Clone)]
pub struct PanelDescriptor {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Slot,
    pub priority: i32,
    render: RenderFn,
    mount: Option<MountFn>,
}

impl PanelDescriptor {
    pub fn new<F>(id: &str, title: &str, location: impl Into<Slot>, render: F) -> Self
    where
        F: Fn(&EditContext) -> PanelView + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            location: location.into(),
            priority: DEFAULT_PRIORITY,
            render: Arc::new(render),
            mount: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Runs when the panel's slot is mounted; returned collector handles are
    /// released when the slot unmounts.
    pub fn with_mount<F>(mut self, mount: F) -> Self
    where
        F: Fn(&EditContext) -> Vec<CollectorHandle> + Send + Sync + 'static,
    {
        self.mount = Some(Arc::new(mount));
        self
    }

    pub fn render(&self, ctx: &EditContext) -> PanelView {
        (self.render)(ctx)
    }

    pub fn mount(&self, ctx: &EditContext) -> Vec<CollectorHandle> {
        match &self.mount {
            Some(mount) => mount(ctx),
            None => Vec::new(),
        }
    }

    pub fn has_mount(&self) -> bool {
        self.mount.is_some()
    }
}

impl fmt::Debug for PanelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelDescriptor")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("location", &self.location)
            .field("priority", &self.priority)
            .field("has_mount", &self.mount.is_some())
            .finish()
    }
}

/// Contributes at most one panel per resolution. Must only read the context.
pub trait MetaBoxHook: Send + Sync {
    fn resolve(&self, ctx: &EditContext) -> Option<PanelDescriptor>;
}

impl<F> MetaBoxHook for F
where
    F: Fn(&EditContext) -> Option<PanelDescriptor> + Send + Sync,
{
    fn resolve(&self, ctx: &EditContext) -> Option<PanelDescriptor> {
        self(ctx)
    }
}

/// Proof of a registration; pass back to [`MetaBoxRegistry::unregister`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookToken {
    slot: Slot,
    hook_id: String,
    seq: u64,
}

impl HookToken {
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn hook_id(&self) -> &str {
        &self.hook_id
    }
}

struct HookEntry {
    id: String,
    seq: u64,
    hook: Arc<dyn MetaBoxHook>,
}

pub struct MetaBoxRegistry {
    slots: BTreeMap<Slot, Vec<HookEntry>>,
    next_seq: u64,
    isolate_hook_panics: bool,
}

impl Default for MetaBoxRegistry {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
            next_seq: 0,
            isolate_hook_panics: true,
        }
    }
}

impl MetaBoxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook` to `slot` under `hook_id`.
    ///
    /// Registration is keyed by `(slot, hook_id)`: registering the same key
    /// again leaves the first hook in place and returns its token.
    pub fn register<H>(&mut self, slot: impl Into<Slot>, hook_id: &str, hook: H) -> HookToken
    where
        H: MetaBoxHook + 'static,
    {
        let slot = slot.into();
        let entries = self.slots.entry(slot.clone()).or_default();

        if let Some(existing) = entries.iter().find(|entry| entry.id == hook_id) {
            debug!(slot = %slot, hook_id, "Hook already registered; keeping the first");
            return HookToken {
                slot,
                hook_id: hook_id.to_string(),
                seq: existing.seq,
            };
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        entries.push(HookEntry {
            id: hook_id.to_string(),
            seq,
            hook: Arc::new(hook),
        });
        debug!(slot = %slot, hook_id, "Meta box hook registered");
        HookToken {
            slot,
            hook_id: hook_id.to_string(),
            seq,
        }
    }

    /// Removes the hook `token` was issued for. Returns `false` if it is
    /// already gone.
    pub fn unregister(&mut self, token: &HookToken) -> bool {
        let Some(entries) = self.slots.get_mut(token.slot.as_str()) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| !(entry.id == token.hook_id && entry.seq == token.seq));
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.slots.remove(token.slot.as_str());
        }
        if removed {
            debug!(slot = %token.slot, hook_id = %token.hook_id, "Meta box hook unregistered");
        }
        removed
    }

    /// Hooks of `slot` in registration order.
    pub fn hooks(&self, slot: &str) -> impl Iterator<Item = (&str, &dyn MetaBoxHook)> {
        self.slots
            .get(slot)
            .into_iter()
            .flatten()
            .map(|entry| (entry.id.as_str(), entry.hook.as_ref()))
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.keys()
    }

    pub fn contains(&self, slot: &str, hook_id: &str) -> bool {
        self.hooks(slot).any(|(id, _)| id == hook_id)
    }

    /// Total hooks across all slots.
    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn isolate_hook_panics(&self) -> bool {
        self.isolate_hook_panics
    }

    pub fn set_isolate_hook_panics(&mut self, isolate: bool) {
        self.isolate_hook_panics = isolate;
    }
}

impl fmt::Debug for MetaBoxRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: BTreeMap<&str, Vec<&str>> = self
            .slots
            .iter()
            .map(|(slot, entries)| {
                (
                    slot.as_str(),
                    entries.iter().map(|entry| entry.id.as_str()).collect(),
                )
            })
            .collect();
        f.debug_struct("MetaBoxRegistry")
            .field("slots", &slots)
            .field("isolate_hook_panics", &self.isolate_hook_panics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none_hook(_: &EditContext) -> Option<PanelDescriptor> {
        None
    }

    #[test]
    fn tab_slot_round_trips_id() {
        let slot = Slot::tab("seo");
        assert_eq!(slot.as_str(), "tab:seo");
        assert_eq!(slot.tab_id(), Some("seo"));
        assert_eq!(Slot::main().tab_id(), None);
    }

    #[test]
    fn same_key_registers_once() {
        let mut registry = MetaBoxRegistry::new();
        let first = registry.register("main", "a", none_hook);
        let second = registry.register("main", "a", none_hook);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);

        // Same id in another slot is a different key.
        registry.register("sidebar", "a", none_hook);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn stale_token_does_not_remove_new_registration() {
        let mut registry = MetaBoxRegistry::new();
        let old = registry.register("main", "a", none_hook);
        assert!(registry.unregister(&old));
        registry.register("main", "a", none_hook);

        assert!(!registry.unregister(&old));
        assert!(registry.contains("main", "a"));
    }

    #[test]
    fn empty_slot_is_dropped() {
        let mut registry = MetaBoxRegistry::new();
        let token = registry.register("tab:seo", "seo", none_hook);
        registry.unregister(&token);
        assert_eq!(registry.slots().count(), 0);
        assert!(registry.is_empty());
    }
}
