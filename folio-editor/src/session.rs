//! Editor session: one entry open in the editor, plus the sidebar actions
//! that write it back.

use crate::config::EditorConfig;
use crate::context::{CollectorHandle, EditContext, EntitySnapshot};
use crate::error::{EditorError, EditorResult, ValidationError};
use crate::payload::build_meta_payload;
use crate::registry::{MetaBoxRegistry, Slot};
use crate::resolve::{ComposedPanel, Composer};
use crate::slug::{generate_slug, normalize_slug};
use folio_model::{EntityPayload, FieldDefinition, PostType, PostTypeHandler, StorageKind};
use folio_plugin_host::PluginManager;
use folio_storage::{
    EntityReader, EntityWriter, FieldCatalog, Loadable, MetaReader, PostTypeCatalog, SiteOptions,
};
use folio_types::{OrganizationId, PostId};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SAVE_FALLBACK_MESSAGE: &str = "Failed to save this entry.";
const DUPLICATE_FALLBACK_MESSAGE: &str = "Failed to duplicate this entry.";

/// What a successful save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(PostId),
    Updated(PostId),
    /// The post type keeps its entries elsewhere; nothing was written.
    Skipped,
}

impl SaveOutcome {
    pub fn post_id(&self) -> Option<PostId> {
        match self {
            Self::Created(id) | Self::Updated(id) => Some(*id),
            Self::Skipped => None,
        }
    }
}

/// Parameters for [`EditSession::open`].
#[derive(Clone, Default)]
pub struct OpenRequest {
    pub slug: String,
    /// `None` opens a new draft.
    pub post_id: Option<PostId>,
    pub organization: Option<OrganizationId>,
    pub post_type: Option<PostType>,
    pub plugin_fields: Vec<FieldDefinition>,
    pub enabled_plugins: BTreeSet<String>,
    pub page_identifier: Option<String>,
    pub handler: Option<Arc<dyn PostTypeHandler>>,
}

impl OpenRequest {
    pub fn new_record(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    pub fn existing(slug: &str, post_id: PostId) -> Self {
        Self {
            slug: slug.to_string(),
            post_id: Some(post_id),
            ..Default::default()
        }
    }

    pub fn with_organization(mut self, organization: OrganizationId) -> Self {
        self.organization = Some(organization);
        self
    }

    /// Takes the plugin snapshot from the tenant's activation state: the
    /// fields plugins contribute to this post type and the enabled ids.
    /// Without an organization no plugin counts as enabled.
    pub fn with_plugins<P>(mut self, plugins: &PluginManager<P>) -> Self
    where
        P: SiteOptions + PostTypeCatalog,
    {
        self.plugin_fields = plugins.field_definitions_for(&self.slug);
        self.enabled_plugins = self
            .organization
            .map(|organization| plugins.enabled_plugins(organization))
            .unwrap_or_default();
        self
    }
}

pub struct EditSession<S> {
    store: Arc<S>,
    registry: Arc<MetaBoxRegistry>,
    config: EditorConfig,
    ctx: EditContext,
    handler: Option<Arc<dyn PostTypeHandler>>,
    mounted: BTreeMap<Slot, Vec<CollectorHandle>>,
    active_tab: Option<String>,
}

impl<S> EditSession<S>
where
    S: EntityReader + EntityWriter + FieldCatalog + MetaReader,
{
    pub fn new(store: Arc<S>, registry: Arc<MetaBoxRegistry>, config: EditorConfig, ctx: EditContext) -> Self {
        Self {
            store,
            registry,
            config,
            ctx,
            handler: None,
            mounted: BTreeMap::new(),
            active_tab: None,
        }
    }

    /// Loads the entry (if any) with its fields and meta and builds the
    /// context. Mirrors the entity read: `Loading` and `NotFound` pass
    /// through.
    pub fn open(
        store: Arc<S>,
        registry: Arc<MetaBoxRegistry>,
        config: EditorConfig,
        request: OpenRequest,
    ) -> Loadable<Self> {
        let post = match request.post_id {
            Some(id) => match store.get_entity(id, request.organization) {
                Loadable::Ready(post) => Some(post),
                Loadable::Loading => return Loadable::Loading,
                Loadable::NotFound => {
                    debug!(post_id = %id, "Entry not found");
                    return Loadable::NotFound;
                }
            },
            None => None,
        };

        let mut builder = EditContext::builder(&request.slug)
            .config(&config)
            .new_record(post.is_none())
            .fields(store.list_fields_for_type(&request.slug))
            .plugin_fields(request.plugin_fields)
            .enabled_plugins(request.enabled_plugins);
        if let Some(mut post) = post {
            if let Some(handler) = &request.handler {
                handler.on_after_load(&mut post);
            }
            builder = builder.stored_meta(store.get_meta_for_entity(post.id)).post(post);
        }
        if let Some(post_type) = request.post_type {
            builder = builder.post_type(post_type);
        }
        if let Some(organization) = request.organization {
            builder = builder.organization(organization);
        }
        if let Some(page_identifier) = &request.page_identifier {
            builder = builder.page_identifier(page_identifier);
        }

        let mut session = Self::new(store, registry, config, builder.build());
        session.handler = request.handler;
        Loadable::Ready(session)
    }

    pub fn with_handler(mut self, handler: Arc<dyn PostTypeHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn context(&self) -> &EditContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EditContext {
        &mut self.ctx
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn registry(&self) -> &MetaBoxRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ================================================================
    // Panels
    // ================================================================

    pub fn compose(&self, slot: &str) -> Vec<ComposedPanel> {
        Composer::new(&self.registry, &self.config).compose(slot, &self.ctx)
    }

    /// Mounts every panel of `slot` and keeps the collectors they register.
    /// Mounting an already mounted slot is a no-op. Returns the number of
    /// collectors held for the slot.
    pub fn mount_slot(&mut self, slot: &str) -> usize {
        if let Some(handles) = self.mounted.get(slot) {
            return handles.len();
        }
        let panels = Composer::new(&self.registry, &self.config).panels(slot, &self.ctx);
        let handles: Vec<CollectorHandle> = panels
            .iter()
            .filter(|panel| panel.has_mount())
            .flat_map(|panel| panel.mount(&self.ctx))
            .collect();
        debug!(slot, collectors = handles.len(), "Slot mounted");
        let count = handles.len();
        self.mounted.insert(Slot::new(slot), handles);
        count
    }

    /// Releases the collectors registered when `slot` was mounted.
    pub fn unmount_slot(&mut self, slot: &str) -> usize {
        let Some(handles) = self.mounted.remove(slot) else {
            return 0;
        };
        let released = handles
            .into_iter()
            .filter(|handle| self.ctx.unregister_meta_payload_collector(*handle))
            .count();
        debug!(slot, collectors = released, "Slot unmounted");
        released
    }

    pub fn is_mounted(&self, slot: &str) -> bool {
        self.mounted.contains_key(slot)
    }

    /// Switches to the tab named by a `?tab=` query, unmounting the previous
    /// tab slot. Returns the tab that is now active.
    pub fn select_tab(&mut self, query: Option<&str>) -> String {
        let tab = self.ctx.normalize_tab(query);
        if self.active_tab.as_deref() == Some(tab.as_str()) {
            return tab;
        }
        if let Some(previous) = self.active_tab.take() {
            self.unmount_slot(Slot::tab(&previous).as_str());
        }
        self.mount_slot(Slot::tab(&tab).as_str());
        self.active_tab = Some(tab.clone());
        tab
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    // ================================================================
    // Save
    // ================================================================

    /// Validates and writes the entry. `is_saving` is cleared on every
    /// path; a failure leaves its message in the sidebar.
    pub fn save(&mut self) -> EditorResult<SaveOutcome> {
        if self.ctx.is_saving() {
            return Err(EditorError::AlreadyInFlight);
        }
        self.ctx.set_saving(true);
        let result = self.write_entry();
        self.ctx.set_saving(false);

        match &result {
            Ok(_) => self.ctx.set_save_error(None),
            Err(e) => {
                warn!(post_type = %self.ctx.slug(), "Save failed: {}", e);
                self.ctx.set_save_error(Some(e.user_message(SAVE_FALLBACK_MESSAGE)));
            }
        }
        result
    }

    fn write_entry(&mut self) -> EditorResult<SaveOutcome> {
        if !self.ctx.can_save_record() {
            return Err(EditorError::SaveUnavailable);
        }
        let storage_kind = self.ctx.storage_kind();
        if storage_kind == StorageKind::Custom {
            info!(post_type = %self.ctx.slug(), "Entries are stored by their plugin; skipping core write");
            return Ok(SaveOutcome::Skipped);
        }
        let payload = self.entry_payload(storage_kind)?;
        self.validate(&payload)?;

        let outcome = match self.ctx.post_id() {
            Some(id) if !self.ctx.is_new_record() => {
                self.store.update_entity(id, payload)?;
                SaveOutcome::Updated(id)
            }
            _ => SaveOutcome::Created(self.store.create_entity(payload)?),
        };

        if let Some(id) = outcome.post_id() {
            info!(post_type = %self.ctx.slug(), post_id = %id, "Entry saved");
            self.reload(id);
        }
        Ok(outcome)
    }

    fn entry_payload(&self, storage_kind: StorageKind) -> EditorResult<EntityPayload> {
        let general = self.ctx.general().ok_or(EditorError::SaveUnavailable)?;
        let title = general.title().trim();
        if storage_kind == StorageKind::Posts && title.is_empty() {
            return Err(ValidationError::TitleRequired.into());
        }
        if storage_kind == StorageKind::Component && self.ctx.organization().is_none() {
            return Err(ValidationError::OrganizationRequired.into());
        }
        self.ctx.run_before_save()?;

        let meta = build_meta_payload(&self.ctx);
        Ok(EntityPayload {
            post_type_slug: self.ctx.slug().to_string(),
            organization_id: self.ctx.organization(),
            title: title.to_string(),
            slug: normalize_slug(general.slug(), title),
            content: general.content().to_string(),
            excerpt: general.excerpt().to_string(),
            status: general.status(),
            meta: (!meta.is_empty()).then_some(meta),
        })
    }

    fn validate(&self, payload: &EntityPayload) -> EditorResult<()> {
        if let Some(handler) = &self.handler {
            handler
                .validate(payload)
                .map_err(ValidationError::Rejected)?;
        }
        Ok(())
    }

    /// Re-reads the entry after a write so the context reflects what was
    /// stored.
    fn reload(&mut self, id: PostId) {
        let mut post = match self.store.get_entity(id, self.ctx.organization()) {
            Loadable::Ready(post) => post,
            other => {
                debug!(post_id = %id, loading = other.is_loading(), "Saved entry not readable yet");
                return;
            }
        };
        if let Some(handler) = &self.handler {
            handler.on_after_load(&mut post);
        }
        let snapshot = EntitySnapshot {
            fields: self.store.list_fields_for_type(self.ctx.slug()),
            plugin_fields: self.ctx.plugin_fields(),
            stored_meta: self.store.get_meta_for_entity(id),
            post: Some(post),
        };
        self.ctx.refresh(snapshot);
        if let Some(general) = self.ctx.general_mut() {
            general.mark_clean();
        }
    }

    // ================================================================
    // Duplicate
    // ================================================================

    /// Creates a copy of a saved entry. Returns the new entry's id; the
    /// session stays on the original.
    pub fn duplicate(&mut self) -> EditorResult<PostId> {
        if self.ctx.is_duplicating() {
            return Err(EditorError::AlreadyInFlight);
        }
        self.ctx.set_duplicating(true);
        let result = self.write_copy();
        self.ctx.set_duplicating(false);

        match &result {
            Ok(id) => {
                info!(post_type = %self.ctx.slug(), post_id = %id, "Entry duplicated");
                self.ctx.set_save_error(None);
            }
            Err(e) => {
                warn!(post_type = %self.ctx.slug(), "Duplicate failed: {}", e);
                self.ctx
                    .set_save_error(Some(e.user_message(DUPLICATE_FALLBACK_MESSAGE)));
            }
        }
        result
    }

    fn write_copy(&self) -> EditorResult<PostId> {
        let (Some(post), Some(general)) = (self.ctx.post(), self.ctx.general()) else {
            return Err(ValidationError::NotSaved.into());
        };
        if !self.ctx.supports_posts_table() || self.ctx.is_new_record() {
            return Err(ValidationError::NotSaved.into());
        }

        let title = match general.title().trim() {
            "" => format!(
                "{} (copy)",
                post.title.as_deref().unwrap_or(self.ctx.header_label())
            ),
            title => title.to_string(),
        };
        let base = match general.slug().trim() {
            "" => post
                .slug
                .clone()
                .filter(|slug| !slug.is_empty())
                .unwrap_or_else(|| generate_slug(&title)),
            slug => slug.to_string(),
        };
        // Never empty: the suffix alone slugs to "copy".
        let slug = generate_slug(&format!("{base}-copy"));
        // Unknown stored statuses fall back to draft.
        let status = post.post_status().unwrap_or_default();

        let meta = build_meta_payload(&self.ctx);
        let payload = EntityPayload {
            post_type_slug: self.ctx.slug().to_string(),
            organization_id: self.ctx.organization(),
            title,
            slug,
            content: general.content().to_string(),
            excerpt: general.excerpt().to_string(),
            status,
            meta: (!meta.is_empty()).then_some(meta),
        };
        self.validate(&payload)?;
        Ok(self.store.create_entity(payload)?)
    }
}

impl<S> fmt::Debug for EditSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("ctx", &self.ctx)
            .field("mounted", &self.mounted.keys().collect::<Vec<_>>())
            .field("active_tab", &self.active_tab)
            .finish()
    }
}
