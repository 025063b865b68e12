//! The edit context: everything one editor session knows about the entry
//! being edited.
//!
//! Panels receive `&EditContext`. Capabilities are exposed as optional
//! sub-contexts ([`EditContext::general`], [`EditContext::custom_fields`],
//! [`EditContext::sidebar`], [`EditContext::attachments`],
//! [`EditContext::taxonomy`]); a hook that needs one returns `None` when it
//! is absent.

mod collectors;
mod custom_fields;
mod general;
mod sidebar;
mod taxonomy;

pub use collectors::{BeforeSaveHandle, CollectorHandle};
pub use custom_fields::{CustomFields, PAGE_BUILDER_META_KEY};
pub use general::{GeneralField, GeneralFields};
pub use sidebar::{SidebarContext, StatusOption, status_options};
pub use taxonomy::{TaxonomyContext, terms_meta_key};

pub(crate) use collectors::panic_message;

use crate::attachments::{ATTACHMENTS_META_KEY, AttachmentsContext};
use crate::config::{EditorConfig, Visibility};
use crate::error::ValidationError;
use crate::hydration::general_signature;
use crate::registry::Slot;
use collectors::{BeforeSave, Collector, HandlerList, run_collectors};
use folio_model::{
    CustomFieldValue, FieldDefinition, MetaEntry, MetaMap, Post, PostType, SingleViewTab,
    StorageKind, meta_map,
};
use folio_types::{OrganizationId, PostId};
use sidebar::SidebarState;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Post types the core ships; they save to the posts table even without a
/// stored post type definition.
pub const BUILTIN_POST_TYPES: &[&str] = &["posts", "pages"];

/// Tab shown when a post type declares no single-view tabs.
pub const DEFAULT_TAB: &str = "edit";

/// External data an edit context is (re)built from.
#[derive(Debug, Clone, Default)]
pub struct EntitySnapshot {
    pub post: Option<Post>,
    pub fields: Vec<FieldDefinition>,
    pub plugin_fields: Vec<FieldDefinition>,
    pub stored_meta: Vec<MetaEntry>,
}

pub struct EditContext {
    slug: String,
    post: Option<Post>,
    post_type: Option<PostType>,
    organization: Option<OrganizationId>,
    is_new_record: bool,
    base_url: String,
    page_identifier: Option<String>,
    enabled_plugins: BTreeSet<String>,
    visibility: Visibility,
    isolate_panics: bool,

    general: Option<GeneralFields>,
    general_sig: Option<String>,
    custom: CustomFields,
    sidebar: SidebarState,
    attachments: Option<AttachmentsContext>,
    attachments_source: Option<CustomFieldValue>,
    taxonomy: Option<TaxonomyContext>,

    collectors: HandlerList<Collector>,
    before_save: HandlerList<BeforeSave>,
}

impl EditContext {
    pub fn builder(slug: &str) -> EditContextBuilder {
        EditContextBuilder::new(slug)
    }

    // ================================================================
    // Identity
    // ================================================================

    /// Post type slug this editor is for.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    pub fn post_id(&self) -> Option<PostId> {
        self.post.as_ref().map(|post| post.id)
    }

    pub fn post_type(&self) -> Option<&PostType> {
        self.post_type.as_ref()
    }

    pub fn organization(&self) -> Option<OrganizationId> {
        self.organization
    }

    pub fn is_new_record(&self) -> bool {
        self.is_new_record
    }

    /// There is something to edit: a new draft or a loaded entry.
    pub fn has_entity(&self) -> bool {
        self.is_new_record || self.post.is_some()
    }

    pub fn header_label(&self) -> &str {
        self.post_type
            .as_ref()
            .map(|pt| pt.name.as_str())
            .unwrap_or(&self.slug)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_identifier(&self) -> Option<&str> {
        self.page_identifier.as_deref()
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.post_type
            .as_ref()
            .map(|pt| pt.storage_kind)
            .unwrap_or_default()
    }

    pub fn supports_posts_table(&self) -> bool {
        self.storage_kind() == StorageKind::Posts
            && (self.post_type.is_some() || BUILTIN_POST_TYPES.contains(&self.slug.as_str()))
    }

    pub fn can_save_record(&self) -> bool {
        self.supports_posts_table() || self.storage_kind() != StorageKind::Posts
    }

    pub fn supports_attachments(&self) -> bool {
        self.supports_posts_table()
            && self
                .post_type
                .as_ref()
                .is_some_and(PostType::supports_attachments)
    }

    pub fn plugin_enabled(&self, plugin_id: &str) -> bool {
        self.enabled_plugins.contains(plugin_id)
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Overlays panel-visibility flags, e.g. from the active tab.
    pub fn apply_visibility(&mut self, overlay: &Visibility) {
        self.visibility = self.visibility.merged(overlay);
    }

    pub fn isolate_panics(&self) -> bool {
        self.isolate_panics
    }

    // ================================================================
    // Sub-contexts
    // ================================================================

    pub fn general(&self) -> Option<&GeneralFields> {
        self.general.as_ref()
    }

    pub fn general_mut(&mut self) -> Option<&mut GeneralFields> {
        self.general.as_mut()
    }

    pub fn custom_fields(&self) -> Option<&CustomFields> {
        self.has_entity().then_some(&self.custom)
    }

    pub fn sidebar(&self) -> Option<SidebarContext> {
        if !self.has_entity() {
            return None;
        }
        Some(SidebarContext {
            is_saving: self.sidebar.is_saving,
            is_duplicating: self.sidebar.is_duplicating,
            can_save_record: self.can_save_record(),
            supports_posts_table: self.supports_posts_table(),
            is_new_record: self.is_new_record,
            status: self
                .general
                .as_ref()
                .map(GeneralFields::status)
                .unwrap_or_default(),
            status_options: status_options(),
            puck_editor_href: self.puck_editor_href(),
            save_error: self.sidebar.save_error.clone(),
        })
    }

    pub fn attachments(&self) -> Option<&AttachmentsContext> {
        self.attachments.as_ref()
    }

    pub fn attachments_mut(&mut self) -> Option<&mut AttachmentsContext> {
        self.attachments.as_mut()
    }

    pub fn taxonomy(&self) -> Option<&TaxonomyContext> {
        self.taxonomy.as_ref()
    }

    pub fn taxonomy_mut(&mut self) -> Option<&mut TaxonomyContext> {
        self.taxonomy.as_mut()
    }

    // ================================================================
    // Custom field values
    // ================================================================

    pub fn get_meta_value(&self, key: &str) -> Option<&CustomFieldValue> {
        self.custom.value(key)
    }

    /// Sets a value in the live map. Keys need not have a field definition;
    /// panels keep their own state here and write it through a collector.
    pub fn set_meta_value(&mut self, key: &str, value: impl Into<CustomFieldValue>) {
        self.custom.set_value(key, value.into());
    }

    // ================================================================
    // Collectors & before-save handlers
    // ================================================================

    pub fn register_meta_payload_collector<F>(&self, collector: F) -> CollectorHandle
    where
        F: Fn(&EditContext) -> Option<MetaMap> + 'static,
    {
        self.collectors.register(Rc::new(collector))
    }

    pub fn unregister_meta_payload_collector(&self, handle: CollectorHandle) -> bool {
        self.collectors.unregister(handle)
    }

    pub fn collector_count(&self) -> usize {
        self.collectors.len()
    }

    /// Runs all collectors and merges their output, later ones winning.
    pub fn collect_meta_payload(&self) -> MetaMap {
        run_collectors(self, self.collectors.snapshot(), self.isolate_panics)
    }

    pub fn register_before_save<F>(&self, handler: F) -> BeforeSaveHandle
    where
        F: Fn(&EditContext) -> Result<(), String> + 'static,
    {
        self.before_save.register(Rc::new(handler))
    }

    pub fn unregister_before_save(&self, handle: BeforeSaveHandle) -> bool {
        self.before_save.unregister(handle)
    }

    /// Runs before-save handlers in registration order; the first rejection
    /// aborts.
    pub fn run_before_save(&self) -> Result<(), ValidationError> {
        for handler in self.before_save.snapshot() {
            handler(self).map_err(ValidationError::Rejected)?;
        }
        Ok(())
    }

    // ================================================================
    // Links
    // ================================================================

    /// Public URL the current slug will live at.
    pub fn slug_preview_url(&self) -> Option<String> {
        let slug = self.general.as_ref()?.slug().trim();
        if slug.is_empty() {
            return None;
        }
        let path = match &self.post_type {
            Some(post_type) => post_type.rewrite.single_path(slug),
            None => format!("/{}", slug.trim_matches('/')),
        };
        Some(format!("{}{}", self.base_url.trim_end_matches('/'), path))
    }

    /// Link into the visual page editor; needs a saved entry and a page
    /// identifier.
    pub fn puck_editor_href(&self) -> Option<String> {
        let page_identifier = self.page_identifier.as_deref()?;
        let post_id = self.post_id()?;
        let title = self
            .general
            .as_ref()
            .map(GeneralFields::title)
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| self.header_label());

        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("pageIdentifier", page_identifier)
            .append_pair("postId", &post_id.to_string())
            .append_pair("postType", &self.slug)
            .append_pair("title", title)
            .finish();
        Some(format!("/puck/edit?{query}"))
    }

    // ================================================================
    // Tabs
    // ================================================================

    pub fn tabs(&self) -> &[SingleViewTab] {
        self.post_type.as_ref().map(PostType::tabs).unwrap_or(&[])
    }

    /// Configured default tab, else the first tab, else `edit`.
    pub fn default_tab(&self) -> &str {
        self.post_type
            .as_ref()
            .and_then(|pt| pt.single_view.as_ref())
            .and_then(|view| view.default_tab.as_deref())
            .or_else(|| self.tabs().first().map(|tab| tab.slug.as_str()))
            .unwrap_or(DEFAULT_TAB)
    }

    /// Maps a `?tab=` query onto a known tab; anything else lands on the
    /// default tab.
    pub fn normalize_tab(&self, query: Option<&str>) -> String {
        let requested = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
        if !requested.is_empty() && self.tabs().iter().any(|tab| tab.slug == requested) {
            return requested;
        }
        self.default_tab().to_string()
    }

    /// One `tab:<slug>` slot per single-view tab.
    pub fn tab_slots(&self) -> Vec<Slot> {
        self.tabs().iter().map(|tab| Slot::tab(&tab.slug)).collect()
    }

    // ================================================================
    // Refresh
    // ================================================================

    /// Feeds new external data. Custom-field values are only re-seeded when
    /// the hydration signature changed; returns whether that happened.
    pub fn refresh(&mut self, snapshot: EntitySnapshot) -> bool {
        self.post = snapshot.post;
        if self.post.is_some() {
            self.is_new_record = false;
        }
        self.custom.replace_sources(
            snapshot.fields,
            snapshot.plugin_fields,
            meta_map(&snapshot.stored_meta),
        );
        self.hydrate()
    }

    pub(crate) fn plugin_fields(&self) -> Vec<FieldDefinition> {
        self.custom.plugin_fields().to_vec()
    }

    fn hydrate(&mut self) -> bool {
        self.hydrate_general();
        let hydrated = self
            .custom
            .hydrate(self.post.as_ref(), &self.slug, self.is_new_record);
        self.hydrate_attachments();
        if hydrated || self.taxonomy.is_none() {
            self.hydrate_taxonomy();
        }
        hydrated
    }

    fn hydrate_general(&mut self) {
        let signature = general_signature(self.post.as_ref(), self.is_new_record);
        if self.general_sig.as_deref() == Some(signature.as_str()) {
            return;
        }
        debug!(slug = %self.slug, "General fields hydrated");
        self.general = match &self.post {
            Some(post) => Some(GeneralFields::from_post(post)),
            None if self.is_new_record => Some(GeneralFields::default()),
            None => None,
        };
        self.general_sig = Some(signature);
    }

    fn hydrate_attachments(&mut self) {
        if !(self.has_entity() && self.supports_attachments()) {
            self.attachments = None;
            self.attachments_source = None;
            return;
        }
        let raw = self.custom.stored().get(ATTACHMENTS_META_KEY).cloned();
        if self.attachments.is_some() && self.attachments_source == raw {
            return;
        }
        self.attachments = Some(AttachmentsContext::from_stored(raw.as_ref()));
        self.attachments_source = raw;
    }

    fn hydrate_taxonomy(&mut self) {
        self.taxonomy = match &self.post_type {
            Some(post_type) if self.has_entity() && !post_type.taxonomies.is_empty() => Some(
                TaxonomyContext::from_stored(&post_type.taxonomies, self.custom.stored()),
            ),
            _ => None,
        };
    }

    // ================================================================
    // Session bookkeeping
    // ================================================================

    pub(crate) fn set_saving(&mut self, saving: bool) {
        self.sidebar.is_saving = saving;
    }

    pub(crate) fn set_duplicating(&mut self, duplicating: bool) {
        self.sidebar.is_duplicating = duplicating;
    }

    pub(crate) fn set_save_error(&mut self, error: Option<String>) {
        self.sidebar.save_error = error;
    }

    pub fn is_saving(&self) -> bool {
        self.sidebar.is_saving
    }

    pub fn is_duplicating(&self) -> bool {
        self.sidebar.is_duplicating
    }

    pub fn save_error(&self) -> Option<&str> {
        self.sidebar.save_error.as_deref()
    }
}

impl fmt::Debug for EditContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditContext")
            .field("slug", &self.slug)
            .field("post_id", &self.post_id())
            .field("organization", &self.organization)
            .field("is_new_record", &self.is_new_record)
            .field("fields", &self.custom.fields().len())
            .field("collectors", &self.collectors.len())
            .finish()
    }
}

/// Builder for [`EditContext`].
#[derive(Debug, Clone)]
pub struct EditContextBuilder {
    slug: String,
    post_type: Option<PostType>,
    organization: Option<OrganizationId>,
    is_new_record: bool,
    snapshot: EntitySnapshot,
    base_url: String,
    page_identifier: Option<String>,
    enabled_plugins: BTreeSet<String>,
    visibility: Visibility,
    isolate_panics: bool,
}

impl EditContextBuilder {
    fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            post_type: None,
            organization: None,
            is_new_record: false,
            snapshot: EntitySnapshot::default(),
            base_url: String::new(),
            page_identifier: None,
            enabled_plugins: BTreeSet::new(),
            visibility: Visibility::default(),
            isolate_panics: true,
        }
    }

    pub fn post(mut self, post: Post) -> Self {
        self.snapshot.post = Some(post);
        self
    }

    pub fn post_type(mut self, post_type: PostType) -> Self {
        self.post_type = Some(post_type);
        self
    }

    pub fn organization(mut self, organization: OrganizationId) -> Self {
        self.organization = Some(organization);
        self
    }

    pub fn new_record(mut self, is_new_record: bool) -> Self {
        self.is_new_record = is_new_record;
        self
    }

    /// Field catalog of the post type.
    pub fn fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.snapshot.fields = fields;
        self
    }

    /// Fields contributed by active plugins.
    pub fn plugin_fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.snapshot.plugin_fields = fields;
        self
    }

    pub fn stored_meta(mut self, meta: Vec<MetaEntry>) -> Self {
        self.snapshot.stored_meta = meta;
        self
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn page_identifier(mut self, page_identifier: &str) -> Self {
        self.page_identifier = Some(page_identifier.to_string());
        self
    }

    /// Snapshot of plugin ids switched on for the tenant.
    pub fn enabled_plugins<I, T>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.enabled_plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Takes base URL, visibility and panic isolation from editor config.
    pub fn config(mut self, config: &EditorConfig) -> Self {
        self.base_url = config.base_url.clone();
        self.visibility = config.visibility.clone();
        self.isolate_panics = config.isolate_hook_panics;
        self
    }

    pub fn build(self) -> EditContext {
        let is_new_record = self.is_new_record && self.snapshot.post.is_none();
        let custom = CustomFields::new(
            self.snapshot.fields,
            self.snapshot.plugin_fields,
            meta_map(&self.snapshot.stored_meta),
        );
        let mut ctx = EditContext {
            slug: self.slug,
            post: self.snapshot.post,
            post_type: self.post_type,
            organization: self.organization,
            is_new_record,
            base_url: self.base_url,
            page_identifier: self.page_identifier,
            enabled_plugins: self.enabled_plugins,
            visibility: self.visibility,
            isolate_panics: self.isolate_panics,
            general: None,
            general_sig: None,
            custom,
            sidebar: SidebarState::default(),
            attachments: None,
            attachments_source: None,
            taxonomy: None,
            collectors: HandlerList::new(),
            before_save: HandlerList::new(),
        };
        ctx.hydrate();
        ctx
    }
}
