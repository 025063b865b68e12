//! Admin post editor for Folio.
//!
//! The editor is composed from panels ("meta boxes") contributed by hooks:
//!
//! - [`MetaBoxRegistry`]: named slots (`main`, `sidebar`, `tab:<id>`) holding
//!   ordered hooks; passed explicitly, never global
//! - [`EditContext`]: the entry being edited, its custom-field values and
//!   optional sub-contexts a hook can depend on
//! - [`resolve`] / [`Composer`]: turn a slot into an ordered, rendered
//!   panel list
//! - [`build_meta_payload`]: the meta written on save, with panel
//!   collectors merged on top
//! - [`EditSession`]: loads an entry and runs save and duplicate against
//!   the storage traits
//!
//! Built-in panels are registered with [`register_builtin_meta_boxes`].

mod attachments;
mod builtins;
mod config;
mod context;
mod error;
mod hydration;
mod payload;
mod registry;
mod resolve;
mod seo;
mod session;
mod slug;
mod vimeo;

pub use attachments::{ATTACHMENTS_META_KEY, AttachmentEntry, AttachmentNotice, AttachmentsContext};
pub use builtins::{
    ACTIONS_PANEL, ATTACHMENTS_PANEL, CONTENT_PANEL, CUSTOM_FIELDS_PANEL, GENERAL_PANEL,
    METADATA_PANEL, SEO_PANEL, VIMEO_PANEL, VIMEO_PLUGIN_ID, field_view, fields_view,
    register_builtin_meta_boxes,
};
pub use config::{DEFAULT_PRIORITY, EditorConfig, SlotConfig, Visibility};
pub use context::{
    BUILTIN_POST_TYPES, BeforeSaveHandle, CollectorHandle, CustomFields, DEFAULT_TAB,
    EditContext, EditContextBuilder, EntitySnapshot, GeneralField, GeneralFields,
    PAGE_BUILDER_META_KEY, SidebarContext, StatusOption, TaxonomyContext, status_options,
    terms_meta_key,
};
pub use error::{EditorError, EditorResult, ValidationError};
pub use hydration::{HydrationSignature, PENDING_SYSTEM_VALUE};
pub use payload::build_meta_payload;
pub use registry::{HookToken, MetaBoxHook, MetaBoxRegistry, PanelDescriptor, PanelView, Slot};
pub use resolve::{ComposedPanel, Composer, field_backed_panels, pick_panels, resolve, sort_panels};
pub use seo::{
    DESCRIPTION_LIMIT, OgImage, SEO_CANONICAL_KEY, SEO_DESCRIPTION_KEY, SEO_NOFOLLOW_KEY,
    SEO_NOINDEX_KEY, SEO_TITLE_KEY, SeoSnippet, TITLE_LIMIT, collect_seo_meta, host_label, og_image,
    snippet as seo_snippet,
};
pub use session::{EditSession, OpenRequest, SaveOutcome};
pub use slug::{fallback_slug, generate_slug};
pub use vimeo::{
    EMBED_URL_KEY, SOURCE_KEY, THUMBNAIL_URL_KEY, VIDEO_ID_KEY, VIMEO_POST_TYPES, VimeoMeta,
    apply_vimeo_meta, derive_vimeo_meta, extract_vimeo_id, tracks_vimeo,
};
