//! Content model for Folio.
//!
//! Defines the records every other crate speaks in:
//! - [`Post`]: one entry of any post type, plus the [`EntityPayload`] written back on save
//! - [`PostType`]: a configurable content type (supports, rewrite, admin menu, meta boxes, tabs)
//! - [`FieldDefinition`]: a custom field attached to a post type
//! - [`CustomFieldValue`] / [`MetaEntry`]: loosely typed stored meta values
//! - [`MediaItem`], [`Taxonomy`], [`Term`]: media library and taxonomy records
//! - [`PostTypeHandler`]: optional per-type validation on save

mod field;
mod handler;
mod media;
mod post;
mod post_type;
mod taxonomy;
mod value;

pub use field::{FieldDefinition, FieldOption, FieldSource, FieldType};
pub use handler::PostTypeHandler;
pub use media::{MediaItem, MediaMetadata, MediaPage, Pagination};
pub use post::{EntityPayload, Post, PostStatus};
pub use post_type::{
    AdminMenu, MetaBoxDefinition, PostType, RewriteRules, SingleViewConfig, SingleViewTab,
    StorageKind, Supports,
};
pub use taxonomy::{Taxonomy, Term};
pub use value::{CustomFieldValue, MetaEntry, MetaMap, meta_map};
