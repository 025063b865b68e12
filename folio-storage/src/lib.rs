//! Data-layer contracts for Folio.
//!
//! The editor never talks to a database directly. It consumes narrow
//! read/write traits defined here:
//!
//! - [`EntityReader`] / [`EntityWriter`]: load and persist posts
//! - [`FieldCatalog`]: custom-field definitions per post type
//! - [`MetaReader`]: stored meta rows for an entity
//! - [`MediaLibrary`]: upload targets and media records
//! - [`SiteOptions`]: per-tenant key/value options (plugin flags live here)
//! - [`PostTypeCatalog`]: per-tenant post type definitions
//!
//! [`MemoryStore`] implements all of them over in-process maps and is what
//! tests and local tooling run against.

mod error;
mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use traits::{
    EntityReader, EntityWriter, FieldCatalog, Loadable, MediaLibrary, MetaReader,
    PostTypeCatalog, SiteOptions,
};
