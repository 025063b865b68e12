use crate::StorageResult;
use folio_model::{
    CustomFieldValue, EntityPayload, FieldDefinition, MediaItem, MediaMetadata, MediaPage,
    MetaEntry, Pagination, Post, PostType,
};
use folio_types::{MediaItemId, OrganizationId, PostId};

/// Three-state read result: the editor shows a spinner for `Loading` and an
/// empty state for `NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Loading,
    NotFound,
    Ready(T),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Self::Loading => Loadable::Loading,
            Self::NotFound => Loadable::NotFound,
            Self::Ready(value) => Loadable::Ready(f(value)),
        }
    }

    pub fn as_ref(&self) -> Loadable<&T> {
        match self {
            Self::Loading => Loadable::Loading,
            Self::NotFound => Loadable::NotFound,
            Self::Ready(value) => Loadable::Ready(value),
        }
    }
}

impl<T> From<Option<T>> for Loadable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Ready(value),
            None => Self::NotFound,
        }
    }
}

pub trait EntityReader {
    /// Loads a post, optionally scoped to a tenant.
    fn get_entity(&self, id: PostId, organization: Option<OrganizationId>) -> Loadable<Post>;
}

pub trait EntityWriter {
    fn create_entity(&self, payload: EntityPayload) -> StorageResult<PostId>;

    fn update_entity(&self, id: PostId, payload: EntityPayload) -> StorageResult<()>;
}

pub trait FieldCatalog {
    /// Field definitions for a post type, in stored order.
    fn list_fields_for_type(&self, type_slug: &str) -> Vec<FieldDefinition>;
}

pub trait MetaReader {
    fn get_meta_for_entity(&self, id: PostId) -> Vec<MetaEntry>;
}

pub trait MediaLibrary {
    /// Returns a URL the client uploads bytes to.
    fn generate_upload_target(&self) -> StorageResult<String>;

    fn persist_media_record(
        &self,
        storage_ref: &str,
        metadata: MediaMetadata,
    ) -> StorageResult<MediaItemId>;

    fn list_media(&self, pagination: Pagination) -> MediaPage;

    fn get_media(&self, id: MediaItemId) -> Option<MediaItem>;
}

pub trait SiteOptions {
    fn get_site_option(&self, organization: OrganizationId, key: &str) -> Option<CustomFieldValue>;

    fn set_site_option(
        &self,
        organization: OrganizationId,
        key: &str,
        value: CustomFieldValue,
    ) -> StorageResult<()>;
}

pub trait PostTypeCatalog {
    fn get_post_type(&self, organization: OrganizationId, slug: &str) -> Option<PostType>;

    fn list_post_types(&self, organization: OrganizationId) -> Vec<PostType>;

    /// Inserts or replaces a post type by slug.
    fn upsert_post_type(&self, organization: OrganizationId, post_type: PostType) -> StorageResult<()>;
}
