//! In-process implementation of every data-layer trait.

use crate::{
    EntityReader, EntityWriter, FieldCatalog, Loadable, MediaLibrary, MetaReader,
    PostTypeCatalog, SiteOptions, StorageError, StorageResult,
};
use folio_model::{
    CustomFieldValue, EntityPayload, FieldDefinition, MediaItem, MediaMetadata, MediaPage,
    MetaEntry, Pagination, Post, PostType,
};
use folio_types::{MediaItemId, OrganizationId, PostId, Timestamp};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Map-backed store. All trait methods take `&self`; state sits behind
/// `RwLock`s so one store can back several sessions.
///
/// `set_failing(true)` makes every write return [`StorageError::Network`],
/// and `set_loading(id)` makes reads of that entity report
/// [`Loadable::Loading`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: RwLock<HashMap<PostId, Post>>,
    meta: RwLock<HashMap<PostId, BTreeMap<String, CustomFieldValue>>>,
    fields: RwLock<HashMap<String, Vec<FieldDefinition>>>,
    media: RwLock<Vec<MediaItem>>,
    options: RwLock<HashMap<(OrganizationId, String), CustomFieldValue>>,
    post_types: RwLock<HashMap<OrganizationId, Vec<PostType>>>,
    loading: RwLock<HashSet<PostId>>,
    failing: AtomicBool,
    upload_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated network failure for writes.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Mark an entity as still loading (or clear the mark).
    pub fn set_loading(&self, id: PostId, loading: bool) {
        if let Ok(mut set) = self.loading.write() {
            if loading {
                set.insert(id);
            } else {
                set.remove(&id);
            }
        }
    }

    pub fn insert_post(&self, post: Post) -> StorageResult<()> {
        self.posts
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(post.id, post);
        Ok(())
    }

    pub fn insert_meta(&self, id: PostId, entries: &[MetaEntry]) -> StorageResult<()> {
        let mut meta = self.meta.write().map_err(|_| StorageError::Poisoned)?;
        let row = meta.entry(id).or_default();
        for entry in entries {
            row.insert(entry.key.clone(), entry.value.clone());
        }
        Ok(())
    }

    pub fn set_fields(&self, type_slug: &str, fields: Vec<FieldDefinition>) -> StorageResult<()> {
        self.fields
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(type_slug.to_string(), fields);
        Ok(())
    }

    pub fn insert_media(&self, item: MediaItem) -> StorageResult<()> {
        self.media.write().map_err(|_| StorageError::Poisoned)?.push(item);
        Ok(())
    }

    /// Number of stored posts.
    pub fn post_count(&self) -> usize {
        self.posts.read().map(|posts| posts.len()).unwrap_or(0)
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Network("backend unavailable".into()));
        }
        Ok(())
    }

    /// Merges payload meta into the stored row. `Null` deletes the key.
    fn write_meta(&self, id: PostId, meta: Option<BTreeMap<String, CustomFieldValue>>) -> StorageResult<()> {
        let Some(meta) = meta else {
            return Ok(());
        };
        let mut stored = self.meta.write().map_err(|_| StorageError::Poisoned)?;
        let row = stored.entry(id).or_default();
        for (key, value) in meta {
            if value.is_null() {
                row.remove(&key);
            } else {
                row.insert(key, value);
            }
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

impl EntityReader for MemoryStore {
    fn get_entity(&self, id: PostId, organization: Option<OrganizationId>) -> Loadable<Post> {
        if self.loading.read().map(|set| set.contains(&id)).unwrap_or(false) {
            return Loadable::Loading;
        }
        let Ok(posts) = self.posts.read() else {
            warn!(post_id = %id, "Post table lock poisoned; treating as not found");
            return Loadable::NotFound;
        };
        match posts.get(&id) {
            // A tenant-scoped read never sees another tenant's entry.
            Some(post) if organization.is_some() && post.organization_id.is_some()
                && post.organization_id != organization =>
            {
                Loadable::NotFound
            }
            Some(post) => Loadable::Ready(post.clone()),
            None => Loadable::NotFound,
        }
    }
}

impl EntityWriter for MemoryStore {
    fn create_entity(&self, payload: EntityPayload) -> StorageResult<PostId> {
        self.check_available()?;
        let id = PostId::new();
        let now = Timestamp::now();
        let post = Post {
            id,
            post_type_slug: payload.post_type_slug,
            organization_id: payload.organization_id,
            title: Some(payload.title),
            slug: Some(payload.slug),
            content: non_empty(payload.content),
            excerpt: non_empty(payload.excerpt),
            status: Some(payload.status.as_str().to_string()),
            created_at: now,
            updated_at: Some(now),
        };
        self.posts
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(id, post);
        self.write_meta(id, payload.meta)?;
        info!(post_id = %id, "Post created");
        Ok(id)
    }

    fn update_entity(&self, id: PostId, payload: EntityPayload) -> StorageResult<()> {
        self.check_available()?;
        {
            let mut posts = self.posts.write().map_err(|_| StorageError::Poisoned)?;
            let post = posts
                .get_mut(&id)
                .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
            if post.post_type_slug != payload.post_type_slug {
                return Err(StorageError::InvalidData(format!(
                    "post {id} is a {}, not a {}",
                    post.post_type_slug, payload.post_type_slug
                )));
            }
            post.title = Some(payload.title);
            post.slug = Some(payload.slug);
            post.content = non_empty(payload.content);
            post.excerpt = non_empty(payload.excerpt);
            post.status = Some(payload.status.as_str().to_string());
            post.updated_at = Some(Timestamp::now());
        }
        self.write_meta(id, payload.meta)?;
        info!(post_id = %id, "Post updated");
        Ok(())
    }
}

impl FieldCatalog for MemoryStore {
    fn list_fields_for_type(&self, type_slug: &str) -> Vec<FieldDefinition> {
        self.fields
            .read()
            .ok()
            .and_then(|fields| fields.get(type_slug).cloned())
            .unwrap_or_default()
    }
}

impl MetaReader for MemoryStore {
    fn get_meta_for_entity(&self, id: PostId) -> Vec<MetaEntry> {
        self.meta
            .read()
            .ok()
            .and_then(|meta| {
                meta.get(&id).map(|row| {
                    row.iter()
                        .map(|(key, value)| MetaEntry::new(key.clone(), value.clone()))
                        .collect()
                })
            })
            .unwrap_or_default()
    }
}

impl MediaLibrary for MemoryStore {
    fn generate_upload_target(&self) -> StorageResult<String> {
        self.check_available()?;
        let seq = self.upload_seq.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("memory://uploads/{seq}"))
    }

    fn persist_media_record(
        &self,
        storage_ref: &str,
        metadata: MediaMetadata,
    ) -> StorageResult<MediaItemId> {
        self.check_available()?;
        if storage_ref.trim().is_empty() {
            return Err(StorageError::InvalidData("empty storage reference".into()));
        }
        let id = MediaItemId::new();
        let item = MediaItem {
            id,
            storage_ref: storage_ref.to_string(),
            url: metadata.url,
            title: metadata.title,
            alt: metadata.alt,
            mime_type: metadata.mime_type,
            width: metadata.width,
            height: metadata.height,
            created_at: Timestamp::now(),
        };
        self.media.write().map_err(|_| StorageError::Poisoned)?.push(item);
        debug!(media_id = %id, "Media record persisted");
        Ok(id)
    }

    /// Newest first.
    fn list_media(&self, pagination: Pagination) -> MediaPage {
        let Ok(media) = self.media.read() else {
            return MediaPage {
                items: Vec::new(),
                total: 0,
                is_done: true,
            };
        };
        let total = media.len();
        let items: Vec<MediaItem> = media
            .iter()
            .rev()
            .skip(pagination.offset)
            .take(pagination.limit)
            .cloned()
            .collect();
        let is_done = pagination.offset + items.len() >= total;
        MediaPage {
            items,
            total,
            is_done,
        }
    }

    fn get_media(&self, id: MediaItemId) -> Option<MediaItem> {
        self.media
            .read()
            .ok()
            .and_then(|media| media.iter().find(|item| item.id == id).cloned())
    }
}

impl SiteOptions for MemoryStore {
    fn get_site_option(&self, organization: OrganizationId, key: &str) -> Option<CustomFieldValue> {
        self.options
            .read()
            .ok()
            .and_then(|options| options.get(&(organization, key.to_string())).cloned())
    }

    fn set_site_option(
        &self,
        organization: OrganizationId,
        key: &str,
        value: CustomFieldValue,
    ) -> StorageResult<()> {
        self.check_available()?;
        self.options
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert((organization, key.to_string()), value);
        Ok(())
    }
}

impl PostTypeCatalog for MemoryStore {
    fn get_post_type(&self, organization: OrganizationId, slug: &str) -> Option<PostType> {
        self.post_types.read().ok().and_then(|types| {
            types
                .get(&organization)
                .and_then(|list| list.iter().find(|pt| pt.slug == slug).cloned())
        })
    }

    fn list_post_types(&self, organization: OrganizationId) -> Vec<PostType> {
        self.post_types
            .read()
            .ok()
            .and_then(|types| types.get(&organization).cloned())
            .unwrap_or_default()
    }

    fn upsert_post_type(&self, organization: OrganizationId, post_type: PostType) -> StorageResult<()> {
        self.check_available()?;
        let mut types = self.post_types.write().map_err(|_| StorageError::Poisoned)?;
        let list = types.entry(organization).or_default();
        match list.iter_mut().find(|pt| pt.slug == post_type.slug) {
            Some(existing) => *existing = post_type,
            None => list.push(post_type),
        }
        Ok(())
    }
}
