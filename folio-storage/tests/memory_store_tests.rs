use folio_model::{
    CustomFieldValue, EntityPayload, FieldDefinition, MediaMetadata, MetaEntry, Pagination, Post,
    PostStatus, PostType,
};
use folio_storage::{
    EntityReader, EntityWriter, FieldCatalog, Loadable, MediaLibrary, MemoryStore, MetaReader,
    PostTypeCatalog, SiteOptions, StorageError,
};
use folio_types::{OrganizationId, PostId, Timestamp};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn payload(slug: &str, meta: Option<BTreeMap<String, CustomFieldValue>>) -> EntityPayload {
    EntityPayload {
        post_type_slug: "lessons".into(),
        organization_id: None,
        title: "Intro".into(),
        slug: slug.into(),
        content: "body".into(),
        excerpt: String::new(),
        status: PostStatus::Published,
        meta,
    }
}

fn post(org: Option<OrganizationId>) -> Post {
    Post {
        id: PostId::new(),
        post_type_slug: "posts".into(),
        organization_id: org,
        title: Some("Seeded".into()),
        slug: Some("seeded".into()),
        content: None,
        excerpt: None,
        status: Some("draft".into()),
        created_at: Timestamp::from_millis(1_000),
        updated_at: None,
    }
}

// ── Entities ─────────────────────────────────────────────────────

#[test]
fn create_then_read_back() {
    let store = MemoryStore::new();
    let id = store.create_entity(payload("intro", None)).unwrap();

    let post = store.get_entity(id, None).ready().unwrap();
    assert_eq!(post.title.as_deref(), Some("Intro"));
    assert_eq!(post.slug.as_deref(), Some("intro"));
    assert_eq!(post.post_status(), Some(PostStatus::Published));
    assert_eq!(store.post_count(), 1);
}

#[test]
fn missing_entity_is_not_found() {
    let store = MemoryStore::new();
    assert_eq!(store.get_entity(PostId::new(), None), Loadable::NotFound);
}

#[test]
fn loading_mark_reports_loading() {
    let store = MemoryStore::new();
    let seeded = post(None);
    let id = seeded.id;
    store.insert_post(seeded).unwrap();

    store.set_loading(id, true);
    assert!(store.get_entity(id, None).is_loading());
    store.set_loading(id, false);
    assert!(matches!(store.get_entity(id, None), Loadable::Ready(_)));
}

#[test]
fn tenant_scoped_read_hides_other_tenants() {
    let store = MemoryStore::new();
    let owner = OrganizationId::new();
    let seeded = post(Some(owner));
    let id = seeded.id;
    store.insert_post(seeded).unwrap();

    assert!(store.get_entity(id, Some(owner)).ready().is_some());
    assert_eq!(store.get_entity(id, Some(OrganizationId::new())), Loadable::NotFound);
    assert!(store.get_entity(id, None).ready().is_some());
}

#[test]
fn update_unknown_entity_fails() {
    let store = MemoryStore::new();
    let err = store
        .update_entity(PostId::new(), payload("x", None))
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn update_rejects_post_type_change() {
    let store = MemoryStore::new();
    let id = store.create_entity(payload("intro", None)).unwrap();
    let mut other = payload("intro", None);
    other.post_type_slug = "pages".into();
    assert!(matches!(
        store.update_entity(id, other),
        Err(StorageError::InvalidData(_))
    ));
}

// ── Meta ─────────────────────────────────────────────────────────

#[test]
fn null_meta_deletes_and_text_overwrites() {
    let store = MemoryStore::new();
    let mut meta = BTreeMap::new();
    meta.insert("subtitle".to_string(), CustomFieldValue::from("Hi"));
    meta.insert("level".to_string(), CustomFieldValue::from(2.0));
    let id = store.create_entity(payload("intro", Some(meta))).unwrap();

    let mut update = BTreeMap::new();
    update.insert("subtitle".to_string(), CustomFieldValue::Null);
    update.insert("level".to_string(), CustomFieldValue::from(""));
    store.update_entity(id, payload("intro", Some(update))).unwrap();

    assert_eq!(
        store.get_meta_for_entity(id),
        vec![MetaEntry::new("level", "")]
    );
}

#[test]
fn seeded_meta_is_listed_sorted_by_key() {
    let store = MemoryStore::new();
    let id = PostId::new();
    store
        .insert_meta(id, &[MetaEntry::new("b", true), MetaEntry::new("a", "x")])
        .unwrap();
    assert_eq!(
        store.get_meta_for_entity(id),
        vec![MetaEntry::new("a", "x"), MetaEntry::new("b", true)]
    );
}

// ── Catalogs & options ───────────────────────────────────────────

#[test]
fn field_catalog_per_type() {
    let store = MemoryStore::new();
    store
        .set_fields("lessons", vec![FieldDefinition::text("subtitle", "Subtitle")])
        .unwrap();
    assert_eq!(store.list_fields_for_type("lessons").len(), 1);
    assert!(store.list_fields_for_type("pages").is_empty());
}

#[test]
fn post_type_upsert_replaces_by_slug() {
    let store = MemoryStore::new();
    let org = OrganizationId::new();
    store.upsert_post_type(org, PostType::new("courses", "Courses")).unwrap();
    store
        .upsert_post_type(org, PostType::new("courses", "Programs"))
        .unwrap();

    let list = store.list_post_types(org);
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Programs");
    assert!(store.get_post_type(OrganizationId::new(), "courses").is_none());
}

#[test]
fn site_options_are_per_tenant() {
    let store = MemoryStore::new();
    let a = OrganizationId::new();
    let b = OrganizationId::new();
    store.set_site_option(a, "theme", "dark".into()).unwrap();
    assert_eq!(store.get_site_option(a, "theme"), Some("dark".into()));
    assert_eq!(store.get_site_option(b, "theme"), None);
}

// ── Media ────────────────────────────────────────────────────────

#[test]
fn media_pages_newest_first() {
    let store = MemoryStore::new();
    for n in 0..3 {
        let target = store.generate_upload_target().unwrap();
        store
            .persist_media_record(
                &target,
                MediaMetadata {
                    url: format!("https://cdn.test/{n}.png"),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    let first = store.list_media(Pagination { offset: 0, limit: 2 });
    assert_eq!(first.total, 3);
    assert!(!first.is_done);
    assert_eq!(first.items[0].url, "https://cdn.test/2.png");

    let rest = store.list_media(Pagination { offset: 2, limit: 2 });
    assert_eq!(rest.items.len(), 1);
    assert!(rest.is_done);
    assert!(store.get_media(rest.items[0].id).is_some());
}

#[test]
fn upload_targets_are_unique() {
    let store = MemoryStore::new();
    let a = store.generate_upload_target().unwrap();
    let b = store.generate_upload_target().unwrap();
    assert_ne!(a, b);
}

#[test]
fn empty_storage_ref_rejected() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.persist_media_record(" ", MediaMetadata::default()),
        Err(StorageError::InvalidData(_))
    ));
}
