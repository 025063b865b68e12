use folio_model::{
    FieldDefinition, FieldSource, FieldType, MetaBoxDefinition, PostStatus, PostType,
    RewriteRules, StorageKind,
};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── PostType ─────────────────────────────────────────────────────

#[test]
fn new_post_type_defaults() {
    let pt = PostType::new("lessons", "Lessons");
    assert_eq!(pt.storage_kind, StorageKind::Posts);
    assert!(pt.supports.title);
    assert!(!pt.supports_attachments());
    assert!(pt.admin_menu.enabled);
    assert_eq!(pt.admin_menu.label.as_deref(), Some("Lessons"));
    assert!(pt.tabs().is_empty());
}

#[test]
fn featured_image_counts_as_attachment_support() {
    let mut pt = PostType::new("posts", "Posts");
    pt.supports.featured_image = true;
    assert!(pt.supports_attachments());
}

#[test]
fn post_type_deserializes_sparse_json() {
    let pt: PostType = serde_json::from_value(json!({
        "slug": "products",
        "name": "Products",
        "supports": {"attachments": true},
        "rewrite": {"singleSlug": "shop"},
        "storageKind": "component",
        "metaBoxes": [{"id": "pricing", "title": "Pricing", "fieldKeys": ["price"]}]
    }))
    .unwrap();
    assert!(pt.supports.attachments);
    assert!(!pt.supports.editor);
    assert_eq!(pt.storage_kind, StorageKind::Component);
    assert_eq!(pt.meta_boxes[0].location, None);
    assert_eq!(pt.rewrite.single_path("blue-mug"), "/shop/blue-mug");
}

// ── Rewrite rules ────────────────────────────────────────────────

#[test]
fn single_path_without_prefix() {
    assert_eq!(RewriteRules::default().single_path("about"), "/about");
}

#[test]
fn single_path_trims_slashes() {
    let rules = RewriteRules {
        single_slug: Some("/post/".into()),
        ..Default::default()
    };
    assert_eq!(rules.single_path("/hello/"), "/post/hello");
}

#[test]
fn blank_single_slug_is_ignored() {
    let rules = RewriteRules {
        single_slug: Some("  ".trim().into()),
        ..Default::default()
    };
    assert_eq!(rules.single_path("x"), "/x");
}

// ── Meta boxes ───────────────────────────────────────────────────

#[test]
fn meta_box_shorthand() {
    let b = MetaBoxDefinition::fields("seo", "SEO", "main", &["a", "b"]);
    assert_eq!(b.location.as_deref(), Some("main"));
    assert_eq!(b.field_keys, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(b.priority, None);
}

// ── Fields ───────────────────────────────────────────────────────

#[test]
fn field_constructors() {
    let f = FieldDefinition::select("level", "Level", &["easy", "hard"]).with_required(true);
    assert_eq!(f.field_type, FieldType::Select);
    assert!(f.required);
    assert_eq!(f.options.as_ref().unwrap()[1].value, "hard");

    let s = FieldDefinition::system("_id", "ID");
    assert!(s.is_system && s.read_only);
}

#[test]
fn detected_field_is_typed_from_sample() {
    let b = FieldDefinition::detected("is_featured", &true.into(), 3000);
    assert_eq!(b.field_type, FieldType::Boolean);
    assert_eq!(b.name, "Is Featured");
    assert_eq!(b.source, FieldSource::Detected);

    let t = FieldDefinition::detected("legacy-code", &"x".into(), 3001);
    assert_eq!(t.field_type, FieldType::Text);
    assert_eq!(t.name, "Legacy Code");
}

#[test]
fn unknown_field_type_deserializes_as_other() {
    let t: FieldType = serde_json::from_value(json!("colorPicker")).unwrap();
    assert_eq!(t, FieldType::Other);
    assert!(t.is_textual());
    assert!(!FieldType::Boolean.is_textual());
}

// ── Status ───────────────────────────────────────────────────────

#[test]
fn status_parse_roundtrip() {
    for status in PostStatus::ALL {
        assert_eq!(PostStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(PostStatus::parse("pending"), None);
}
