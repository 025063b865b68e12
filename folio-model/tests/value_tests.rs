use folio_model::{CustomFieldValue, MetaEntry, meta_map};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── Serialization ────────────────────────────────────────────────

#[test]
fn scalars_serialize_untagged() {
    assert_eq!(serde_json::to_value(CustomFieldValue::Null).unwrap(), json!(null));
    assert_eq!(serde_json::to_value(CustomFieldValue::Bool(true)).unwrap(), json!(true));
    assert_eq!(serde_json::to_value(CustomFieldValue::from("x")).unwrap(), json!("x"));
    assert_eq!(serde_json::to_value(CustomFieldValue::Number(2.5)).unwrap(), json!(2.5));
}

#[test]
fn scalars_deserialize_untagged() {
    let v: Vec<CustomFieldValue> = serde_json::from_value(json!([null, false, 3, "hi"])).unwrap();
    assert_eq!(
        v,
        vec![
            CustomFieldValue::Null,
            CustomFieldValue::Bool(false),
            CustomFieldValue::Number(3.0),
            CustomFieldValue::Text("hi".into()),
        ]
    );
}

#[test]
fn from_json_stringifies_structures() {
    let v = CustomFieldValue::from_json(json!({"a": 1}));
    assert_eq!(v, CustomFieldValue::Text(r#"{"a":1}"#.into()));
}

// ── Display / coercion ───────────────────────────────────────────

#[test]
fn display_matches_editor_rendering() {
    assert_eq!(CustomFieldValue::Null.to_string(), "");
    assert_eq!(CustomFieldValue::Number(4.0).to_string(), "4");
    assert_eq!(CustomFieldValue::Number(4.25).to_string(), "4.25");
    assert_eq!(CustomFieldValue::Bool(false).to_string(), "false");
}

#[test]
fn coerce_bool_reads_text_toggles() {
    assert!(CustomFieldValue::from("Yes").coerce_bool());
    assert!(CustomFieldValue::from(" 1 ").coerce_bool());
    assert!(!CustomFieldValue::from("no").coerce_bool());
    assert!(!CustomFieldValue::from("").coerce_bool());
    assert!(CustomFieldValue::from(2i64).coerce_bool());
    assert!(!CustomFieldValue::Null.coerce_bool());
}

// ── meta_map ─────────────────────────────────────────────────────

#[test]
fn meta_map_later_rows_win() {
    let map = meta_map(&[
        MetaEntry::new("color", "red"),
        MetaEntry::new("size", 3i64),
        MetaEntry::new("color", "blue"),
    ]);
    assert_eq!(map.len(), 2);
    assert_eq!(map["color"], CustomFieldValue::from("blue"));
}
