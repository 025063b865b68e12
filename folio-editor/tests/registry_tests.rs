use folio_editor::{
    Composer, EditContext, EditorConfig, MetaBoxRegistry, PanelDescriptor, SlotConfig, resolve,
};
use folio_model::{FieldDefinition, MetaBoxDefinition, PostType};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};

fn ctx() -> EditContext {
    EditContext::builder("posts").new_record(true).build()
}

fn titled(id: &str, title: &str, priority: i32) -> PanelDescriptor {
    PanelDescriptor::new(id, title, "main", |_: &EditContext| json!({})).with_priority(priority)
}

fn titles(panels: &[PanelDescriptor]) -> Vec<&str> {
    panels.iter().map(|p| p.title.as_str()).collect()
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

// ── Resolution ───────────────────────────────────────────────────

#[test]
fn resolution_orders_by_priority_then_title() {
    let mut registry = MetaBoxRegistry::new();
    registry.register("main", "zeta", |_: &EditContext| Some(titled("zeta", "Zeta", 10)));
    registry.register("main", "alpha", |_: &EditContext| Some(titled("alpha", "Alpha", 0)));
    registry.register("main", "beta", |_: &EditContext| Some(titled("beta", "Beta", 10)));

    let panels = resolve(&registry, "main", &ctx());
    assert_eq!(titles(&panels), vec!["Alpha", "Beta", "Zeta"]);
}

#[test]
fn declining_hooks_are_dropped() {
    let mut registry = MetaBoxRegistry::new();
    registry.register("sidebar", "a", |_: &EditContext| Some(titled("a", "A", 0)));
    registry.register("sidebar", "b", |_: &EditContext| None);
    registry.register("sidebar", "c", |_: &EditContext| Some(titled("c", "C", 1)));

    let panels = resolve(&registry, "sidebar", &ctx());
    assert_eq!(titles(&panels), vec!["A", "C"]);
}

#[test]
fn unknown_slot_resolves_empty() {
    let registry = MetaBoxRegistry::new();
    assert!(resolve(&registry, "tab:nothing", &ctx()).is_empty());
}

#[test]
fn hooks_see_the_context() {
    let mut registry = MetaBoxRegistry::new();
    registry.register("main", "lessons-only", |ctx: &EditContext| {
        (ctx.slug() == "lessons").then(|| titled("lessons-only", "Lessons", 0))
    });

    assert!(resolve(&registry, "main", &ctx()).is_empty());
    let lessons = EditContext::builder("lessons").new_record(true).build();
    assert_eq!(resolve(&registry, "main", &lessons).len(), 1);
}

#[test]
fn panicking_hook_is_isolated_and_logged() {
    let mut registry = MetaBoxRegistry::new();
    registry.register("main", "boom", |_: &EditContext| -> Option<PanelDescriptor> {
        panic!("hook exploded")
    });
    registry.register("main", "fine", |_: &EditContext| Some(titled("fine", "Fine", 0)));

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let panels = tracing::subscriber::with_default(subscriber, || resolve(&registry, "main", &ctx()));

    assert_eq!(titles(&panels), vec!["Fine"]);
    let logs = captured.text();
    assert!(logs.contains("Meta box hook failed"), "logs: {logs}");
    assert!(logs.contains("hook exploded"), "logs: {logs}");
}

#[test]
#[should_panic(expected = "hook exploded")]
fn panics_propagate_when_isolation_is_off() {
    let mut registry = MetaBoxRegistry::new();
    registry.set_isolate_hook_panics(false);
    registry.register("main", "boom", |_: &EditContext| -> Option<PanelDescriptor> {
        panic!("hook exploded")
    });
    resolve(&registry, "main", &ctx());
}

fn arb_hooks() -> impl Strategy<Value = Vec<(i32, String, bool)>> {
    proptest::collection::vec((-3..4i32, "[A-Za-z]{1,4}", any::<bool>()), 0..12)
        .prop_shuffle()
}

proptest! {
    #[test]
    fn resolved_order_is_priority_then_title(hooks in arb_hooks()) {
        let mut registry = MetaBoxRegistry::new();
        for (index, (priority, title, declines)) in hooks.iter().cloned().enumerate() {
            let id = format!("hook-{index}");
            let panel_id = id.clone();
            registry.register("main", &id, move |_: &EditContext| {
                (!declines).then(|| titled(&panel_id, &title, priority))
            });
        }

        let mut expected: Vec<(i32, String)> = hooks
            .iter()
            .filter(|(_, _, declines)| !declines)
            .map(|(priority, title, _)| (*priority, title.clone()))
            .collect();
        expected.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_bytes().cmp(b.1.as_bytes())));

        let resolved: Vec<(i32, String)> = resolve(&registry, "main", &ctx())
            .into_iter()
            .map(|panel| (panel.priority, panel.title))
            .collect();
        prop_assert_eq!(resolved, expected);
    }
}

// ── Registration ─────────────────────────────────────────────────

#[test]
fn re_registration_keeps_the_first_hook() {
    let mut registry = MetaBoxRegistry::new();
    registry.register("main", "seo", |_: &EditContext| Some(titled("seo", "First", 0)));
    registry.register("main", "seo", |_: &EditContext| Some(titled("seo", "Second", 0)));

    let panels = resolve(&registry, "main", &ctx());
    assert_eq!(titles(&panels), vec!["First"]);
}

#[test]
fn unregister_by_token() {
    let mut registry = MetaBoxRegistry::new();
    let token = registry.register("main", "a", |_: &EditContext| Some(titled("a", "A", 0)));
    registry.register("main", "b", |_: &EditContext| Some(titled("b", "B", 0)));

    assert!(registry.unregister(&token));
    assert!(!registry.unregister(&token));
    assert_eq!(titles(&resolve(&registry, "main", &ctx())), vec!["B"]);
}

#[test]
fn duplicate_panel_ids_are_both_resolved() {
    let mut registry = MetaBoxRegistry::new();
    registry.register("main", "one", |_: &EditContext| Some(titled("same", "One", 0)));
    registry.register("main", "two", |_: &EditContext| Some(titled("same", "Two", 1)));

    assert_eq!(resolve(&registry, "main", &ctx()).len(), 2);

    // The composer keeps the first.
    let config = EditorConfig::default();
    let panels = Composer::new(&registry, &config).panels("main", &ctx());
    assert_eq!(titles(&panels), vec!["One"]);
}

// ── Composition ──────────────────────────────────────────────────

fn sidebar_registry() -> MetaBoxRegistry {
    let mut registry = MetaBoxRegistry::new();
    for (id, priority) in [("actions", 0), ("metadata", 10), ("extra", 20)] {
        registry.register("sidebar", id, move |_: &EditContext| {
            Some(PanelDescriptor::new(id, id, "sidebar", |_: &EditContext| json!({})).with_priority(priority))
        });
    }
    registry
}

fn with_allow_list(panels: &[&str]) -> EditorConfig {
    let mut config = EditorConfig::default();
    config.slots.insert(
        "sidebar".into(),
        SlotConfig {
            panels: Some(panels.iter().map(|p| p.to_string()).collect()),
        },
    );
    config
}

#[test]
fn allow_list_filters_and_orders() {
    let registry = sidebar_registry();
    let config = with_allow_list(&["extra", "actions"]);

    let ids: Vec<String> = Composer::new(&registry, &config)
        .compose("sidebar", &ctx())
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["extra", "actions"]);
}

#[test]
fn empty_allow_list_hides_everything() {
    let registry = sidebar_registry();
    let config = with_allow_list(&[]);
    assert!(Composer::new(&registry, &config).compose("sidebar", &ctx()).is_empty());
}

#[test]
fn field_backed_meta_boxes_join_the_slot() {
    let mut post_type = PostType::new("events", "Events");
    post_type.meta_boxes = vec![
        MetaBoxDefinition::fields("when", "When", "sidebar", &["starts_at"]),
        MetaBoxDefinition::fields("empty", "Nothing here", "sidebar", &["missing"]),
        MetaBoxDefinition::fields("venue", "Venue", "main", &["venue"]),
    ];
    let ctx = EditContext::builder("events")
        .post_type(post_type)
        .new_record(true)
        .fields(vec![
            FieldDefinition::text("starts_at", "Starts at"),
            FieldDefinition::text("venue", "Venue"),
        ])
        .build();

    let registry = sidebar_registry();
    let config = EditorConfig::default();
    let composed = Composer::new(&registry, &config).compose("sidebar", &ctx);

    let ids: Vec<&str> = composed.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["actions", "metadata", "extra", "when"]);

    let when = composed.iter().find(|p| p.id == "when").unwrap();
    assert_eq!(when.priority, 50);
    assert_eq!(when.view["fields"][0]["key"], json!("starts_at"));
}

#[test]
fn panicking_render_is_left_out() {
    let mut registry = MetaBoxRegistry::new();
    registry.register("main", "bad", |_: &EditContext| {
        Some(PanelDescriptor::new("bad", "Bad", "main", |_: &EditContext| -> serde_json::Value {
            panic!("render failed")
        }))
    });
    registry.register("main", "good", |_: &EditContext| Some(titled("good", "Good", 0)));

    let config = EditorConfig::default();
    let composed = Composer::new(&registry, &config).compose("main", &ctx());
    let ids: Vec<&str> = composed.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["good"]);
}
