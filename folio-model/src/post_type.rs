use serde::{Deserialize, Serialize};

/// A configurable content type: what it supports, how its permalinks look,
/// where it sits in the admin menu, and which field-backed meta boxes and
/// tabs its editor shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostType {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub supports: Supports,
    #[serde(default)]
    pub rewrite: RewriteRules,
    #[serde(default)]
    pub admin_menu: AdminMenu,
    #[serde(default)]
    pub storage_kind: StorageKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta_boxes: Vec<MetaBoxDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_view: Option<SingleViewConfig>,
    /// Taxonomy slugs attached to this type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taxonomies: Vec<String>,
}

impl PostType {
    /// A public, posts-table backed type with title/editor support and an
    /// admin menu entry labelled after `name`.
    pub fn new(slug: &str, name: &str) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
            is_public: true,
            supports: Supports {
                title: true,
                editor: true,
                ..Default::default()
            },
            rewrite: RewriteRules::default(),
            admin_menu: AdminMenu {
                enabled: true,
                label: Some(name.into()),
                slug: Some(slug.into()),
                icon: None,
                position: None,
            },
            storage_kind: StorageKind::Posts,
            meta_boxes: Vec::new(),
            single_view: None,
            taxonomies: Vec::new(),
        }
    }

    pub fn supports_attachments(&self) -> bool {
        self.supports.attachments || self.supports.featured_image
    }

    pub fn tabs(&self) -> &[SingleViewTab] {
        self.single_view
            .as_ref()
            .map(|view| view.tabs.as_slice())
            .unwrap_or(&[])
    }
}

/// Editor features a post type opts into. Missing flags read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Supports {
    pub title: bool,
    pub editor: bool,
    pub excerpt: bool,
    pub attachments: bool,
    pub featured_image: bool,
    pub comments: bool,
    pub revisions: bool,
    pub taxonomy: bool,
    pub custom_fields: bool,
}

/// Permalink rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewriteRules {
    pub has_archive: bool,
    pub archive_slug: Option<String>,
    /// Path segment placed before a single entry's slug.
    pub single_slug: Option<String>,
    pub with_front: bool,
    pub feeds: bool,
    pub pages: bool,
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self {
            has_archive: false,
            archive_slug: None,
            single_slug: None,
            with_front: true,
            feeds: false,
            pages: true,
        }
    }
}

impl RewriteRules {
    /// Canonical path of a single entry: `/{single_slug}/{slug}` or `/{slug}`.
    pub fn single_path(&self, slug: &str) -> String {
        let slug = slug.trim_matches('/');
        match self
            .single_slug
            .as_deref()
            .map(|s| s.trim_matches('/'))
            .filter(|s| !s.is_empty())
        {
            Some(prefix) => format!("/{prefix}/{slug}"),
            None => format!("/{slug}"),
        }
    }
}

/// Placement in the admin navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminMenu {
    pub enabled: bool,
    pub label: Option<String>,
    pub slug: Option<String>,
    pub icon: Option<String>,
    pub position: Option<u32>,
}

/// Where entries of a post type live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// The shared posts table.
    #[default]
    Posts,
    /// A plugin-owned table the core editor cannot write to.
    Custom,
    /// A plugin component that accepts writes scoped to an organization.
    Component,
}

/// A meta box declared by the post type itself, backed by custom fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaBoxDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Slot name; defaults to `sidebar`.
    #[serde(default)]
    pub location: Option<String>,
    /// Defaults to 50.
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub field_keys: Vec<String>,
    /// Key into a plugin's renderer table; lets a box render with no fields.
    #[serde(default)]
    pub renderer_key: Option<String>,
}

impl MetaBoxDefinition {
    /// Shorthand for a box listing `field_keys` in the given slot.
    pub fn fields(id: &str, title: &str, location: &str, field_keys: &[&str]) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            location: Some(location.into()),
            priority: None,
            field_keys: field_keys.iter().map(|k| (*k).to_string()).collect(),
            renderer_key: None,
        }
    }
}

/// Plugin-provided editor tabs for a post type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleViewConfig {
    #[serde(default)]
    pub tabs: Vec<SingleViewTab>,
    #[serde(default)]
    pub default_tab: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleViewTab {
    pub slug: String,
    pub label: String,
}
