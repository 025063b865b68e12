use folio_model::{CustomFieldValue, FieldDefinition, FieldSource, PostType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static description of a plugin: what it provisions when switched on and
/// which fields it contributes to existing post types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Post types created for a tenant on activation.
    #[serde(default)]
    pub post_types: Vec<PostType>,
    /// Site options written on activation unless already set.
    #[serde(default)]
    pub default_options: BTreeMap<String, CustomFieldValue>,
    #[serde(default)]
    pub field_registrations: Vec<FieldRegistration>,
}

impl PluginDefinition {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            post_types: Vec::new(),
            default_options: BTreeMap::new(),
            field_registrations: Vec::new(),
        }
    }

    pub fn with_post_type(mut self, post_type: PostType) -> Self {
        self.post_types.push(post_type);
        self
    }

    pub fn with_option(mut self, key: &str, value: impl Into<CustomFieldValue>) -> Self {
        self.default_options.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, post_type_slug: &str, fields: Vec<FieldDefinition>) -> Self {
        self.field_registrations.push(FieldRegistration {
            post_type_slug: post_type_slug.into(),
            fields,
            editable: false,
        });
        self
    }

    /// Fields this plugin contributes to `post_type_slug`, stamped with the
    /// plugin as their source.
    pub(crate) fn fields_for(&self, post_type_slug: &str) -> impl Iterator<Item = FieldDefinition> + '_ {
        let slug = post_type_slug.to_string();
        self.field_registrations
            .iter()
            .filter(move |reg| reg.post_type_slug == slug)
            .flat_map(|reg| reg.fields.iter().map(move |field| (field, reg.editable)))
            .map(|(field, editable)| {
                let mut field = field.clone();
                field.source = FieldSource::Plugin {
                    name: self.name.clone(),
                };
                field.read_only = !editable;
                field
            })
    }
}

/// Fields a plugin attaches to a post type it may not own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRegistration {
    pub post_type_slug: String,
    pub fields: Vec<FieldDefinition>,
    /// Contributed fields are read-only in the editor unless set.
    #[serde(default)]
    pub editable: bool,
}
