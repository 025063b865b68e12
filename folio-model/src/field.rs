use crate::CustomFieldValue;
use folio_types::{FieldId, Timestamp};
use serde::{Deserialize, Serialize};

/// A custom field attached to a post type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: FieldId,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<CustomFieldValue>,
    /// Derived from the entity itself (`_id`, `slug`, `status`, ...); never written.
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub source: FieldSource,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl FieldDefinition {
    fn simple(key: &str, name: &str, field_type: FieldType) -> Self {
        Self {
            id: FieldId::new(),
            key: key.into(),
            name: name.into(),
            description: None,
            field_type,
            required: false,
            options: None,
            default_value: None,
            is_system: false,
            order: 0,
            read_only: false,
            source: FieldSource::Schema,
            created_at: None,
            updated_at: None,
        }
    }

    /// Single-line text field.
    pub fn text(key: &str, name: &str) -> Self {
        Self::simple(key, name, FieldType::Text)
    }

    /// Multi-line text field.
    pub fn textarea(key: &str, name: &str) -> Self {
        Self::simple(key, name, FieldType::Textarea)
    }

    /// Numeric field.
    pub fn number(key: &str, name: &str) -> Self {
        Self::simple(key, name, FieldType::Number)
    }

    /// Boolean toggle.
    pub fn boolean(key: &str, name: &str) -> Self {
        Self::simple(key, name, FieldType::Boolean)
    }

    /// Select with fixed options; each option's label doubles as its value.
    pub fn select(key: &str, name: &str, options: &[&str]) -> Self {
        let mut field = Self::simple(key, name, FieldType::Select);
        field.options = Some(options.iter().map(|o| FieldOption::plain(o)).collect());
        field
    }

    /// Read-only field whose value is derived from the entity.
    pub fn system(key: &str, name: &str) -> Self {
        let mut field = Self::simple(key, name, FieldType::Text);
        field.is_system = true;
        field.read_only = true;
        field
    }

    /// A field for a stored meta key that has no definition.
    /// Typed boolean when the stored value is a boolean, text otherwise.
    pub fn detected(key: &str, sample: &CustomFieldValue, order: i32) -> Self {
        let field_type = match sample {
            CustomFieldValue::Bool(_) => FieldType::Boolean,
            _ => FieldType::Text,
        };
        let mut field = Self::simple(key, &humanize_key(key), field_type);
        field.description = Some("Detected post meta value".into());
        field.order = order;
        field.source = FieldSource::Detected;
        field
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, value: impl Into<CustomFieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_updated_at(mut self, updated_at: Timestamp) -> Self {
        self.updated_at = Some(updated_at);
        self
    }
}

/// `snake_case-key` → `Snake Case Key`.
fn humanize_key(key: &str) -> String {
    key.split(|c| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Input control type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Textarea,
    RichText,
    Number,
    Boolean,
    Select,
    Date,
    Datetime,
    Url,
    Media,
    Json,
    /// Anything an external plugin invents; rendered as text.
    #[serde(other)]
    Other,
}

impl FieldType {
    /// Whether outgoing values of this field go through the string policy.
    pub fn is_textual(&self) -> bool {
        !matches!(self, Self::Number | Self::Boolean)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    pub fn plain(value: &str) -> Self {
        Self {
            label: value.into(),
            value: value.into(),
        }
    }
}

/// Where a field definition came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FieldSource {
    /// Stored field catalog for the post type.
    #[default]
    Schema,
    /// Contributed by an active plugin.
    Plugin { name: String },
    /// A stored meta key with no definition.
    Detected,
}

impl FieldSource {
    /// Short tag used in field signatures.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Plugin { .. } => "plugin",
            Self::Detected => "detected",
        }
    }
}
