use crate::hydration::{HydrationSignature, system_field_value, user_field_value};
use folio_model::{CustomFieldValue, FieldDefinition, FieldSource, MetaMap, Post};
use std::collections::HashSet;
use tracing::debug;

/// Stored meta key holding the visual-editor document; never surfaced as a
/// detected field.
pub const PAGE_BUILDER_META_KEY: &str = "puck_data";

const PLUGIN_ORDER_BASE: i32 = 2000;
const DETECTED_ORDER_BASE: i32 = 3000;

/// Field definitions plus the live key → value map the editor works on.
#[derive(Debug, Clone, Default)]
pub struct CustomFields {
    schema_fields: Vec<FieldDefinition>,
    plugin_fields: Vec<FieldDefinition>,
    /// Schema, then plugin, then detected fields, in that order.
    combined: Vec<FieldDefinition>,
    /// `combined`, stably sorted by `order`.
    sorted: Vec<FieldDefinition>,
    values: MetaMap,
    stored: MetaMap,
    last_applied: Option<HydrationSignature>,
}

impl CustomFields {
    pub(crate) fn new(schema_fields: Vec<FieldDefinition>, plugin_fields: Vec<FieldDefinition>, stored: MetaMap) -> Self {
        let mut fields = Self {
            schema_fields,
            plugin_fields,
            stored,
            ..Default::default()
        };
        fields.rebuild_definitions();
        fields
    }

    /// All field definitions, sorted by `order`.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.sorted
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.sorted.iter().find(|field| field.key == key)
    }

    pub fn value(&self, key: &str) -> Option<&CustomFieldValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &MetaMap {
        &self.values
    }

    /// Meta as last loaded from storage.
    pub fn stored(&self) -> &MetaMap {
        &self.stored
    }

    pub fn was_stored(&self, key: &str) -> bool {
        self.stored.contains_key(key)
    }

    pub(crate) fn plugin_fields(&self) -> &[FieldDefinition] {
        &self.plugin_fields
    }

    pub(crate) fn set_value(&mut self, key: &str, value: CustomFieldValue) {
        self.values.insert(key.to_string(), value);
    }

    pub(crate) fn replace_sources(
        &mut self,
        schema_fields: Vec<FieldDefinition>,
        plugin_fields: Vec<FieldDefinition>,
        stored: MetaMap,
    ) {
        self.schema_fields = schema_fields;
        self.plugin_fields = plugin_fields;
        self.stored = stored;
        self.rebuild_definitions();
    }

    /// Re-seeds values when the hydration signature moved. Returns whether
    /// it did.
    pub(crate) fn hydrate(&mut self, post: Option<&Post>, slug: &str, is_new_record: bool) -> bool {
        let signature = HydrationSignature::compute(&self.combined, &self.stored, post, slug);
        if self.last_applied.as_ref() == Some(&signature) {
            return false;
        }

        let mut values = MetaMap::new();
        for field in &self.combined {
            let value = if field.is_system {
                system_field_value(field, post, is_new_record)
            } else {
                user_field_value(field, &self.stored)
            };
            values.insert(field.key.clone(), value);
        }
        debug!(slug, fields = values.len(), "Custom fields hydrated");
        self.values = values;
        self.last_applied = Some(signature);
        true
    }

    fn rebuild_definitions(&mut self) {
        let mut seen: HashSet<String> = self.schema_fields.iter().map(|f| f.key.clone()).collect();
        let mut combined = self.schema_fields.clone();

        for (index, field) in self.plugin_fields.iter().enumerate() {
            if field.key.is_empty() || seen.contains(&field.key) {
                continue;
            }
            let mut field = field.clone();
            field.order = PLUGIN_ORDER_BASE + index as i32;
            if !matches!(field.source, FieldSource::Plugin { .. }) {
                field.source = FieldSource::Plugin {
                    name: String::new(),
                };
            }
            seen.insert(field.key.clone());
            combined.push(field);
        }

        for (index, (key, value)) in self.stored.iter().enumerate() {
            if seen.contains(key) || key == PAGE_BUILDER_META_KEY {
                continue;
            }
            combined.push(FieldDefinition::detected(key, value, DETECTED_ORDER_BASE + index as i32));
            seen.insert(key.clone());
        }

        let mut sorted = combined.clone();
        sorted.sort_by_key(|field| field.order);
        self.combined = combined;
        self.sorted = sorted;
    }
}
