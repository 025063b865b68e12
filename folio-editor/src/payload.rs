//! Meta payload sent with a save.

use crate::attachments::ATTACHMENTS_META_KEY;
use crate::context::EditContext;
use crate::vimeo::{apply_vimeo_meta, derive_vimeo_meta, tracks_vimeo};
use folio_model::{CustomFieldValue, FieldDefinition, MetaMap};
use tracing::debug;

/// Builds the meta written on save.
///
/// Custom field values come first, then attachments, taxonomy selections
/// and Vimeo meta; registered collectors are merged last and win on
/// conflicting keys.
pub fn build_meta_payload(ctx: &EditContext) -> MetaMap {
    let mut payload = MetaMap::new();
    let Some(custom) = ctx.custom_fields() else {
        return payload;
    };

    for field in custom.fields() {
        if field.is_system {
            continue;
        }
        let Some(value) = custom.value(&field.key) else {
            continue;
        };
        if let Some(value) = outgoing_value(field, value, custom.was_stored(&field.key)) {
            payload.insert(field.key.clone(), value);
        }
    }

    if let Some(attachments) = ctx.attachments() {
        match attachments.serialized_value() {
            Some(json) => {
                payload.insert(ATTACHMENTS_META_KEY.to_string(), json.into());
            }
            None if custom.was_stored(ATTACHMENTS_META_KEY) => {
                payload.insert(ATTACHMENTS_META_KEY.to_string(), "".into());
            }
            None => {}
        }
    }

    if let Some(taxonomy) = ctx.taxonomy() {
        payload.extend(taxonomy.payload());
    }

    if tracks_vimeo(ctx.slug()) {
        let derived = ctx.general().and_then(|general| derive_vimeo_meta(general.content()));
        apply_vimeo_meta(derived.as_ref(), custom.stored(), &mut payload);
    }

    let collected = ctx.collect_meta_payload();
    if !collected.is_empty() {
        debug!(keys = collected.len(), "Merging collected meta");
    }
    payload.extend(collected);
    payload
}

/// Outgoing policy for one field value.
///
/// Blank strings are sent as `""` for required fields, as `null` to clear a
/// previously stored value, and omitted otherwise. Everything else is sent
/// unchanged.
fn outgoing_value(field: &FieldDefinition, value: &CustomFieldValue, was_stored: bool) -> Option<CustomFieldValue> {
    match value {
        CustomFieldValue::Text(text) if text.trim().is_empty() => {
            if field.required {
                Some(CustomFieldValue::Text(String::new()))
            } else if was_stored {
                Some(CustomFieldValue::Null)
            } else {
                None
            }
        }
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_string_policy() {
        let optional = FieldDefinition::text("subtitle", "Subtitle");
        let required = FieldDefinition::text("code", "Code").with_required(true);
        let blank = CustomFieldValue::from("   ");

        assert_eq!(outgoing_value(&required, &blank, false), Some(CustomFieldValue::from("")));
        assert_eq!(outgoing_value(&optional, &blank, true), Some(CustomFieldValue::Null));
        assert_eq!(outgoing_value(&optional, &blank, false), None);
        assert_eq!(
            outgoing_value(&optional, &CustomFieldValue::from(" keep "), false),
            Some(CustomFieldValue::from(" keep "))
        );
        assert_eq!(
            outgoing_value(&optional, &CustomFieldValue::Bool(false), false),
            Some(CustomFieldValue::Bool(false))
        );
    }
}
