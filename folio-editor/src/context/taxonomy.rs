use folio_model::{CustomFieldValue, MetaMap};
use folio_types::TermId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Meta key holding the selected term ids of `taxonomy`.
pub fn terms_meta_key(taxonomy: &str) -> String {
    format!("terms_{taxonomy}")
}

/// Term selection for each taxonomy attached to the post type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonomyContext {
    selected: BTreeMap<String, BTreeSet<TermId>>,
    dirty: BTreeSet<String>,
}

impl TaxonomyContext {
    /// Reads the stored selection of every taxonomy. Unparsable entries
    /// start empty.
    pub(crate) fn from_stored(taxonomies: &[String], stored: &MetaMap) -> Self {
        let selected = taxonomies
            .iter()
            .map(|taxonomy| {
                let terms = stored
                    .get(&terms_meta_key(taxonomy))
                    .map(|raw| parse_terms(taxonomy, raw))
                    .unwrap_or_default();
                (taxonomy.clone(), terms)
            })
            .collect();
        Self {
            selected,
            dirty: BTreeSet::new(),
        }
    }

    pub fn taxonomies(&self) -> impl Iterator<Item = &str> {
        self.selected.keys().map(String::as_str)
    }

    pub fn selected(&self, taxonomy: &str) -> Option<&BTreeSet<TermId>> {
        self.selected.get(taxonomy)
    }

    /// Flips `term` in `taxonomy`. Returns whether the term is now selected,
    /// or `None` for a taxonomy the post type does not use.
    pub fn toggle_term(&mut self, taxonomy: &str, term: TermId) -> Option<bool> {
        let terms = self.selected.get_mut(taxonomy)?;
        let now_selected = if terms.remove(&term) {
            false
        } else {
            terms.insert(term);
            true
        };
        self.dirty.insert(taxonomy.to_string());
        Some(now_selected)
    }

    /// Meta entries for every taxonomy touched in this session.
    pub(crate) fn payload(&self) -> MetaMap {
        self.dirty
            .iter()
            .filter_map(|taxonomy| {
                let terms = self.selected.get(taxonomy)?;
                let ids: Vec<String> = terms.iter().map(ToString::to_string).collect();
                let json = serde_json::to_string(&ids).ok()?;
                Some((terms_meta_key(taxonomy), CustomFieldValue::Text(json)))
            })
            .collect()
    }
}

fn parse_terms(taxonomy: &str, raw: &CustomFieldValue) -> BTreeSet<TermId> {
    let Some(text) = raw.as_str().filter(|s| !s.trim().is_empty()) else {
        return BTreeSet::new();
    };
    match serde_json::from_str::<Vec<String>>(text) {
        Ok(ids) => ids.iter().filter_map(|id| TermId::parse(id).ok()).collect(),
        Err(e) => {
            warn!(taxonomy, "Ignoring malformed term selection: {}", e);
            BTreeSet::new()
        }
    }
}
