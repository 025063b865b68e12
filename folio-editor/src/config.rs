//! Editor configuration, read from `editor.toml`.
//!
//! ```toml
//! [editor]
//! default_priority = 50
//! isolate_hook_panics = true
//! base_url = "https://example.com"
//!
//! [editor.slots.sidebar]
//! panels = ["actions", "metadata"]
//!
//! [editor.visibility]
//! show_general_panel = false
//! ```

use crate::error::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_PRIORITY: i32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Priority given to field-backed meta boxes that declare none.
    pub default_priority: i32,
    /// Catch panicking hooks and collectors instead of unwinding through
    /// the editor.
    pub isolate_hook_panics: bool,
    /// Front-end origin used for slug previews. Empty means relative paths.
    pub base_url: String,
    pub slots: BTreeMap<String, SlotConfig>,
    pub visibility: Visibility,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_PRIORITY,
            isolate_hook_panics: true,
            base_url: String::new(),
            slots: BTreeMap::new(),
            visibility: Visibility::default(),
        }
    }
}

/// Per-slot overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Allow-list of panel ids in display order. `None` shows everything;
    /// an empty list shows nothing.
    #[serde(default)]
    pub panels: Option<Vec<String>>,
}

/// Sparse switches for built-in panels. An unset flag means "show".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visibility {
    pub show_general_panel: Option<bool>,
    pub show_custom_fields_panel: Option<bool>,
    pub show_sidebar_actions: Option<bool>,
    pub show_sidebar_metadata: Option<bool>,
}

impl Visibility {
    pub fn general_panel(&self) -> bool {
        self.show_general_panel.unwrap_or(true)
    }

    pub fn custom_fields_panel(&self) -> bool {
        self.show_custom_fields_panel.unwrap_or(true)
    }

    pub fn sidebar_actions(&self) -> bool {
        self.show_sidebar_actions.unwrap_or(true)
    }

    pub fn sidebar_metadata(&self) -> bool {
        self.show_sidebar_metadata.unwrap_or(true)
    }

    /// Overlays the flags `other` sets on top of these.
    pub fn merged(&self, other: &Visibility) -> Visibility {
        Visibility {
            show_general_panel: other.show_general_panel.or(self.show_general_panel),
            show_custom_fields_panel: other
                .show_custom_fields_panel
                .or(self.show_custom_fields_panel),
            show_sidebar_actions: other.show_sidebar_actions.or(self.show_sidebar_actions),
            show_sidebar_metadata: other.show_sidebar_metadata.or(self.show_sidebar_metadata),
        }
    }
}

/// Raw TOML layout: everything lives under `[editor]`.
#[derive(Deserialize, Default)]
struct EditorFile {
    #[serde(default)]
    editor: EditorConfig,
}

impl EditorConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> EditorResult<Self> {
        toml::from_str::<EditorFile>(contents)
            .map(|file| file.editor)
            .map_err(|e| EditorError::Config(e.to_string()))
    }

    /// Loads config from `path`, falling back to defaults when the file is
    /// missing, unreadable or malformed.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No editor config at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded editor config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse editor config {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read editor config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// The allow-list configured for `slot`, if any.
    pub fn allow_list(&self, slot: &str) -> Option<&[String]> {
        self.slots
            .get(slot)
            .and_then(|slot| slot.panels.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.default_priority, 50);
        assert!(config.isolate_hook_panics);
        assert!(config.visibility.general_panel());
        assert_eq!(config.allow_list("sidebar"), None);
    }

    #[test]
    fn parse_full_document() {
        let config = EditorConfig::from_toml_str(
            r#"
[editor]
default_priority = 70
isolate_hook_panics = false

[editor.slots.sidebar]
panels = ["actions", "metadata"]

[editor.slots.main]
panels = []

[editor.visibility]
show_custom_fields_panel = false
"#,
        )
        .unwrap();

        assert_eq!(config.default_priority, 70);
        assert!(!config.isolate_hook_panics);
        assert_eq!(
            config.allow_list("sidebar"),
            Some(&["actions".to_string(), "metadata".to_string()][..])
        );
        assert_eq!(config.allow_list("main"), Some(&[] as &[String]));
        assert!(!config.visibility.custom_fields_panel());
        assert!(config.visibility.sidebar_actions());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(EditorConfig::from_toml_str("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn invalid_document_is_config_error() {
        let err = EditorConfig::from_toml_str("[editor\n").unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }

    #[test]
    fn merged_visibility_prefers_overlay() {
        let base = Visibility {
            show_general_panel: Some(false),
            show_sidebar_actions: Some(false),
            ..Default::default()
        };
        let overlay = Visibility {
            show_general_panel: Some(true),
            ..Default::default()
        };
        let merged = base.merged(&overlay);
        assert!(merged.general_panel());
        assert!(!merged.sidebar_actions());
    }
}
