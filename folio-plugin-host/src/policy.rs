//! Install policy: reads `policy.toml` and decides which plugins a tenant may
//! switch on and which post-type slugs plugins may never provision.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Policy mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    #[default]
    /// Only explicitly listed plugins can be activated.
    Allowlist,
    /// All plugins except explicitly listed ones can be activated.
    Denylist,
    /// No restrictions on plugin activation.
    Unrestricted,
}

/// Policy configuration parsed from `policy.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_policy_mode")]
    pub mode: PolicyMode,
    /// Allowed ids in allowlist mode, blocked ids in denylist mode.
    #[serde(default)]
    pub plugin_ids: Vec<String>,
    /// Core post types a plugin must not overwrite.
    #[serde(default = "default_reserved_slugs")]
    pub reserved_post_types: BTreeSet<String>,
}

fn default_policy_mode() -> PolicyMode {
    PolicyMode::Unrestricted
}

fn default_reserved_slugs() -> BTreeSet<String> {
    ["posts", "pages", "attachment"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            mode: PolicyMode::Unrestricted,
            plugin_ids: Vec::new(),
            reserved_post_types: default_reserved_slugs(),
        }
    }
}

/// Enforces install policy decisions.
#[derive(Debug)]
pub struct PolicyEngine {
    config: PolicyConfig,
    policy_path: Option<PathBuf>,
}

impl PolicyEngine {
    /// Loads policy from an explicit path.
    /// Falls back to unrestricted mode when the file is missing or broken.
    pub fn load_from(policy_path: PathBuf) -> Self {
        if !policy_path.exists() {
            info!("No policy file found at {:?}, running unrestricted", policy_path);
            return Self {
                config: PolicyConfig::default(),
                policy_path: None,
            };
        }

        match std::fs::read_to_string(&policy_path) {
            Ok(contents) => match toml::from_str::<PolicyFile>(&contents) {
                Ok(file) => {
                    info!("Loaded plugin policy from {:?}", policy_path);
                    Self {
                        config: file.into_config(),
                        policy_path: Some(policy_path),
                    }
                }
                Err(e) => {
                    warn!(
                        "Failed to parse policy file {:?}: {}. Falling back to unrestricted mode.",
                        policy_path, e
                    );
                    Self {
                        config: PolicyConfig::default(),
                        policy_path: Some(policy_path),
                    }
                }
            },
            Err(e) => {
                warn!("Failed to read policy file {:?}: {}", policy_path, e);
                Self {
                    config: PolicyConfig::default(),
                    policy_path: Some(policy_path),
                }
            }
        }
    }

    /// Creates a policy engine with explicit config (for testing).
    pub fn with_config(config: PolicyConfig) -> Self {
        Self {
            config,
            policy_path: None,
        }
    }

    /// Check if a plugin may be activated.
    pub fn is_plugin_allowed(&self, plugin_id: &str) -> bool {
        let listed = self.config.plugin_ids.iter().any(|id| id == plugin_id);
        match self.config.mode {
            PolicyMode::Unrestricted => true,
            PolicyMode::Allowlist => listed,
            PolicyMode::Denylist => !listed,
        }
    }

    pub fn is_post_type_reserved(&self, slug: &str) -> bool {
        self.config.reserved_post_types.contains(slug)
    }

    /// Returns whether a policy file was found.
    pub fn has_policy_file(&self) -> bool {
        self.policy_path.is_some()
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::with_config(PolicyConfig::default())
    }
}

/// Raw TOML structure matching the policy.toml format.
#[derive(Deserialize)]
struct PolicyFile {
    #[serde(default)]
    policy: PolicySection,
}

#[derive(Deserialize, Default)]
struct PolicySection {
    #[serde(default = "default_policy_mode")]
    mode: PolicyMode,
    #[serde(default)]
    plugins: Vec<String>,
    #[serde(default, rename = "reserved-post-types")]
    reserved_post_types: Option<Vec<String>>,
}

impl PolicyFile {
    fn into_config(self) -> PolicyConfig {
        PolicyConfig {
            mode: self.policy.mode,
            plugin_ids: self.policy.plugins,
            reserved_post_types: self
                .policy
                .reserved_post_types
                .map(|slugs| slugs.into_iter().collect())
                .unwrap_or_else(default_reserved_slugs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_allows_all() {
        let engine = PolicyEngine::with_config(PolicyConfig::default());
        assert!(engine.is_plugin_allowed("anything"));
        assert!(engine.is_post_type_reserved("posts"));
        assert!(!engine.is_post_type_reserved("courses"));
    }

    #[test]
    fn allowlist_mode() {
        let engine = PolicyEngine::with_config(PolicyConfig {
            mode: PolicyMode::Allowlist,
            plugin_ids: vec!["lms".to_string()],
            ..Default::default()
        });
        assert!(engine.is_plugin_allowed("lms"));
        assert!(!engine.is_plugin_allowed("shop"));
    }

    #[test]
    fn denylist_mode_blocks_listed_allows_others() {
        let engine = PolicyEngine::with_config(PolicyConfig {
            mode: PolicyMode::Denylist,
            plugin_ids: vec!["shop".to_string()],
            ..Default::default()
        });
        assert!(!engine.is_plugin_allowed("shop"));
        assert!(engine.is_plugin_allowed("lms"));
    }

    #[test]
    fn parse_policy_toml() {
        let toml_str = r#"
[policy]
mode = "allowlist"
plugins = ["lms", "calendar"]
reserved-post-types = ["posts"]
"#;
        let file: PolicyFile = toml::from_str(toml_str).unwrap();
        let config = file.into_config();

        assert_eq!(config.mode, PolicyMode::Allowlist);
        assert_eq!(config.plugin_ids.len(), 2);
        assert_eq!(config.reserved_post_types.len(), 1);
    }

    // ================================================================
    // load_from() fallback
    // ================================================================

    /// Helper: write TOML content to a temp file and load via `load_from`.
    fn load_policy_from_str(toml_content: &str) -> PolicyEngine {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.toml");
        std::fs::write(&path, toml_content).unwrap();
        PolicyEngine::load_from(path)
    }

    #[test]
    fn load_from_missing_file_is_unrestricted() {
        let dir = tempfile::tempdir().unwrap();
        let engine = PolicyEngine::load_from(dir.path().join("nonexistent.toml"));
        assert!(!engine.has_policy_file());
        assert!(engine.is_plugin_allowed("anything"));
    }

    #[test]
    fn load_from_denylist_file() {
        let engine = load_policy_from_str(
            r#"
[policy]
mode = "denylist"
plugins = ["blocked"]
"#,
        );
        assert!(engine.has_policy_file());
        assert_eq!(engine.config().mode, PolicyMode::Denylist);
        assert!(!engine.is_plugin_allowed("blocked"));
        assert!(engine.is_plugin_allowed("anything.else"));
        assert!(engine.is_post_type_reserved("pages"));
    }

    #[test]
    fn load_from_malformed_file_falls_back_unrestricted() {
        let engine = load_policy_from_str("this is not valid toml {{{{");
        assert!(engine.has_policy_file());
        assert!(engine.is_plugin_allowed("anything"));
    }

    #[test]
    fn load_from_unreadable_path_falls_back_unrestricted() {
        // A directory exists but cannot be read as a file.
        let dir = tempfile::tempdir().unwrap();
        let engine = PolicyEngine::load_from(dir.path().to_path_buf());
        assert!(engine.is_plugin_allowed("anything"));
    }

    #[test]
    fn completely_empty_toml_uses_section_default() {
        // No [policy] table at all: PolicySection::default() derives Allowlist.
        let file: PolicyFile = toml::from_str("").unwrap();
        assert_eq!(file.into_config().mode, PolicyMode::Allowlist);
    }
}
