//! Central plugin lifecycle manager.
//!
//! Holds every registered `PluginDefinition`, enforces policy, and switches
//! plugins on and off per tenant through the site-options store.

use crate::definition::PluginDefinition;
use crate::error::{PluginHostError, Result};
use crate::policy::PolicyEngine;
use folio_model::{CustomFieldValue, FieldDefinition};
use folio_storage::{PostTypeCatalog, SiteOptions};
use folio_types::OrganizationId;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Site option that records whether a plugin is on for a tenant.
pub fn enabled_option_key(plugin_id: &str) -> String {
    format!("plugin_{plugin_id}_enabled")
}

pub struct PluginManager<S> {
    /// Registration order; earlier plugins win field-key collisions.
    plugins: Vec<PluginDefinition>,
    policy_engine: PolicyEngine,
    store: Arc<S>,
}

impl<S: SiteOptions + PostTypeCatalog> PluginManager<S> {
    /// Creates a manager with an unrestricted policy.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_policy(store, PolicyEngine::default())
    }

    pub fn with_policy(store: Arc<S>, policy_engine: PolicyEngine) -> Self {
        Self {
            plugins: Vec::new(),
            policy_engine,
            store,
        }
    }

    // ================================================================
    // Registration
    // ================================================================

    pub fn register(&mut self, definition: PluginDefinition) -> Result<()> {
        if self.plugins.iter().any(|p| p.id == definition.id) {
            return Err(PluginHostError::PluginAlreadyRegistered(definition.id));
        }
        debug!(plugin_id = %definition.id, "Plugin registered");
        self.plugins.push(definition);
        Ok(())
    }

    pub fn get_plugin(&self, plugin_id: &str) -> Result<&PluginDefinition> {
        self.plugins
            .iter()
            .find(|p| p.id == plugin_id)
            .ok_or_else(|| PluginHostError::PluginNotFound(plugin_id.to_string()))
    }

    pub fn list_plugins(&self) -> &[PluginDefinition] {
        &self.plugins
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn policy_engine(&self) -> &PolicyEngine {
        &self.policy_engine
    }

    // ================================================================
    // Activation
    // ================================================================

    /// Switches a plugin on for a tenant: provisions its post types (existing
    /// slugs are left alone), seeds default options that are not yet set, and
    /// writes the enabled flag.
    pub fn activate(&self, organization: OrganizationId, plugin_id: &str) -> Result<()> {
        if !self.policy_engine.is_plugin_allowed(plugin_id) {
            return Err(PluginHostError::PolicyDenied(format!(
                "plugin '{}' blocked by policy",
                plugin_id
            )));
        }
        let plugin = self.get_plugin(plugin_id)?;

        for post_type in &plugin.post_types {
            if self.policy_engine.is_post_type_reserved(&post_type.slug) {
                warn!(plugin_id = %plugin_id, slug = %post_type.slug, "Skipping reserved post type");
                continue;
            }
            if self
                .store
                .get_post_type(organization, &post_type.slug)
                .is_some()
            {
                debug!(plugin_id = %plugin_id, slug = %post_type.slug, "Post type already provisioned");
                continue;
            }
            self.store.upsert_post_type(organization, post_type.clone())?;
            info!(plugin_id = %plugin_id, slug = %post_type.slug, "Post type provisioned");
        }

        for (key, value) in &plugin.default_options {
            if self.store.get_site_option(organization, key).is_none() {
                self.store.set_site_option(organization, key, value.clone())?;
            }
        }

        self.store.set_site_option(
            organization,
            &enabled_option_key(plugin_id),
            CustomFieldValue::Bool(true),
        )?;
        info!(plugin_id = %plugin_id, organization = %organization, "Plugin activated");
        Ok(())
    }

    /// Switches a plugin off. Provisioned post types and their entries stay.
    pub fn deactivate(&self, organization: OrganizationId, plugin_id: &str) -> Result<()> {
        self.get_plugin(plugin_id)?;
        self.store.set_site_option(
            organization,
            &enabled_option_key(plugin_id),
            CustomFieldValue::Bool(false),
        )?;
        info!(plugin_id = %plugin_id, organization = %organization, "Plugin deactivated");
        Ok(())
    }

    pub fn is_enabled(&self, organization: OrganizationId, plugin_id: &str) -> bool {
        self.store
            .get_site_option(organization, &enabled_option_key(plugin_id))
            .map(|value| value.coerce_bool())
            .unwrap_or(false)
    }

    /// Ids of every registered plugin that is on for the tenant. This is the
    /// snapshot an edit context is built with.
    pub fn enabled_plugins(&self, organization: OrganizationId) -> BTreeSet<String> {
        self.plugins
            .iter()
            .filter(|p| self.is_enabled(organization, &p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    // ================================================================
    // Editor integration
    // ================================================================

    /// Fields registered by any plugin for `post_type_slug`, deduplicated by
    /// key with the earliest registration winning.
    pub fn field_definitions_for(&self, post_type_slug: &str) -> Vec<FieldDefinition> {
        let mut seen = HashSet::new();
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.fields_for(post_type_slug))
            .filter(|field| !field.key.is_empty() && seen.insert(field.key.clone()))
            .collect()
    }
}
