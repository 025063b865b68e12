//! Plugin host for Folio.
//!
//! Plugins are declared up front as [`PluginDefinition`]s and switched on per
//! tenant. Activating a plugin provisions the post types it ships, seeds its
//! default site options, and flips the `plugin_<id>_enabled` option the editor
//! reads when deciding which panels to show.
//!
//! Installation is gated by an admin-managed [`PolicyEngine`] loaded from
//! `policy.toml`.

mod definition;
mod error;
mod manager;
mod policy;

pub use definition::{FieldRegistration, PluginDefinition};
pub use error::{PluginHostError, Result};
pub use manager::{PluginManager, enabled_option_key};
pub use policy::{PolicyConfig, PolicyEngine, PolicyMode};
