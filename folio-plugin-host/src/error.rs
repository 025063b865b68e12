//! Error types for the plugin host.

use folio_storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PluginHostError>;

#[derive(Debug, Error)]
pub enum PluginHostError {
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("plugin already registered: {0}")]
    PluginAlreadyRegistered(String),

    #[error("policy denied: {0}")]
    PolicyDenied(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
