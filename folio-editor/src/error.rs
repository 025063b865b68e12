//! Error types for the editor.

use folio_storage::StorageError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

/// Input problems caught before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required.")]
    TitleRequired,

    #[error("An organization is required to save this entry.")]
    OrganizationRequired,

    /// Duplicate was requested for a record that has never been saved.
    #[error("Save this entry before duplicating it.")]
    NotSaved,

    /// Rejected by a post-type handler or a before-save handler.
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Saving is not yet available for this post type.")]
    SaveUnavailable,

    #[error("a save is already in progress")]
    AlreadyInFlight,

    #[error("config error: {0}")]
    Config(String),
}

impl EditorError {
    /// Message shown inline next to the save button. Falls back to
    /// `fallback` when the error renders empty.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}
