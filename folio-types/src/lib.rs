//! Core type definitions for Folio.
//!
//! This crate defines the fundamental, content-agnostic types shared by the
//! model, storage, plugin host and editor crates:
//! - Record identifiers (UUID v7): posts, media items, organizations,
//!   field definitions and taxonomy terms
//! - Millisecond timestamps with RFC 3339 formatting
//!
//! Anything that knows about post types, custom fields or panels belongs in
//! `folio-model` or `folio-editor`, not here.

mod ids;
mod timestamp;

pub use ids::{FieldId, MediaItemId, OrganizationId, PostId, TermId};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
