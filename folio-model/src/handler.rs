use crate::{EntityPayload, Post};

/// Optional per-post-type hook for plugins that need validation or
/// post-load enrichment beyond the generic editor flow.
///
/// Most post types do NOT need this; the editor session handles the
/// title/organization checks itself.
pub trait PostTypeHandler: Send + Sync {
    /// Validate a payload before it is written.
    /// Return `Err(message)` to reject the save; the message is shown inline.
    fn validate(&self, payload: &EntityPayload) -> Result<(), String> {
        let _ = payload;
        Ok(())
    }

    /// Called after an entity is loaded into an edit session, before hydration.
    fn on_after_load(&self, post: &mut Post) {
        let _ = post;
    }
}
