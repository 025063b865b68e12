use folio_model::PostStatus;
use serde::Serialize;

/// One entry of the status dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

pub fn status_options() -> Vec<StatusOption> {
    PostStatus::ALL
        .iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            description: status.description(),
        })
        .collect()
}

/// Read-only view of the sidebar affordances at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarContext {
    pub is_saving: bool,
    pub is_duplicating: bool,
    pub can_save_record: bool,
    /// Whether entries live in the shared posts table (duplicate is only
    /// offered there).
    pub supports_posts_table: bool,
    pub is_new_record: bool,
    pub status: PostStatus,
    pub status_options: Vec<StatusOption>,
    pub puck_editor_href: Option<String>,
    pub save_error: Option<String>,
}

impl SidebarContext {
    pub fn can_duplicate(&self) -> bool {
        self.supports_posts_table && !self.is_new_record
    }
}

/// Mutable flags the session flips around writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SidebarState {
    pub(crate) is_saving: bool,
    pub(crate) is_duplicating: bool,
    pub(crate) save_error: Option<String>,
}
