use folio_model::{Post, PostStatus};

/// The core post fields shown in the general panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralField {
    Title,
    Slug,
    Content,
    Excerpt,
    Status,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Tracked<T> {
    value: T,
    dirty: bool,
}

impl<T: PartialEq> Tracked<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            dirty: false,
        }
    }

    fn set(&mut self, value: T) {
        if self.value != value {
            self.value = value;
            self.dirty = true;
        }
    }
}

/// Title, slug, body, excerpt and status with per-field dirty tracking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralFields {
    title: Tracked<String>,
    slug: Tracked<String>,
    content: Tracked<String>,
    excerpt: Tracked<String>,
    status: Tracked<PostStatus>,
}

impl GeneralFields {
    /// Seeds from a stored entry. Unknown statuses read as draft.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: Tracked::new(post.title.clone().unwrap_or_default()),
            slug: Tracked::new(post.slug.clone().unwrap_or_default()),
            content: Tracked::new(post.content.clone().unwrap_or_default()),
            excerpt: Tracked::new(post.excerpt.clone().unwrap_or_default()),
            status: Tracked::new(post.post_status().unwrap_or_default()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title.value
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title.set(title.into());
    }

    pub fn slug(&self) -> &str {
        &self.slug.value
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.slug.set(slug.into());
    }

    pub fn content(&self) -> &str {
        &self.content.value
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content.set(content.into());
    }

    pub fn excerpt(&self) -> &str {
        &self.excerpt.value
    }

    pub fn set_excerpt(&mut self, excerpt: impl Into<String>) {
        self.excerpt.set(excerpt.into());
    }

    pub fn status(&self) -> PostStatus {
        self.status.value
    }

    pub fn set_status(&mut self, status: PostStatus) {
        self.status.set(status);
    }

    pub fn is_published(&self) -> bool {
        self.status.value == PostStatus::Published
    }

    /// Toggles between published and draft.
    pub fn set_published(&mut self, published: bool) {
        self.set_status(if published {
            PostStatus::Published
        } else {
            PostStatus::Draft
        });
    }

    pub fn is_dirty(&self, field: GeneralField) -> bool {
        match field {
            GeneralField::Title => self.title.dirty,
            GeneralField::Slug => self.slug.dirty,
            GeneralField::Content => self.content.dirty,
            GeneralField::Excerpt => self.excerpt.dirty,
            GeneralField::Status => self.status.dirty,
        }
    }

    pub fn any_dirty(&self) -> bool {
        [
            GeneralField::Title,
            GeneralField::Slug,
            GeneralField::Content,
            GeneralField::Excerpt,
            GeneralField::Status,
        ]
        .into_iter()
        .any(|field| self.is_dirty(field))
    }

    pub(crate) fn mark_clean(&mut self) {
        self.title.dirty = false;
        self.slug.dirty = false;
        self.content.dirty = false;
        self.excerpt.dirty = false;
        self.status.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_track_dirty_independently() {
        let mut general = GeneralFields::default();
        assert!(!general.any_dirty());

        general.set_title("Hello");
        assert!(general.is_dirty(GeneralField::Title));
        assert!(!general.is_dirty(GeneralField::Slug));

        // Writing the same value is not an edit.
        general.set_excerpt("");
        assert!(!general.is_dirty(GeneralField::Excerpt));

        general.mark_clean();
        assert!(!general.any_dirty());
        assert_eq!(general.title(), "Hello");
    }

    #[test]
    fn published_toggle() {
        let mut general = GeneralFields::default();
        assert_eq!(general.status(), PostStatus::Draft);
        general.set_published(true);
        assert!(general.is_published());
        general.set_published(false);
        assert_eq!(general.status(), PostStatus::Draft);
    }
}
