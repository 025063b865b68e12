use folio_types::Timestamp;
use regex::Regex;
use std::sync::LazyLock;

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9_\s-]").expect("slug pattern is valid")
});

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s_-]+").expect("separator pattern is valid")
});

/// URL slug from free text: lowercase ASCII letters, digits and single
/// hyphens. Returns an empty string when nothing usable is left.
pub fn generate_slug(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let dashed = SEPARATORS.replace_all(&stripped, "-");
    dashed.trim_matches('-').to_string()
}

/// Slug used when the title yields nothing.
pub fn fallback_slug(prefix: &str) -> String {
    format!("{prefix}-{}", Timestamp::now().as_millis())
}

/// Slug for a save: the manual slug if given, else the title, normalized.
pub(crate) fn normalize_slug(manual: &str, title: &str) -> String {
    let base = match manual.trim() {
        "" => generate_slug(title),
        manual => manual.to_string(),
    };
    match generate_slug(&base) {
        slug if slug.is_empty() => fallback_slug("post"),
        slug => slug,
    }
}
