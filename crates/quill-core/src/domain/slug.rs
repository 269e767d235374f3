//! URL slugs for published posts.

use uuid::Uuid;

/// Length of the random suffix appended to every generated slug.
pub const SUFFIX_LEN: usize = 8;

/// Lower-case the title and collapse every run of non-alphanumeric
/// characters into a single hyphen. Leading and trailing hyphens are dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Slugify the title and append a short random disambiguator, so that two
/// posts with the same title never share a slug.
pub fn generate(title: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let suffix = &id[..SUFFIX_LEN];

    let base = slugify(title);
    if base.is_empty() {
        suffix.to_string()
    } else {
        format!("{base}-{suffix}")
    }
}
