//! Slug generation and validation for route parameters.

use vitrine_shared::{Expertise, ExpertiseCategory};

/// Normalize arbitrary text into a URL-safe slug.
///
/// Lowercase, accents transliterated to ASCII, every run of non-alphanumeric
/// characters collapsed to a single `-`, no leading or trailing `-`.
pub fn slugify(text: &str) -> String {
    ::slug::slugify(text)
}

/// Whether `s` can be used as a route slug as received from a URL.
///
/// WordPress keeps non-ASCII slugs percent-encoded, so `%` is accepted.
pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 200
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'%'))
}

/// Route slug of an expertise category (explicit slug, else derived from the name).
pub fn category_slug(category: &ExpertiseCategory) -> String {
    category
        .slug
        .clone()
        .unwrap_or_else(|| slugify(&category.name))
}

/// Route slug of an expertise (explicit slug, else derived from the title).
pub fn expertise_slug(expertise: &Expertise) -> String {
    expertise
        .slug
        .clone()
        .unwrap_or_else(|| slugify(&expertise.title))
}
