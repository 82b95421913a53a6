//! Display-field extraction from CMS records.

use vitrine_shared::{Author, Category, Post};

use crate::entities::decode_html_entities;
use crate::text::strip_tags;

/// Slugs WordPress uses for its default bucket; never shown as "the" category.
const DEFAULT_CATEGORY_SLUGS: &[&str] = &["uncategorized", "non-classe"];

/// Title ready for display: tags removed, entities decoded.
pub fn display_title(rendered: &str) -> String {
    if rendered.contains('<') {
        strip_tags(rendered)
    } else {
        decode_html_entities(rendered).trim().to_string()
    }
}

/// The category a post is filed under for display and related-post lookup.
pub fn primary_category(post: &Post) -> Option<&Category> {
    post.categories
        .iter()
        .find(|c| !DEFAULT_CATEGORY_SLUGS.contains(&c.slug.as_str()))
        .or_else(|| post.categories.first())
}

/// The embedded author of a post, if the CMS returned one.
pub fn author_of(post: &Post) -> Option<&Author> {
    post.author.as_ref()
}
