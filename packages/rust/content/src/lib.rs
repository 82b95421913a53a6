//! Field transformers: pure functions mapping raw CMS records to display values.
//!
//! Nothing in this crate does I/O. Each module is one family of transforms:
//! - [`entities`] — HTML entity decoding
//! - [`text`] — tag stripping, reading time, meta excerpts
//! - [`slugs`] — slug generation and route-parameter validation
//! - [`images`] — featured-image resolution and CDN rewriting
//! - [`fields`] — category/author/title extraction
//! - [`redirects`] — legacy slug remapping

pub mod entities;
pub mod fields;
pub mod images;
pub mod redirects;
pub mod slugs;
pub mod text;

pub use entities::decode_html_entities;
pub use fields::{author_of, display_title, primary_category};
pub use images::{CdnRewriter, featured_image, resolve_image_url, rewrite_for_cdn};
pub use redirects::SlugRedirects;
pub use slugs::{category_slug, expertise_slug, is_valid_slug, slugify};
pub use text::{estimate_reading_time, excerpt_text, format_reading_time, strip_tags, word_count};
