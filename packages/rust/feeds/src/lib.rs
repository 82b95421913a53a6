//! Feed generators: sitemap XML and delimited ad-platform exports.
//!
//! Inputs are already-fetched records; nothing here performs I/O.

pub mod export;
pub mod sitemap;

pub use export::{
    CAMPAIGNS_FILE_NAME, Delimiter, KEYWORDS_FILE_NAME, Table, campaigns_csv, escape_field,
    keyword_variants, keywords_tsv,
};
pub use sitemap::{
    ChangeFreq, DiscoverEntry, NewsEntry, Publication, SUB_SITEMAPS, UrlEntry, UrlKind, UrlSet,
    escape_xml, iso8601, render_discover, render_index, render_news, sitemap_file_name,
};
