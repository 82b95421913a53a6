//! Page composers, feed composers and the static build.
//!
//! Composers take a [`ContentSource`](vitrine_cms::ContentSource) and a
//! [`SiteContext`], and return a typed view-model wrapped in a
//! [`PageOutcome`]. Feed composers return serialised documents.

pub mod build;
pub mod catalog;
pub mod compose;
pub mod context;
pub mod feeds;
pub mod memory;
pub mod page;
pub mod views;

pub use build::{
    BuildResult, BuiltFile, ProgressReporter, SilentProgress, build_all, build_feeds, sha256_hex,
};
pub use catalog::{default_catalog, load_catalog};
pub use context::SiteContext;
pub use feeds::{FeedKind, compose_feed};
pub use memory::InMemorySource;
pub use page::{OgKind, OpenGraph, Page, PageOutcome, Pagination, RouteMeta};
