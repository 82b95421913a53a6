//! CMS access: the [`ContentSource`] seam and its WordPress implementation.
//!
//! Posts, categories, authors, portfolio items and levées come from the
//! WordPress REST API; team members and toolbox entries come from WPGraphQL.

pub mod client;
mod graphql;
mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vitrine_shared::{
    Author, Category, LeveeItem, Paged, PortfolioItem, Post, Result, TeamMember, ToolboxEntry,
};

pub use client::{ProxiedResponse, WordPressClient};

/// Default page size for post listings.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Filters for a paginated post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    pub category: Option<u64>,
    pub author: Option<u64>,
    /// Post ids to leave out (e.g. the post currently displayed).
    pub exclude: Vec<u64>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            category: None,
            author: None,
            exclude: Vec::new(),
        }
    }
}

impl PostQuery {
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            ..Self::default()
        }
    }
}

/// Read-only view of the CMS.
///
/// `*_by_slug` lookups return `Ok(None)` for unknown slugs. A listing page past
/// the end of a collection is `Err(VitrineError::NotFound)`.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn list_posts(&self, query: &PostQuery) -> Result<Paged<Post>>;
    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>>;
    /// Posts published strictly after `since`, newest first.
    async fn recent_posts(&self, since: DateTime<Utc>) -> Result<Vec<Post>>;
    async fn all_posts(&self) -> Result<Vec<Post>>;

    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>>;
    async fn author_by_slug(&self, slug: &str) -> Result<Option<Author>>;

    async fn list_portfolio(&self) -> Result<Vec<PortfolioItem>>;
    async fn portfolio_by_slug(&self, slug: &str) -> Result<Option<PortfolioItem>>;

    async fn list_team(&self) -> Result<Vec<TeamMember>>;
    async fn team_member_by_slug(&self, slug: &str) -> Result<Option<TeamMember>>;

    async fn list_toolbox(&self) -> Result<Vec<ToolboxEntry>>;
    async fn toolbox_by_slug(&self, slug: &str) -> Result<Option<ToolboxEntry>>;

    async fn list_levees(&self) -> Result<Vec<LeveeItem>>;
    async fn levee_by_slug(&self, slug: &str) -> Result<Option<LeveeItem>>;
}
