//! In-memory [`ContentSource`], used by tests and offline builds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vitrine_cms::{ContentSource, PostQuery};
use vitrine_shared::{
    Author, Category, LeveeItem, Paged, PortfolioItem, Post, Result, TeamMember, ToolboxEntry,
    VitrineError,
};

/// Content held in memory. Listing semantics follow the WordPress REST API:
/// newest first, and a page past the end is `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub posts: Vec<Post>,
    pub categories: Vec<Category>,
    pub authors: Vec<Author>,
    pub portfolio: Vec<PortfolioItem>,
    pub team: Vec<TeamMember>,
    pub toolbox: Vec<ToolboxEntry>,
    pub levees: Vec<LeveeItem>,
    /// When set, every call fails as if the CMS were down.
    pub unavailable: bool,
}

impl InMemorySource {
    fn check(&self) -> Result<()> {
        if self.unavailable {
            return Err(VitrineError::Network("content source unavailable".into()));
        }
        Ok(())
    }

    fn sorted_posts(&self) -> Vec<Post> {
        let mut posts = self.posts.clone();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts
    }
}

#[async_trait]
impl ContentSource for InMemorySource {
    async fn list_posts(&self, query: &PostQuery) -> Result<Paged<Post>> {
        self.check()?;
        let matching: Vec<Post> = self
            .sorted_posts()
            .into_iter()
            .filter(|p| query.category.is_none_or(|c| p.category_ids.contains(&c)))
            .filter(|p| {
                query
                    .author
                    .is_none_or(|a| p.author.as_ref().is_some_and(|au| au.id == a))
            })
            .filter(|p| !query.exclude.contains(&p.id))
            .collect();

        let per_page = query.per_page.max(1) as usize;
        let total = matching.len();
        let total_pages = total.div_ceil(per_page) as u32;
        let page = query.page.max(1);
        if page > total_pages.max(1) {
            return Err(VitrineError::not_found(format!("posts page {page}")));
        }

        let items = matching
            .into_iter()
            .skip((page as usize - 1) * per_page)
            .take(per_page)
            .collect();
        Ok(Paged {
            items,
            total: total as u64,
            total_pages,
        })
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.check()?;
        Ok(self.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn recent_posts(&self, since: DateTime<Utc>) -> Result<Vec<Post>> {
        self.check()?;
        Ok(self
            .sorted_posts()
            .into_iter()
            .filter(|p| p.published_at > since)
            .collect())
    }

    async fn all_posts(&self) -> Result<Vec<Post>> {
        self.check()?;
        Ok(self.sorted_posts())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.check()?;
        Ok(self.categories.clone())
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        self.check()?;
        Ok(self.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn author_by_slug(&self, slug: &str) -> Result<Option<Author>> {
        self.check()?;
        Ok(self.authors.iter().find(|a| a.slug == slug).cloned())
    }

    async fn list_portfolio(&self) -> Result<Vec<PortfolioItem>> {
        self.check()?;
        Ok(self.portfolio.clone())
    }

    async fn portfolio_by_slug(&self, slug: &str) -> Result<Option<PortfolioItem>> {
        self.check()?;
        Ok(self.portfolio.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list_team(&self) -> Result<Vec<TeamMember>> {
        self.check()?;
        Ok(self.team.clone())
    }

    async fn team_member_by_slug(&self, slug: &str) -> Result<Option<TeamMember>> {
        self.check()?;
        Ok(self.team.iter().find(|m| m.slug == slug).cloned())
    }

    async fn list_toolbox(&self) -> Result<Vec<ToolboxEntry>> {
        self.check()?;
        Ok(self.toolbox.clone())
    }

    async fn toolbox_by_slug(&self, slug: &str) -> Result<Option<ToolboxEntry>> {
        self.check()?;
        Ok(self.toolbox.iter().find(|t| t.slug == slug).cloned())
    }

    async fn list_levees(&self) -> Result<Vec<LeveeItem>> {
        self.check()?;
        Ok(self.levees.clone())
    }

    async fn levee_by_slug(&self, slug: &str) -> Result<Option<LeveeItem>> {
        self.check()?;
        Ok(self.levees.iter().find(|l| l.slug == slug).cloned())
    }
}

/// Fixture content shared by composer, feed and server tests.
pub mod fixtures {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use vitrine_shared::{
        Author, Category, LeveeItem, Media, PortfolioItem, Post, TeamFields, TeamMember,
        ToolboxEntry, ToolboxProduct,
    };

    use super::InMemorySource;

    /// Reference "now" of the fixture set.
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).single().unwrap_or_default()
    }

    pub fn media(name: &str) -> Media {
        Media {
            source_url: format!("https://cms.example.com/wp-content/uploads/2024/06/{name}.jpg"),
            alt: Some(name.to_string()),
            sizes: BTreeMap::from([(
                "large".to_string(),
                format!("https://cms.example.com/wp-content/uploads/2024/06/{name}-1024x576.jpg"),
            )]),
        }
    }

    pub fn category(id: u64, name: &str, slug: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            count: 0,
            description: None,
        }
    }

    pub fn author() -> Author {
        Author {
            id: 3,
            name: "Jean Dupont".into(),
            slug: "jean-dupont".into(),
            description: "Associé fondateur".into(),
        }
    }

    /// A post published `hours_ago` before [`now`].
    pub fn post(id: u64, slug: &str, hours_ago: i64, category: &Category) -> Post {
        Post {
            id,
            slug: slug.to_string(),
            title: format!("Article {id} &#8211; {slug}"),
            content: format!("<p>{}</p>", "mot ".repeat(450)),
            excerpt: format!("<p>Résumé de l&rsquo;article {id} [&hellip;]</p>"),
            published_at: now() - Duration::hours(hours_ago),
            modified_at: None,
            author: Some(author()),
            category_ids: vec![category.id],
            categories: vec![category.clone()],
            featured_media: (id % 2 == 0).then(|| media(slug)),
        }
    }

    /// A small but complete site: 12 posts over two categories, plus one of
    /// every other content type.
    pub fn source() -> InMemorySource {
        let growth = category(7, "Growth", "growth");
        let funding = category(8, "Financement", "financement");

        let posts = (1..=12)
            .map(|id| {
                let cat = if id % 3 == 0 { &funding } else { &growth };
                post(id, &format!("article-{id}"), id as i64 * 12, cat)
            })
            .collect();

        InMemorySource {
            posts,
            categories: vec![growth, funding, category(9, "Vide", "vide")],
            authors: vec![author()],
            portfolio: vec![PortfolioItem {
                id: 50,
                slug: "refonte-acme".into(),
                title: "Refonte Acme".into(),
                excerpt: "<p>Une refonte complète.</p>".into(),
                published_at: now() - Duration::days(30),
                modified_at: None,
                featured_media: Some(media("acme")),
            }],
            team: vec![TeamMember {
                id: "cG9zdDoxMg==".into(),
                slug: "marie-curie".into(),
                title: "Marie Curie".into(),
                fields: TeamFields {
                    extract: Some("Chercheuse".into()),
                    position: Some("CSO".into()),
                    image: None,
                    extra: serde_json::Map::new(),
                },
                modified_at: None,
            }],
            toolbox: vec![ToolboxEntry {
                slug: "notion".into(),
                title: "Notion".into(),
                published_at: Some(now() - Duration::days(3)),
                modified_at: None,
                product: ToolboxProduct {
                    launch_day: Some("2016-03-01".into()),
                    tagline: Some("All-in-one workspace".into()),
                    website: Some("https://notion.so".into()),
                    extra: serde_json::Map::new(),
                },
                featured_media: None,
            }],
            levees: vec![LeveeItem {
                id: 70,
                slug: "acme-leve-2-millions".into(),
                title: "Acme lève 2 millions".into(),
                excerpt: "<p>Seed.</p>".into(),
                published_at: now() - Duration::days(1),
                modified_at: None,
                featured_media: None,
            }],
            unavailable: false,
        }
    }
}
