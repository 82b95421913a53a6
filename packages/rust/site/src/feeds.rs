//! Feed composers: fetch the collections a feed needs and serialise it.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument};

use vitrine_cms::{ContentSource, PostQuery};
use vitrine_content::{category_slug, display_title, expertise_slug};
use vitrine_feeds::export::{CAMPAIGNS_FILE_NAME, KEYWORDS_FILE_NAME};
use vitrine_feeds::sitemap::{DISCOVER_MAX_ENTRIES, NEWS_WINDOW_HOURS};
use vitrine_feeds::{
    DiscoverEntry, NewsEntry, UrlEntry, UrlKind, UrlSet, campaigns_csv, keywords_tsv,
    render_discover, render_index, render_news, sitemap_file_name,
};
use vitrine_shared::{Result, VitrineError};

use crate::context::SiteContext;
use crate::views::{category_path, post_path};

/// Every feed the site publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Index,
    Static,
    Blog,
    Expertise,
    Levee,
    Toolbox,
    Team,
    Portfolio,
    News,
    Discover,
    Campaigns,
    Keywords,
}

impl FeedKind {
    pub const ALL: [FeedKind; 12] = [
        Self::Index,
        Self::Static,
        Self::Blog,
        Self::Expertise,
        Self::Levee,
        Self::Toolbox,
        Self::Team,
        Self::Portfolio,
        Self::News,
        Self::Discover,
        Self::Campaigns,
        Self::Keywords,
    ];

    /// Short name used on the command line (`vitrine feed blog`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Static => "static",
            Self::Blog => "blog",
            Self::Expertise => "expertise",
            Self::Levee => "levee",
            Self::Toolbox => "toolbox",
            Self::Team => "team",
            Self::Portfolio => "portfolio",
            Self::News => "news",
            Self::Discover => "discover",
            Self::Campaigns => "campaigns",
            Self::Keywords => "keywords",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|k| k.name()).collect();
                VitrineError::validation(format!(
                    "unknown feed '{name}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }

    /// Output file name.
    pub fn file_name(self) -> String {
        match self {
            Self::Index => "sitemap.xml".to_string(),
            Self::Campaigns => CAMPAIGNS_FILE_NAME.to_string(),
            Self::Keywords => KEYWORDS_FILE_NAME.to_string(),
            other => sitemap_file_name(other.name()),
        }
    }

    pub fn is_export(self) -> bool {
        matches!(self, Self::Campaigns | Self::Keywords)
    }

    pub fn content_type(self) -> &'static str {
        if self.is_export() {
            "text/csv; charset=utf-8"
        } else {
            "application/xml; charset=utf-8"
        }
    }

    pub fn cache_control(self) -> &'static str {
        match self {
            Self::News => "public, max-age=1800, stale-while-revalidate=86400",
            _ => "public, max-age=3600, stale-while-revalidate=86400",
        }
    }
}

/// Fetch what `kind` needs and serialise it.
#[instrument(skip_all, fields(feed = kind.name()))]
pub async fn compose_feed(
    kind: FeedKind,
    source: &dyn ContentSource,
    ctx: &SiteContext,
    now: DateTime<Utc>,
) -> Result<String> {
    let body = match kind {
        FeedKind::Index => render_index(&ctx.base_url, now),
        FeedKind::Static => static_sitemap(ctx, now).render(),
        FeedKind::Expertise => expertise_sitemap(ctx, now).render(),
        FeedKind::Blog => blog_sitemap(source, ctx, now).await?.render(),
        FeedKind::Levee => levee_sitemap(source, ctx).await?.render(),
        FeedKind::Toolbox => toolbox_sitemap(source, ctx, now).await?.render(),
        FeedKind::Team => team_sitemap(source, ctx, now).await?.render(),
        FeedKind::Portfolio => portfolio_sitemap(source, ctx).await?.render(),
        FeedKind::News => news_sitemap(source, ctx, now).await?,
        FeedKind::Discover => discover_sitemap(source, ctx).await?,
        FeedKind::Campaigns => campaigns_csv(&ctx.catalog, &ctx.base_url),
        FeedKind::Keywords => keywords_tsv(&ctx.catalog, &ctx.base_url),
    };
    info!(bytes = body.len(), "feed composed");
    Ok(body)
}

// ---------------------------------------------------------------------------
// URL sets
// ---------------------------------------------------------------------------

fn static_sitemap(ctx: &SiteContext, now: DateTime<Utc>) -> UrlSet {
    ctx.static_pages
        .iter()
        .map(|path| {
            let kind = if path == "/" { UrlKind::Home } else { UrlKind::StaticPage };
            UrlEntry::new(ctx.absolute(path), now, kind)
        })
        .collect()
}

fn expertise_sitemap(ctx: &SiteContext, now: DateTime<Utc>) -> UrlSet {
    let mut set = UrlSet::new();
    for category in &ctx.catalog {
        let cat_slug = category_slug(category);
        set.push(UrlEntry::new(
            ctx.absolute(&format!("/expertise/{cat_slug}")),
            now,
            UrlKind::Expertise,
        ));
        for expertise in &category.expertises {
            set.push(UrlEntry::new(
                ctx.absolute(&format!("/expertise/{cat_slug}/{}", expertise_slug(expertise))),
                now,
                UrlKind::Expertise,
            ));
        }
    }
    set
}

/// Posts plus category archives; both collections are fetched concurrently.
async fn blog_sitemap(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    now: DateTime<Utc>,
) -> Result<UrlSet> {
    let (posts, categories) = tokio::try_join!(source.all_posts(), source.list_categories())?;

    let mut set: UrlSet = posts
        .iter()
        .map(|p| {
            UrlEntry::new(ctx.absolute(&post_path(&p.slug)), p.last_modified(), UrlKind::BlogPost)
        })
        .collect();
    for category in categories.iter().filter(|c| c.count > 0) {
        set.push(UrlEntry::new(
            ctx.absolute(&category_path(&category.slug)),
            now,
            UrlKind::BlogCategory,
        ));
    }
    Ok(set)
}

async fn levee_sitemap(source: &dyn ContentSource, ctx: &SiteContext) -> Result<UrlSet> {
    let levees = source.list_levees().await?;
    Ok(levees
        .iter()
        .map(|l| {
            UrlEntry::new(
                ctx.absolute(&format!("/levee/{}", l.slug)),
                l.modified_at.unwrap_or(l.published_at),
                UrlKind::Levee,
            )
        })
        .collect())
}

async fn toolbox_sitemap(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    now: DateTime<Utc>,
) -> Result<UrlSet> {
    let entries = source.list_toolbox().await?;
    Ok(entries
        .iter()
        .map(|t| {
            UrlEntry::new(
                ctx.absolute(&format!("/toolbox/{}", t.slug)),
                t.modified_at.or(t.published_at).unwrap_or(now),
                UrlKind::Toolbox,
            )
        })
        .collect())
}

async fn team_sitemap(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    now: DateTime<Utc>,
) -> Result<UrlSet> {
    let members = source.list_team().await?;
    Ok(members
        .iter()
        .map(|m| {
            UrlEntry::new(
                ctx.absolute(&format!("/team/{}", m.slug)),
                m.modified_at.unwrap_or(now),
                UrlKind::TeamMember,
            )
        })
        .collect())
}

async fn portfolio_sitemap(source: &dyn ContentSource, ctx: &SiteContext) -> Result<UrlSet> {
    let items = source.list_portfolio().await?;
    Ok(items
        .iter()
        .map(|p| {
            UrlEntry::new(
                ctx.absolute(&format!("/portfolio/{}", p.slug)),
                p.modified_at.unwrap_or(p.published_at),
                UrlKind::Portfolio,
            )
        })
        .collect())
}

// ---------------------------------------------------------------------------
// News / Discover
// ---------------------------------------------------------------------------

async fn news_sitemap(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    now: DateTime<Utc>,
) -> Result<String> {
    let since = now - Duration::hours(NEWS_WINDOW_HOURS);
    let posts = source.recent_posts(since).await?;
    let entries = posts
        .iter()
        .map(|p| NewsEntry {
            loc: ctx.absolute(&post_path(&p.slug)),
            title: display_title(&p.title),
            published_at: p.published_at,
        })
        .collect();
    Ok(render_news(entries, now, &ctx.publication()))
}

async fn discover_sitemap(source: &dyn ContentSource, ctx: &SiteContext) -> Result<String> {
    let latest = source
        .list_posts(&PostQuery::page(1, DISCOVER_MAX_ENTRIES as u32))
        .await?;
    let entries = latest
        .items
        .iter()
        .map(|p| DiscoverEntry {
            loc: ctx.absolute(&post_path(&p.slug)),
            title: display_title(&p.title),
            published_at: p.published_at,
            lastmod: p.last_modified(),
            image: ctx.optional_image_url(p.featured_media.as_ref()),
        })
        .collect();
    Ok(render_discover(entries))
}
