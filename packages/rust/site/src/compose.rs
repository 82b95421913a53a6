//! Route composers: validate route parameters, fetch, transform, and return
//! a [`PageOutcome`].
//!
//! A composer's primary record decides the outcome: missing → `NotFound`,
//! upstream failure → `Err`. Secondary data (related posts, sidebars) is
//! fetched concurrently and degrades to empty on failure.

use tracing::{debug, instrument, warn};

use vitrine_cms::{ContentSource, PostQuery};
use vitrine_content::{category_slug, display_title, excerpt_text, expertise_slug, primary_category};
use vitrine_shared::{Category, Paged, Post, Result};

use crate::context::SiteContext;
use crate::page::{
    META_DESCRIPTION_CHARS, OgKind, Page, PageOutcome, Pagination, RouteMeta, checked_slug,
    page_in_range, page_path, parse_page,
};
use crate::views::{
    AuthorRef, AuthorView, BlogIndexView, CategoryRef, CategoryView, EntryCard,
    ExpertiseCatalogView, ExpertiseCategoryView, ExpertiseDetailView, HomeView, LeveeListView,
    LeveeView, PortfolioListView, PortfolioView, PostView, TeamListView, TeamMemberView,
    ToolboxCard, ToolboxListView, author_path, category_path, expertise_view, post_cards,
    post_path,
};

const HOME_POSTS: u32 = 3;
const HOME_PORTFOLIO: usize = 6;
const HOME_LEVEES: usize = 4;
const RELATED_POSTS: u32 = 3;
const LATEST_POSTS: u32 = 3;
const LATEST_LEVEES: usize = 3;
const OTHER_PORTFOLIO: usize = 3;

/// Log a failed secondary fetch and fall back to `T::default()`.
fn degrade<T: Default>(what: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!(what, error = %e, "secondary fetch failed, using empty fallback");
        T::default()
    })
}

/// Map a listing page past the end to `None`.
fn listing_page(result: Result<Paged<Post>>) -> Result<Option<Paged<Post>>> {
    match result {
        Ok(paged) => Ok(Some(paged)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

#[instrument(skip_all)]
pub async fn home(source: &dyn ContentSource, ctx: &SiteContext) -> Result<PageOutcome<HomeView>> {
    let latest_query = PostQuery::page(1, HOME_POSTS);
    let (posts, portfolio, levees) = tokio::join!(
        source.list_posts(&latest_query),
        source.list_portfolio(),
        source.list_levees(),
    );

    let posts = degrade("latest posts", posts.map(|p| p.items));
    let mut portfolio = degrade("portfolio", portfolio);
    let mut levees = degrade("levees", levees);
    portfolio.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    levees.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let data = HomeView {
        latest_posts: post_cards(ctx, &posts),
        portfolio: portfolio
            .iter()
            .take(HOME_PORTFOLIO)
            .map(|p| EntryCard::from_portfolio(ctx, p))
            .collect(),
        levees: levees
            .iter()
            .take(HOME_LEVEES)
            .map(|l| EntryCard::from_levee(ctx, l))
            .collect(),
        expertise: ctx
            .catalog
            .iter()
            .map(ExpertiseCategoryView::from_category)
            .collect(),
    };
    let meta = RouteMeta::new(ctx, "/", "", &ctx.site_name, None, OgKind::Website);
    Ok(PageOutcome::Found(Page { meta, data }))
}

// ---------------------------------------------------------------------------
// Blog
// ---------------------------------------------------------------------------

/// `/blog` and `/blog/page/{n}`.
#[instrument(skip_all, fields(page = page))]
pub async fn blog_index(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    page: Option<&str>,
) -> Result<PageOutcome<BlogIndexView>> {
    let Some(page) = parse_page(page) else {
        return Ok(PageOutcome::NotFound);
    };

    let query = PostQuery::page(page, ctx.posts_per_page);
    let (posts, categories) = tokio::join!(source.list_posts(&query), source.list_categories());

    let Some(posts) = listing_page(posts)? else {
        return Ok(PageOutcome::NotFound);
    };
    if !page_in_range(page, posts.total_pages) {
        debug!(page, total_pages = posts.total_pages, "blog page out of range");
        return Ok(PageOutcome::NotFound);
    }

    let path = page_path("/blog", page);
    let title = paged_title("Blog", page);
    let meta = RouteMeta::new(ctx, &path, &title, "Articles et analyses", None, OgKind::Website);
    let data = BlogIndexView {
        posts: post_cards(ctx, &posts.items),
        categories: listed_categories(degrade("categories", categories)),
        pagination: Pagination::new("/blog", page, posts.total_pages, posts.total),
    };
    Ok(PageOutcome::Found(Page { meta, data }))
}

/// `/blog/{slug}`, with related posts from the same category and the latest
/// posts fetched concurrently.
#[instrument(skip_all, fields(slug = slug))]
pub async fn blog_post(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    slug: &str,
) -> Result<PageOutcome<PostView>> {
    let Some(slug) = checked_slug(slug) else {
        return Ok(PageOutcome::NotFound);
    };
    let Some(post) = source.post_by_slug(slug).await? else {
        return Ok(PageOutcome::NotFound);
    };

    let related_query = primary_category(&post).map(|category| PostQuery {
        per_page: RELATED_POSTS,
        category: Some(category.id),
        exclude: vec![post.id],
        ..PostQuery::default()
    });
    let latest_query = PostQuery {
        per_page: LATEST_POSTS,
        exclude: vec![post.id],
        ..PostQuery::default()
    };

    let related = async {
        match &related_query {
            Some(query) => source.list_posts(query).await.map(|p| p.items),
            None => Ok(Vec::new()),
        }
    };
    let (related, latest) = tokio::join!(related, source.list_posts(&latest_query));

    let related = post_cards(ctx, &degrade("related posts", related));
    let latest = post_cards(ctx, &degrade("latest posts", latest.map(|p| p.items)));

    let view = PostView::new(ctx, &post, related, latest);
    let meta = RouteMeta::new(
        ctx,
        &post_path(&post.slug),
        &view.title,
        &excerpt_text(&post.excerpt, META_DESCRIPTION_CHARS),
        ctx.optional_image_url(post.featured_media.as_ref()),
        OgKind::Article,
    );
    Ok(PageOutcome::Found(Page { meta, data: view }))
}

/// `/blog/category/{slug}` and `/blog/category/{slug}/page/{n}`.
#[instrument(skip_all, fields(slug = slug, page = page))]
pub async fn category_archive(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    slug: &str,
    page: Option<&str>,
) -> Result<PageOutcome<CategoryView>> {
    let (Some(slug), Some(page)) = (checked_slug(slug), parse_page(page)) else {
        return Ok(PageOutcome::NotFound);
    };
    let Some(category) = source.category_by_slug(slug).await? else {
        return Ok(PageOutcome::NotFound);
    };

    let query = PostQuery {
        page,
        per_page: ctx.posts_per_page,
        category: Some(category.id),
        ..PostQuery::default()
    };
    let (posts, categories) = tokio::join!(source.list_posts(&query), source.list_categories());

    let Some(posts) = listing_page(posts)? else {
        return Ok(PageOutcome::NotFound);
    };
    if !page_in_range(page, posts.total_pages) {
        return Ok(PageOutcome::NotFound);
    }

    let base = category_path(&category.slug);
    let name = display_title(&category.name);
    let description = category
        .description
        .as_deref()
        .map(|d| excerpt_text(d, META_DESCRIPTION_CHARS))
        .filter(|d| !d.is_empty());
    let meta = RouteMeta::new(
        ctx,
        &page_path(&base, page),
        &paged_title(&name, page),
        description.as_deref().unwrap_or(&name),
        None,
        OgKind::Website,
    );
    let data = CategoryView {
        category: CategoryRef::from_category(&category),
        description,
        posts: post_cards(ctx, &posts.items),
        categories: listed_categories(degrade("categories", categories)),
        pagination: Pagination::new(&base, page, posts.total_pages, posts.total),
    };
    Ok(PageOutcome::Found(Page { meta, data }))
}

/// `/author/{slug}`; legacy slugs redirect to their canonical author page.
#[instrument(skip_all, fields(slug = slug))]
pub async fn author(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    slug: &str,
) -> Result<PageOutcome<AuthorView>> {
    let Some(slug) = checked_slug(slug) else {
        return Ok(PageOutcome::NotFound);
    };
    if let Some(canonical) = ctx.author_redirects.resolve(slug) {
        debug!(from = slug, to = canonical, "legacy author slug");
        return Ok(PageOutcome::Redirect(author_path(canonical)));
    }
    let Some(author) = source.author_by_slug(slug).await? else {
        return Ok(PageOutcome::NotFound);
    };

    let query = PostQuery {
        per_page: ctx.posts_per_page,
        author: Some(author.id),
        ..PostQuery::default()
    };
    let posts = degrade(
        "author posts",
        source.list_posts(&query).await.map(|p| p.items),
    );

    let author_ref = AuthorRef::from_author(&author);
    let description = excerpt_text(&author.description, META_DESCRIPTION_CHARS);
    let meta = RouteMeta::new(
        ctx,
        &author_ref.url,
        &author_ref.name,
        if description.is_empty() { &author_ref.name } else { &description },
        None,
        OgKind::Profile,
    );
    let data = AuthorView {
        author: author_ref,
        description: author.description.clone(),
        posts: post_cards(ctx, &posts),
    };
    Ok(PageOutcome::Found(Page { meta, data }))
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[instrument(skip_all)]
pub async fn team_list(
    source: &dyn ContentSource,
    ctx: &SiteContext,
) -> Result<PageOutcome<TeamListView>> {
    let members = source.list_team().await?;
    let data = TeamListView {
        members: members
            .iter()
            .map(|m| TeamMemberView::from_member(ctx, m))
            .collect(),
    };
    let meta = RouteMeta::new(ctx, "/team", "L'équipe", "L'équipe", None, OgKind::Website);
    Ok(PageOutcome::Found(Page { meta, data }))
}

#[instrument(skip_all, fields(slug = slug))]
pub async fn team_member(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    slug: &str,
) -> Result<PageOutcome<TeamMemberView>> {
    let Some(slug) = checked_slug(slug) else {
        return Ok(PageOutcome::NotFound);
    };
    let Some(member) = source.team_member_by_slug(slug).await? else {
        return Ok(PageOutcome::NotFound);
    };

    let data = TeamMemberView::from_member(ctx, &member);
    let description = data
        .bio
        .as_deref()
        .map(|b| excerpt_text(b, META_DESCRIPTION_CHARS))
        .or_else(|| data.position.clone())
        .unwrap_or_else(|| data.name.clone());
    let meta = RouteMeta::new(
        ctx,
        &data.url,
        &data.name,
        &description,
        ctx.optional_image_url(member.fields.image.as_ref()),
        OgKind::Profile,
    );
    Ok(PageOutcome::Found(Page { meta, data }))
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[instrument(skip_all)]
pub async fn portfolio_list(
    source: &dyn ContentSource,
    ctx: &SiteContext,
) -> Result<PageOutcome<PortfolioListView>> {
    let mut items = source.list_portfolio().await?;
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    let data = PortfolioListView {
        items: items
            .iter()
            .map(|p| EntryCard::from_portfolio(ctx, p))
            .collect(),
    };
    let meta = RouteMeta::new(
        ctx,
        "/portfolio",
        "Portfolio",
        "Nos réalisations",
        None,
        OgKind::Website,
    );
    Ok(PageOutcome::Found(Page { meta, data }))
}

#[instrument(skip_all, fields(slug = slug))]
pub async fn portfolio_item(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    slug: &str,
) -> Result<PageOutcome<PortfolioView>> {
    let Some(slug) = checked_slug(slug) else {
        return Ok(PageOutcome::NotFound);
    };
    let (item, all) = tokio::join!(source.portfolio_by_slug(slug), source.list_portfolio());
    let Some(item) = item? else {
        return Ok(PageOutcome::NotFound);
    };

    let mut others = degrade("portfolio", all);
    others.retain(|p| p.slug != item.slug);
    others.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let card = EntryCard::from_portfolio(ctx, &item);
    let meta = RouteMeta::new(
        ctx,
        &card.url,
        &card.title,
        &excerpt_text(&item.excerpt, META_DESCRIPTION_CHARS),
        ctx.optional_image_url(item.featured_media.as_ref()),
        OgKind::Article,
    );
    let data = PortfolioView {
        item: card,
        others: others
            .iter()
            .take(OTHER_PORTFOLIO)
            .map(|p| EntryCard::from_portfolio(ctx, p))
            .collect(),
    };
    Ok(PageOutcome::Found(Page { meta, data }))
}

// ---------------------------------------------------------------------------
// Toolbox
// ---------------------------------------------------------------------------

#[instrument(skip_all)]
pub async fn toolbox_list(
    source: &dyn ContentSource,
    ctx: &SiteContext,
) -> Result<PageOutcome<ToolboxListView>> {
    let entries = source.list_toolbox().await?;
    let data = ToolboxListView {
        entries: entries
            .iter()
            .map(|e| ToolboxCard::from_entry(ctx, e))
            .collect(),
    };
    let meta = RouteMeta::new(
        ctx,
        "/toolbox",
        "Toolbox",
        "Les outils des startups",
        None,
        OgKind::Website,
    );
    Ok(PageOutcome::Found(Page { meta, data }))
}

#[instrument(skip_all, fields(slug = slug))]
pub async fn toolbox_entry(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    slug: &str,
) -> Result<PageOutcome<ToolboxCard>> {
    let Some(slug) = checked_slug(slug) else {
        return Ok(PageOutcome::NotFound);
    };
    let Some(entry) = source.toolbox_by_slug(slug).await? else {
        return Ok(PageOutcome::NotFound);
    };

    let data = ToolboxCard::from_entry(ctx, &entry);
    let description = data.tagline.clone().unwrap_or_else(|| data.title.clone());
    let meta = RouteMeta::new(
        ctx,
        &data.url,
        &data.title,
        &description,
        ctx.optional_image_url(entry.featured_media.as_ref()),
        OgKind::Website,
    );
    Ok(PageOutcome::Found(Page { meta, data }))
}

// ---------------------------------------------------------------------------
// Levées
// ---------------------------------------------------------------------------

#[instrument(skip_all)]
pub async fn levee_list(
    source: &dyn ContentSource,
    ctx: &SiteContext,
) -> Result<PageOutcome<LeveeListView>> {
    let mut items = source.list_levees().await?;
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    let data = LeveeListView {
        items: items.iter().map(|l| EntryCard::from_levee(ctx, l)).collect(),
    };
    let meta = RouteMeta::new(
        ctx,
        "/levee",
        "Levées de fonds",
        "Les dernières levées de fonds",
        None,
        OgKind::Website,
    );
    Ok(PageOutcome::Found(Page { meta, data }))
}

#[instrument(skip_all, fields(slug = slug))]
pub async fn levee_item(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    slug: &str,
) -> Result<PageOutcome<LeveeView>> {
    let Some(slug) = checked_slug(slug) else {
        return Ok(PageOutcome::NotFound);
    };
    let (item, all) = tokio::join!(source.levee_by_slug(slug), source.list_levees());
    let Some(item) = item? else {
        return Ok(PageOutcome::NotFound);
    };

    let mut latest = degrade("levees", all);
    latest.retain(|l| l.slug != item.slug);
    latest.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let card = EntryCard::from_levee(ctx, &item);
    let meta = RouteMeta::new(
        ctx,
        &card.url,
        &card.title,
        &excerpt_text(&item.excerpt, META_DESCRIPTION_CHARS),
        ctx.optional_image_url(item.featured_media.as_ref()),
        OgKind::Article,
    );
    let data = LeveeView {
        item: card,
        latest: latest
            .iter()
            .take(LATEST_LEVEES)
            .map(|l| EntryCard::from_levee(ctx, l))
            .collect(),
    };
    Ok(PageOutcome::Found(Page { meta, data }))
}

// ---------------------------------------------------------------------------
// Expertise (static catalogue, no CMS round-trip)
// ---------------------------------------------------------------------------

pub fn expertise_catalog(ctx: &SiteContext) -> PageOutcome<ExpertiseCatalogView> {
    let data = ExpertiseCatalogView {
        categories: ctx
            .catalog
            .iter()
            .map(ExpertiseCategoryView::from_category)
            .collect(),
    };
    let meta = RouteMeta::new(
        ctx,
        "/expertise",
        "Expertises",
        "Nos expertises",
        None,
        OgKind::Website,
    );
    PageOutcome::Found(Page { meta, data })
}

/// `/expertise/{category}`.
pub fn expertise_category(ctx: &SiteContext, category: &str) -> PageOutcome<ExpertiseCategoryView> {
    let Some(category) = checked_slug(category)
        .and_then(|slug| ctx.catalog.iter().find(|c| category_slug(c) == slug))
    else {
        return PageOutcome::NotFound;
    };

    let data = ExpertiseCategoryView::from_category(category);
    let meta = RouteMeta::new(ctx, &data.url, &data.name, &data.name, None, OgKind::Website);
    PageOutcome::Found(Page { meta, data })
}

/// `/expertise/{category}/{expertise}`.
pub fn expertise_detail(
    ctx: &SiteContext,
    category: &str,
    expertise: &str,
) -> PageOutcome<ExpertiseDetailView> {
    let (Some(category), Some(expertise)) = (checked_slug(category), checked_slug(expertise)) else {
        return PageOutcome::NotFound;
    };
    let Some(cat) = ctx.catalog.iter().find(|c| category_slug(c) == category) else {
        return PageOutcome::NotFound;
    };
    let Some(exp) = cat.expertises.iter().find(|e| expertise_slug(e) == expertise) else {
        return PageOutcome::NotFound;
    };

    let view = expertise_view(category, exp);
    let description = exp
        .description
        .clone()
        .unwrap_or_else(|| format!("{} - {}", cat.name, exp.title));
    let meta = RouteMeta::new(ctx, &view.url, &view.title, &description, None, OgKind::Website);
    PageOutcome::Found(Page {
        meta,
        data: ExpertiseDetailView {
            category: ExpertiseCategoryView::from_category(cat),
            expertise: view,
        },
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn paged_title(title: &str, page: u32) -> String {
    if page > 1 {
        format!("{title} - page {page}")
    } else {
        title.to_string()
    }
}

/// Sidebar categories, without WordPress's default bucket.
fn listed_categories(categories: Vec<Category>) -> Vec<CategoryRef> {
    categories
        .iter()
        .filter(|c| !matches!(c.slug.as_str(), "non-classe" | "uncategorized"))
        .map(CategoryRef::from_category)
        .collect()
}
