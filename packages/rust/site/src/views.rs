//! View-models returned by composers, serialised as JSON for the
//! presentational layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_content::{
    author_of, category_slug, display_title, estimate_reading_time, excerpt_text,
    expertise_slug, format_reading_time, primary_category,
};
use vitrine_shared::{
    Author, Category, Expertise, ExpertiseCategory, LeveeItem, PortfolioItem, Post, TeamMember,
    ToolboxEntry,
};

use crate::context::SiteContext;
use crate::page::{META_DESCRIPTION_CHARS, Pagination};

/// Characters kept in card excerpts.
const CARD_EXCERPT_CHARS: usize = 180;

// ---------------------------------------------------------------------------
// Shared fragments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRef {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub url: String,
}

impl CategoryRef {
    pub fn from_category(category: &Category) -> Self {
        Self {
            id: category.id,
            name: display_title(&category.name),
            slug: category.slug.clone(),
            url: category_path(&category.slug),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRef {
    pub name: String,
    pub slug: String,
    pub url: String,
}

impl AuthorRef {
    pub fn from_author(author: &Author) -> Self {
        Self {
            name: display_title(&author.name),
            slug: author.slug.clone(),
            url: author_path(&author.slug),
        }
    }
}

/// A post in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    pub id: u64,
    pub slug: String,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    pub reading_time: String,
    pub image: String,
    pub image_alt: Option<String>,
    pub category: Option<CategoryRef>,
}

impl PostCard {
    pub fn from_post(ctx: &SiteContext, post: &Post) -> Self {
        Self {
            id: post.id,
            slug: post.slug.clone(),
            url: post_path(&post.slug),
            title: display_title(&post.title),
            excerpt: excerpt_text(&post.excerpt, CARD_EXCERPT_CHARS),
            published_at: post.published_at,
            reading_time: format_reading_time(estimate_reading_time(&post.content)),
            image: ctx.post_image(post),
            image_alt: post.featured_media.as_ref().and_then(|m| m.alt.clone()),
            category: primary_category(post).map(CategoryRef::from_category),
        }
    }
}

pub(crate) fn post_cards(ctx: &SiteContext, posts: &[Post]) -> Vec<PostCard> {
    posts.iter().map(|p| PostCard::from_post(ctx, p)).collect()
}

/// A generic card for portfolio items and levées.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryCard {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    pub image: String,
}

impl EntryCard {
    pub fn from_portfolio(ctx: &SiteContext, item: &PortfolioItem) -> Self {
        Self {
            slug: item.slug.clone(),
            url: format!("/portfolio/{}", item.slug),
            title: display_title(&item.title),
            excerpt: excerpt_text(&item.excerpt, CARD_EXCERPT_CHARS),
            published_at: item.published_at,
            image: ctx.image_url(item.featured_media.as_ref()),
        }
    }

    pub fn from_levee(ctx: &SiteContext, item: &LeveeItem) -> Self {
        Self {
            slug: item.slug.clone(),
            url: format!("/levee/{}", item.slug),
            title: display_title(&item.title),
            excerpt: excerpt_text(&item.excerpt, CARD_EXCERPT_CHARS),
            published_at: item.published_at,
            image: ctx.image_url(item.featured_media.as_ref()),
        }
    }
}

// ---------------------------------------------------------------------------
// Blog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub latest_posts: Vec<PostCard>,
    pub portfolio: Vec<EntryCard>,
    pub levees: Vec<EntryCard>,
    pub expertise: Vec<ExpertiseCategoryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogIndexView {
    pub posts: Vec<PostCard>,
    pub categories: Vec<CategoryRef>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub id: u64,
    pub slug: String,
    pub title: String,
    /// Rendered HTML body as delivered by the CMS.
    pub content_html: String,
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub reading_time_minutes: u32,
    pub reading_time: String,
    pub image: String,
    pub image_alt: Option<String>,
    pub author: Option<AuthorRef>,
    pub category: Option<CategoryRef>,
    pub related: Vec<PostCard>,
    pub latest: Vec<PostCard>,
}

impl PostView {
    pub(crate) fn new(
        ctx: &SiteContext,
        post: &Post,
        related: Vec<PostCard>,
        latest: Vec<PostCard>,
    ) -> Self {
        let minutes = estimate_reading_time(&post.content);
        Self {
            id: post.id,
            slug: post.slug.clone(),
            title: display_title(&post.title),
            content_html: post.content.clone(),
            excerpt: excerpt_text(&post.excerpt, META_DESCRIPTION_CHARS),
            published_at: post.published_at,
            modified_at: post.modified_at,
            reading_time_minutes: minutes,
            reading_time: format_reading_time(minutes),
            image: ctx.post_image(post),
            image_alt: post.featured_media.as_ref().and_then(|m| m.alt.clone()),
            author: author_of(post).map(AuthorRef::from_author),
            category: primary_category(post).map(CategoryRef::from_category),
            related,
            latest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub category: CategoryRef,
    pub description: Option<String>,
    pub posts: Vec<PostCard>,
    pub categories: Vec<CategoryRef>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorView {
    pub author: AuthorRef,
    pub description: String,
    pub posts: Vec<PostCard>,
}

// ---------------------------------------------------------------------------
// Team / portfolio / toolbox / levées
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMemberView {
    pub slug: String,
    pub url: String,
    pub name: String,
    pub position: Option<String>,
    pub bio: Option<String>,
    pub image: String,
    /// Custom fields the site defines beyond the known ones.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TeamMemberView {
    pub fn from_member(ctx: &SiteContext, member: &TeamMember) -> Self {
        Self {
            slug: member.slug.clone(),
            url: format!("/team/{}", member.slug),
            name: display_title(&member.title),
            position: member.fields.position.clone(),
            bio: member.fields.extract.clone(),
            image: ctx.image_url(member.fields.image.as_ref()),
            extra: member.fields.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamListView {
    pub members: Vec<TeamMemberView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioListView {
    pub items: Vec<EntryCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioView {
    pub item: EntryCard,
    pub others: Vec<EntryCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolboxCard {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub tagline: Option<String>,
    pub website: Option<String>,
    pub launch_day: Option<String>,
    pub image: String,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ToolboxCard {
    pub fn from_entry(ctx: &SiteContext, entry: &ToolboxEntry) -> Self {
        Self {
            slug: entry.slug.clone(),
            url: format!("/toolbox/{}", entry.slug),
            title: display_title(&entry.title),
            tagline: entry.product.tagline.clone(),
            website: entry.product.website.clone(),
            launch_day: entry.product.launch_day.clone(),
            image: ctx.image_url(entry.featured_media.as_ref()),
            extra: entry.product.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolboxListView {
    pub entries: Vec<ToolboxCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeveeListView {
    pub items: Vec<EntryCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeveeView {
    pub item: EntryCard,
    pub latest: Vec<EntryCard>,
}

// ---------------------------------------------------------------------------
// Expertise
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpertiseView {
    pub title: String,
    pub slug: String,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpertiseCategoryView {
    pub name: String,
    pub slug: String,
    pub url: String,
    pub expertises: Vec<ExpertiseView>,
}

impl ExpertiseCategoryView {
    pub fn from_category(category: &ExpertiseCategory) -> Self {
        let slug = category_slug(category);
        Self {
            name: category.name.clone(),
            url: format!("/expertise/{slug}"),
            expertises: category
                .expertises
                .iter()
                .map(|e| expertise_view(&slug, e))
                .collect(),
            slug,
        }
    }
}

pub(crate) fn expertise_view(category_slug: &str, expertise: &Expertise) -> ExpertiseView {
    let slug = expertise_slug(expertise);
    ExpertiseView {
        title: expertise.title.clone(),
        url: format!("/expertise/{category_slug}/{slug}"),
        slug,
        description: expertise.description.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpertiseCatalogView {
    pub categories: Vec<ExpertiseCategoryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpertiseDetailView {
    pub category: ExpertiseCategoryView,
    pub expertise: ExpertiseView,
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

pub fn post_path(slug: &str) -> String {
    format!("/blog/{slug}")
}

pub fn category_path(slug: &str) -> String {
    format!("/blog/category/{slug}")
}

pub fn author_path(slug: &str) -> String {
    format!("/author/{slug}")
}
