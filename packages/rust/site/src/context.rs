//! Per-site rendering context passed explicitly to every composer.

use vitrine_content::{
    CdnRewriter, SlugRedirects, featured_image, resolve_image_url, rewrite_for_cdn,
};
use vitrine_feeds::Publication;
use vitrine_shared::{AppConfig, ExpertiseCategory, Media, Post, Result};

/// Immutable settings shared by composers and feed composers.
#[derive(Debug, Clone)]
pub struct SiteContext {
    /// Public origin, without a trailing slash.
    pub base_url: String,
    pub site_name: String,
    pub language: String,
    pub placeholder_image: String,
    pub posts_per_page: u32,
    pub static_pages: Vec<String>,
    pub cdn: Option<CdnRewriter>,
    pub author_redirects: SlugRedirects,
    pub catalog: Vec<ExpertiseCategory>,
}

impl SiteContext {
    /// Build the context from config and an already-loaded expertise catalogue.
    pub fn from_config(config: &AppConfig, catalog: Vec<ExpertiseCategory>) -> Result<Self> {
        let cdn = CdnRewriter::from_config(&config.cdn, &config.cms.base_url)?;
        Ok(Self {
            base_url: config.site.base_url.trim_end_matches('/').to_string(),
            site_name: config.site.name.clone(),
            language: config.site.language.clone(),
            placeholder_image: config.site.placeholder_image.clone(),
            posts_per_page: config.site.posts_per_page.max(1),
            static_pages: config.site.static_pages.clone(),
            cdn,
            author_redirects: SlugRedirects::new(config.redirects.authors.clone()),
            catalog,
        })
    }

    /// Absolute URL of a site path (`/blog` → `https://www.example.com/blog`).
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.is_empty() || path == "/" {
            return format!("{}/", self.base_url);
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Display URL of an image: best rendition, CDN-rewritten, absolute.
    pub fn image_url(&self, media: Option<&Media>) -> String {
        let url = resolve_image_url(media, &self.placeholder_image);
        self.absolute(&rewrite_for_cdn(&url, self.cdn.as_ref()))
    }

    /// Display URL of a post's featured image.
    pub fn post_image(&self, post: &Post) -> String {
        let url = featured_image(post, &self.placeholder_image);
        self.absolute(&rewrite_for_cdn(&url, self.cdn.as_ref()))
    }

    /// Image URL only when the record actually has one.
    pub fn optional_image_url(&self, media: Option<&Media>) -> Option<String> {
        media.map(|m| self.image_url(Some(m)))
    }

    pub fn publication(&self) -> Publication {
        Publication {
            name: self.site_name.clone(),
            language: self.language.clone(),
        }
    }
}
