//! Composer outcomes, route metadata and route-parameter validation.

use serde::Serialize;

use vitrine_content::is_valid_slug;

use crate::context::SiteContext;

/// Maximum length of a meta description.
pub const META_DESCRIPTION_CHARS: usize = 160;

/// Result of composing a route.
///
/// Upstream failures are not an outcome; they travel as `Err(VitrineError)`.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome<T> {
    Found(Page<T>),
    NotFound,
    /// Permanent redirect to a site path.
    Redirect(String),
}

impl<T> PageOutcome<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// The page, if found.
    pub fn found(self) -> Option<Page<T>> {
        match self {
            Self::Found(page) => Some(page),
            _ => None,
        }
    }
}

/// A composed page: view-model plus route metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub meta: RouteMeta,
    pub data: T,
}

/// `<head>` metadata of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMeta {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub open_graph: OpenGraph,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: OgKind,
    pub site_name: String,
    pub locale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OgKind {
    Website,
    Article,
    Profile,
}

impl RouteMeta {
    /// Metadata for `path`. `title` is the page's own title; the site name is
    /// appended for the document title.
    pub fn new(
        ctx: &SiteContext,
        path: &str,
        title: &str,
        description: &str,
        image: Option<String>,
        kind: OgKind,
    ) -> Self {
        let canonical = ctx.absolute(path);
        let full_title = if title.is_empty() || title == ctx.site_name {
            ctx.site_name.clone()
        } else {
            format!("{title} | {}", ctx.site_name)
        };
        let image = image.unwrap_or_else(|| ctx.image_url(None));

        Self {
            title: full_title,
            description: description.to_string(),
            canonical: canonical.clone(),
            open_graph: OpenGraph {
                title: title.to_string(),
                description: description.to_string(),
                image,
                url: canonical,
                kind,
                site_name: ctx.site_name.clone(),
                locale: og_locale(&ctx.language),
            },
        }
    }
}

/// `fr` → `fr_FR`; already-qualified tags pass through with `_`.
fn og_locale(language: &str) -> String {
    match language.split_once(['-', '_']) {
        Some((lang, region)) => format!("{lang}_{}", region.to_uppercase()),
        None => format!("{language}_{}", language.to_uppercase()),
    }
}

// ---------------------------------------------------------------------------
// Route parameters
// ---------------------------------------------------------------------------

/// Parse a page-number route parameter. Only integers ≥ 1 are accepted.
pub fn parse_page(raw: Option<&str>) -> Option<u32> {
    match raw {
        None => Some(1),
        Some(s) => s.parse::<u32>().ok().filter(|&n| n >= 1),
    }
}

/// Whether `page` exists in a collection with `total_pages` pages.
///
/// An empty collection still has a first page.
pub fn page_in_range(page: u32, total_pages: u32) -> bool {
    page >= 1 && page <= total_pages.max(1)
}

/// Validate a slug route parameter.
pub fn checked_slug(raw: &str) -> Option<&str> {
    is_valid_slug(raw).then_some(raw)
}

/// Pagination block of an archive view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Pagination {
    /// `base_path` is the first page's path; later pages live at `<base>/page/<n>`.
    pub fn new(base_path: &str, page: u32, total_pages: u32, total_items: u64) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            page,
            total_pages,
            total_items,
            prev: (page > 1).then(|| page_path(base_path, page - 1)),
            next: (page < total_pages).then(|| page_path(base_path, page + 1)),
        }
    }
}

/// Path of page `n` of an archive rooted at `base_path`.
pub fn page_path(base_path: &str, n: u32) -> String {
    if n <= 1 {
        base_path.to_string()
    } else {
        format!("{}/page/{n}", base_path.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_shared::AppConfig;

    #[test]
    fn page_numbers() {
        assert_eq!(parse_page(None), Some(1));
        assert_eq!(parse_page(Some("3")), Some(3));
        assert_eq!(parse_page(Some("0")), None);
        assert_eq!(parse_page(Some("-1")), None);
        assert_eq!(parse_page(Some("two")), None);
        assert_eq!(parse_page(Some("")), None);
        assert_eq!(parse_page(Some("1.5")), None);
    }

    #[test]
    fn page_range() {
        assert!(page_in_range(1, 0));
        assert!(!page_in_range(2, 0));
        assert!(page_in_range(3, 3));
        assert!(!page_in_range(4, 3));
    }

    #[test]
    fn slugs() {
        assert_eq!(checked_slug("seo-local"), Some("seo-local"));
        assert_eq!(checked_slug(""), None);
        assert_eq!(checked_slug("../etc/passwd"), None);
    }

    #[test]
    fn pagination_links() {
        let p = Pagination::new("/blog", 2, 3, 25);
        assert_eq!(p.prev.as_deref(), Some("/blog"));
        assert_eq!(p.next.as_deref(), Some("/blog/page/3"));

        let last = Pagination::new("/blog", 3, 3, 25);
        assert!(last.next.is_none());

        let empty = Pagination::new("/blog", 1, 0, 0);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.prev.is_none() && empty.next.is_none());
    }

    #[test]
    fn meta_appends_site_name() {
        let ctx = SiteContext::from_config(&AppConfig::default(), Vec::new()).unwrap();
        let meta = RouteMeta::new(&ctx, "/blog", "Blog", "Articles", None, OgKind::Website);
        assert_eq!(meta.title, "Blog | Vitrine");
        assert_eq!(meta.canonical, "https://www.example.com/blog");
        assert_eq!(meta.open_graph.url, meta.canonical);
        assert_eq!(meta.open_graph.locale, "fr_FR");
        assert!(meta.open_graph.image.ends_with("/images/placeholder.jpg"));

        let home = RouteMeta::new(&ctx, "/", "", "", None, OgKind::Website);
        assert_eq!(home.title, "Vitrine");
    }

    #[test]
    fn og_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OgKind::Article).unwrap(), "\"article\"");
    }
}
