//! Wire formats of the WordPress REST and WPGraphQL APIs, and their mapping
//! onto the domain types in `vitrine-shared`.
//!
//! Every field is defaulted: WordPress embeds error objects in place of
//! records it cannot expose (e.g. a private author), and those must degrade
//! to "absent" rather than fail the whole response.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use vitrine_shared::{
    Author, Category, LeveeItem, Media, PortfolioItem, Post, Result, TeamFields, TeamMember,
    ToolboxEntry, ToolboxProduct, VitrineError,
};

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a WordPress timestamp.
///
/// `*_gmt` fields come without an offset (`2024-05-01T08:30:00`); GraphQL and
/// some plugins send RFC 3339.
pub(crate) fn parse_wp_date(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| VitrineError::parse(format!("invalid date '{s}': {e}")))
}

fn parse_optional_date(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.filter(|s| !s.is_empty()).and_then(|s| parse_wp_date(s).ok())
}

// ---------------------------------------------------------------------------
// REST
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpUser {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl WpUser {
    pub(crate) fn into_author(self) -> Option<Author> {
        (self.id != 0 && !self.slug.is_empty()).then(|| Author {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpTerm {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub taxonomy: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub description: String,
}

impl WpTerm {
    pub(crate) fn into_category(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            slug: self.slug,
            count: self.count,
            description: Some(self.description).filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpSize {
    #[serde(default)]
    pub source_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpMediaDetails {
    #[serde(default)]
    pub sizes: BTreeMap<String, WpSize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpMedia {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub media_details: Option<WpMediaDetails>,
}

impl WpMedia {
    fn into_media(self) -> Option<Media> {
        if self.source_url.is_empty() {
            return None;
        }
        let sizes = self
            .media_details
            .map(|d| {
                d.sizes
                    .into_iter()
                    .filter(|(_, s)| !s.source_url.is_empty())
                    .map(|(name, s)| (name, s.source_url))
                    .collect()
            })
            .unwrap_or_default();
        Some(Media {
            source_url: self.source_url,
            alt: Some(self.alt_text).filter(|a| !a.is_empty()),
            sizes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpEmbedded {
    #[serde(default)]
    pub author: Vec<WpUser>,
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<WpMedia>,
    #[serde(rename = "wp:term", default)]
    pub terms: Vec<Vec<WpTerm>>,
}

/// A post-shaped REST record (`post`, `portfolio`, `levee` share this layout).
#[derive(Debug, Deserialize)]
pub(crate) struct WpPost {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub modified_gmt: Option<String>,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(rename = "_embedded", default)]
    pub embedded: WpEmbedded,
}

impl WpPost {
    fn published_at(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .date_gmt
            .as_deref()
            .or(self.date.as_deref())
            .ok_or_else(|| VitrineError::parse(format!("record '{}' has no date", self.slug)))?;
        parse_wp_date(raw)
    }

    fn take_media(&mut self) -> Option<Media> {
        std::mem::take(&mut self.embedded.featured_media)
            .into_iter()
            .next()
            .and_then(WpMedia::into_media)
    }

    pub(crate) fn into_post(mut self) -> Result<Post> {
        let published_at = self.published_at()?;
        let modified_at = parse_optional_date(self.modified_gmt.as_deref());
        let featured_media = self.take_media();
        let author = std::mem::take(&mut self.embedded.author)
            .into_iter()
            .next()
            .and_then(WpUser::into_author);
        let categories = std::mem::take(&mut self.embedded.terms)
            .into_iter()
            .flatten()
            .filter(|t| t.taxonomy == "category")
            .map(WpTerm::into_category)
            .collect();

        Ok(Post {
            id: self.id,
            slug: self.slug,
            title: self.title.rendered,
            content: self.content.rendered,
            excerpt: self.excerpt.rendered,
            published_at,
            modified_at,
            author,
            category_ids: self.categories,
            categories,
            featured_media,
        })
    }

    pub(crate) fn into_portfolio(mut self) -> Result<PortfolioItem> {
        let published_at = self.published_at()?;
        Ok(PortfolioItem {
            id: self.id,
            modified_at: parse_optional_date(self.modified_gmt.as_deref()),
            featured_media: self.take_media(),
            slug: self.slug,
            title: self.title.rendered,
            excerpt: self.excerpt.rendered,
            published_at,
        })
    }

    pub(crate) fn into_levee(mut self) -> Result<LeveeItem> {
        let published_at = self.published_at()?;
        Ok(LeveeItem {
            id: self.id,
            modified_at: parse_optional_date(self.modified_gmt.as_deref()),
            featured_media: self.take_media(),
            slug: self.slug,
            title: self.title.rendered,
            excerpt: self.excerpt.rendered,
            published_at,
        })
    }
}

/// REST error body (`{"code": "...", "message": "..."}`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GqlImage {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub alt_text: String,
}

impl GqlImage {
    fn into_media(self) -> Option<Media> {
        (!self.source_url.is_empty()).then(|| Media {
            source_url: self.source_url,
            alt: Some(self.alt_text).filter(|a| !a.is_empty()),
            sizes: BTreeMap::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GqlImageEdge {
    pub node: Option<GqlImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GqlTeamMember {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub modified_gmt: Option<String>,
    /// Custom-field group; shape depends on the site's field definitions.
    #[serde(default)]
    pub team_fields: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GqlTeamMember {
    pub(crate) fn into_member(self) -> TeamMember {
        let mut extra = self.team_fields.unwrap_or_default();
        let extract = take_string(&mut extra, "extract");
        let position = take_string(&mut extra, "position");
        let image = extra
            .remove("image")
            .and_then(|v| serde_json::from_value::<GqlImage>(v).ok())
            .and_then(GqlImage::into_media);

        TeamMember {
            id: self.id,
            slug: self.slug,
            title: self.title,
            fields: TeamFields {
                extract,
                position,
                image,
                extra,
            },
            modified_at: parse_optional_date(self.modified_gmt.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GqlToolbox {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub modified_gmt: Option<String>,
    #[serde(default)]
    pub product_fields: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub featured_image: Option<GqlImageEdge>,
}

impl GqlToolbox {
    pub(crate) fn into_entry(self) -> ToolboxEntry {
        let mut extra = self.product_fields.unwrap_or_default();
        let product = ToolboxProduct {
            launch_day: take_string(&mut extra, "launchDay"),
            tagline: take_string(&mut extra, "tagline"),
            website: take_string(&mut extra, "website"),
            extra,
        };

        ToolboxEntry {
            slug: self.slug,
            title: self.title,
            published_at: parse_optional_date(self.date_gmt.as_deref()),
            modified_at: parse_optional_date(self.modified_gmt.as_deref()),
            product,
            featured_media: self
                .featured_image
                .and_then(|edge| edge.node)
                .and_then(GqlImage::into_media),
        }
    }
}

fn take_string(map: &mut serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_gmt_and_rfc3339_dates() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_wp_date("2024-05-01T08:30:00").unwrap(), expected);
        assert_eq!(parse_wp_date("2024-05-01T10:30:00+02:00").unwrap(), expected);
        assert!(parse_wp_date("yesterday").is_err());
    }

    #[test]
    fn post_maps_embedded_records() {
        let json = serde_json::json!({
            "id": 42,
            "slug": "lancer-sa-startup",
            "date_gmt": "2024-05-01T08:30:00",
            "modified_gmt": "2024-05-02T08:30:00",
            "title": {"rendered": "Lancer sa startup"},
            "content": {"rendered": "<p>Contenu</p>"},
            "excerpt": {"rendered": "<p>Résumé</p>"},
            "categories": [7],
            "_embedded": {
                "author": [{"id": 3, "name": "Jean Dupont", "slug": "jean-dupont", "description": ""}],
                "wp:featuredmedia": [{
                    "source_url": "https://cms.example.com/wp-content/uploads/a.jpg",
                    "alt_text": "",
                    "media_details": {"sizes": {"large": {"source_url": "https://cms.example.com/wp-content/uploads/a-1024.jpg"}}}
                }],
                "wp:term": [
                    [{"id": 7, "name": "Growth", "slug": "growth", "taxonomy": "category"}],
                    [{"id": 9, "name": "seo", "slug": "seo", "taxonomy": "post_tag"}]
                ]
            }
        });

        let wp: WpPost = serde_json::from_value(json).expect("deserialize");
        let post = wp.into_post().expect("convert");
        assert_eq!(post.id, 42);
        assert_eq!(post.author.as_ref().map(|a| a.slug.as_str()), Some("jean-dupont"));
        assert_eq!(post.categories.len(), 1);
        assert_eq!(post.categories[0].slug, "growth");
        let media = post.featured_media.expect("media");
        assert_eq!(media.alt, None);
        assert!(media.sizes.contains_key("large"));
        assert!(post.modified_at.is_some());
    }

    #[test]
    fn embedded_error_objects_degrade_to_none() {
        let json = serde_json::json!({
            "id": 1,
            "slug": "x",
            "date_gmt": "2024-05-01T08:30:00",
            "title": {"rendered": "X"},
            "_embedded": {
                "author": [{"code": "rest_user_invalid_id", "message": "Invalid user ID."}],
                "wp:featuredmedia": [{"code": "rest_forbidden"}]
            }
        });
        let post = serde_json::from_value::<WpPost>(json).unwrap().into_post().unwrap();
        assert!(post.author.is_none());
        assert!(post.featured_media.is_none());
    }

    #[test]
    fn team_member_splits_known_fields() {
        let json = serde_json::json!({
            "id": "cG9zdDoxMg==",
            "slug": "marie-curie",
            "title": "Marie Curie",
            "teamFields": {
                "extract": "Chercheuse",
                "position": "CSO",
                "image": {"sourceUrl": "https://cms.example.com/wp-content/uploads/m.jpg", "altText": "Marie"},
                "linkedin": "https://linkedin.com/in/marie"
            }
        });
        let member = serde_json::from_value::<GqlTeamMember>(json).unwrap().into_member();
        assert_eq!(member.fields.extract.as_deref(), Some("Chercheuse"));
        assert_eq!(member.fields.image.as_ref().and_then(|m| m.alt.as_deref()), Some("Marie"));
        assert!(member.fields.extra.contains_key("linkedin"));
        assert!(!member.fields.extra.contains_key("position"));
    }
}
