//! Core domain types: CMS records, the expertise catalogue, and stored documents.
//!
//! CMS records are read-only snapshots of upstream content. Text fields that
//! come from WordPress (`title`, `content`, `excerpt`) hold *rendered HTML* and
//! still need the transformers in `vitrine-content` before display.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// An embedded media attachment (featured image).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// URL of the original upload.
    pub source_url: String,
    /// Alternative text, if the editor filled it in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Generated renditions keyed by size name (`large`, `medium_large`, `full`...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sizes: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Blog
// ---------------------------------------------------------------------------

/// A blog category (WordPress term).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    /// Number of published posts in the category.
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A post author (WordPress user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

/// A blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub slug: String,
    /// Rendered HTML title.
    pub title: String,
    /// Rendered HTML body.
    #[serde(default)]
    pub content: String,
    /// Rendered HTML excerpt.
    #[serde(default)]
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    /// Embedded author, when the CMS returned it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    /// Category ids as referenced by the post.
    #[serde(default)]
    pub category_ids: Vec<u64>,
    /// Embedded category terms, in CMS order.
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<Media>,
}

impl Post {
    /// Most recent change timestamp (modification if known, else publication).
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.modified_at.unwrap_or(self.published_at)
    }
}

// ---------------------------------------------------------------------------
// Other content types
// ---------------------------------------------------------------------------

/// A case study / portfolio entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: u64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<Media>,
}

/// Structured custom fields attached to a team member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamFields {
    /// Short bio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
    /// Job title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Portrait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Media>,
    /// Any other field the CMS exposes, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A team profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub slug: String,
    /// The member's name.
    pub title: String,
    #[serde(default)]
    pub fields: TeamFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Product metadata of a toolbox entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolboxProduct {
    /// Launch day as published by the CMS (free-form date string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An entry of the startup-tools directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolboxEntry {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product: ToolboxProduct,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<Media>,
}

/// A fundraising announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeveeItem {
    pub id: u64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<Media>,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// One page of a collection plus the collection's size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Total number of records across all pages.
    pub total: u64,
    /// Total number of pages at the requested page size.
    pub total_pages: u32,
}

impl<T> Paged<T> {
    /// An empty collection.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            total_pages: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Expertise catalogue
// ---------------------------------------------------------------------------

/// One service the agency sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expertise {
    pub title: String,
    /// Route slug; derived from `title` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A group of expertises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertiseCategory {
    pub name: String,
    /// Route slug; derived from `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub expertises: Vec<Expertise>,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A kind of document users may upload (Kbis, articles of association...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

/// A stored upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// UUID v7.
    pub id: String,
    pub user_id: String,
    pub document_type_id: i64,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size_bytes: u64,
    /// SHA-256 of the file contents, hex encoded.
    pub checksum: String,
    /// Location on disk, relative to the upload directory.
    pub stored_path: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn post_last_modified_prefers_modification() {
        let published = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let modified = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let mut post = Post {
            id: 1,
            slug: "hello".into(),
            title: "Hello".into(),
            content: String::new(),
            excerpt: String::new(),
            published_at: published,
            modified_at: None,
            author: None,
            category_ids: vec![],
            categories: vec![],
            featured_media: None,
        };
        assert_eq!(post.last_modified(), published);
        post.modified_at = Some(modified);
        assert_eq!(post.last_modified(), modified);
    }

    #[test]
    fn team_fields_keep_unknown_keys() {
        let json = r#"{"extract":"Bio","position":"CTO","linkedin":"https://linkedin.com/in/x"}"#;
        let fields: TeamFields = serde_json::from_str(json).expect("deserialize");
        assert_eq!(fields.position.as_deref(), Some("CTO"));
        assert_eq!(
            fields.extra.get("linkedin").and_then(|v| v.as_str()),
            Some("https://linkedin.com/in/x")
        );
    }

    #[test]
    fn document_serializes_camel_case() {
        let doc = Document {
            id: "0190".into(),
            user_id: "user-1".into(),
            document_type_id: 2,
            file_name: "kbis.pdf".into(),
            content_type: Some("application/pdf".into()),
            size_bytes: 10,
            checksum: "abc".into(),
            stored_path: "user-1/kbis.pdf".into(),
            metadata: serde_json::json!({"year": 2024}),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["documentTypeId"], 2);
    }

    #[test]
    fn catalogue_slugs_are_optional() {
        let json = r#"[{"name":"Growth","expertises":[{"title":"SEO"}]}]"#;
        let cats: Vec<ExpertiseCategory> = serde_json::from_str(json).expect("deserialize");
        assert_eq!(cats[0].slug, None);
        assert_eq!(cats[0].expertises[0].title, "SEO");
    }
}
