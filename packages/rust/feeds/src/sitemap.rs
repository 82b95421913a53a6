//! Sitemap XML: URL sets, the sitemap index, Google News and Discover feeds.
//!
//! Everything here is pure string building; callers hand in fully-qualified
//! URLs and timestamps.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const NEWS_NS: &str = "http://www.google.com/schemas/sitemap-news/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

/// Only posts younger than this appear in the news sitemap.
pub const NEWS_WINDOW_HOURS: i64 = 48;

/// Google News caps a news sitemap at 1000 URLs.
pub const NEWS_MAX_ENTRIES: usize = 1000;

/// Number of latest posts listed in the Discover sitemap.
pub const DISCOVER_MAX_ENTRIES: usize = 100;

/// Sub-sitemaps referenced by the index, in order.
pub const SUB_SITEMAPS: [&str; 9] = [
    "static",
    "blog",
    "expertise",
    "levee",
    "toolbox",
    "team",
    "portfolio",
    "news",
    "discover",
];

/// File name of a sub-sitemap (`blog` → `blog-sitemap.xml`).
pub fn sitemap_file_name(name: &str) -> String {
    format!("{name}-sitemap.xml")
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Content kind of a sitemap URL; determines its crawl hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Home,
    StaticPage,
    BlogPost,
    BlogCategory,
    Expertise,
    TeamMember,
    Portfolio,
    Toolbox,
    Levee,
    Discover,
}

impl UrlKind {
    /// `(changefreq, priority)` for this kind.
    pub fn policy(self) -> (ChangeFreq, f32) {
        match self {
            Self::Home => (ChangeFreq::Daily, 1.0),
            Self::StaticPage => (ChangeFreq::Monthly, 0.8),
            Self::BlogPost => (ChangeFreq::Weekly, 0.7),
            Self::BlogCategory => (ChangeFreq::Weekly, 0.6),
            Self::Expertise => (ChangeFreq::Monthly, 0.8),
            Self::TeamMember => (ChangeFreq::Monthly, 0.5),
            Self::Portfolio => (ChangeFreq::Monthly, 0.6),
            Self::Toolbox => (ChangeFreq::Weekly, 0.6),
            Self::Levee => (ChangeFreq::Daily, 0.6),
            Self::Discover => (ChangeFreq::Daily, 0.7),
        }
    }
}

// ---------------------------------------------------------------------------
// URL set
// ---------------------------------------------------------------------------

/// One `<url>` of a sitemap.
#[derive(Debug, Clone)]
pub struct UrlEntry {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
    pub kind: UrlKind,
}

impl UrlEntry {
    pub fn new(loc: impl Into<String>, lastmod: DateTime<Utc>, kind: UrlKind) -> Self {
        Self {
            loc: loc.into(),
            lastmod,
            kind,
        }
    }
}

/// Builder for a `<urlset>` document.
#[derive(Debug, Clone, Default)]
pub struct UrlSet {
    entries: Vec<UrlEntry>,
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: UrlEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(128 + self.entries.len() * 192);
        out.push_str(XML_DECL);
        out.push('\n');
        out.push_str(&format!("<urlset xmlns=\"{SITEMAP_NS}\">\n"));
        for entry in &self.entries {
            let (freq, priority) = entry.kind.policy();
            out.push_str("  <url>\n");
            push_element(&mut out, 4, "loc", &entry.loc);
            push_element(&mut out, 4, "lastmod", &iso8601(entry.lastmod));
            push_element(&mut out, 4, "changefreq", freq.as_str());
            push_element(&mut out, 4, "priority", &format!("{priority:.1}"));
            out.push_str("  </url>\n");
        }
        out.push_str("</urlset>\n");
        out
    }
}

impl FromIterator<UrlEntry> for UrlSet {
    fn from_iter<I: IntoIterator<Item = UrlEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Render the sitemap index pointing at every entry of [`SUB_SITEMAPS`].
pub fn render_index(base_url: &str, lastmod: DateTime<Utc>) -> String {
    let base = base_url.trim_end_matches('/');
    let stamp = iso8601(lastmod);

    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!("<sitemapindex xmlns=\"{SITEMAP_NS}\">\n"));
    for name in SUB_SITEMAPS {
        out.push_str("  <sitemap>\n");
        push_element(&mut out, 4, "loc", &format!("{base}/{}", sitemap_file_name(name)));
        push_element(&mut out, 4, "lastmod", &stamp);
        out.push_str("  </sitemap>\n");
    }
    out.push_str("</sitemapindex>\n");
    out
}

// ---------------------------------------------------------------------------
// Google News
// ---------------------------------------------------------------------------

/// Publication block of a news sitemap.
#[derive(Debug, Clone)]
pub struct Publication {
    pub name: String,
    /// ISO 639 language code.
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct NewsEntry {
    pub loc: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Keep entries published within the news window before `now`, newest first,
/// capped at [`NEWS_MAX_ENTRIES`].
pub fn select_news(mut entries: Vec<NewsEntry>, now: DateTime<Utc>) -> Vec<NewsEntry> {
    let cutoff = now - Duration::hours(NEWS_WINDOW_HOURS);
    entries.retain(|e| e.published_at > cutoff && e.published_at <= now);
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    entries.truncate(NEWS_MAX_ENTRIES);
    entries
}

/// Render a Google News sitemap from candidate entries.
pub fn render_news(
    entries: Vec<NewsEntry>,
    now: DateTime<Utc>,
    publication: &Publication,
) -> String {
    let entries = select_news(entries, now);

    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(
        "<urlset xmlns=\"{SITEMAP_NS}\" xmlns:news=\"{NEWS_NS}\">\n"
    ));
    for entry in &entries {
        out.push_str("  <url>\n");
        push_element(&mut out, 4, "loc", &entry.loc);
        out.push_str("    <news:news>\n");
        out.push_str("      <news:publication>\n");
        push_element(&mut out, 8, "news:name", &publication.name);
        push_element(&mut out, 8, "news:language", &publication.language);
        out.push_str("      </news:publication>\n");
        push_element(&mut out, 6, "news:publication_date", &iso8601(entry.published_at));
        push_element(&mut out, 6, "news:title", &entry.title);
        out.push_str("    </news:news>\n");
        out.push_str("  </url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

// ---------------------------------------------------------------------------
// Discover
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DiscoverEntry {
    pub loc: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub lastmod: DateTime<Utc>,
    pub image: Option<String>,
}

/// Render the Discover sitemap: the latest posts, with `image:image` entries
/// for those that have a featured image.
pub fn render_discover(mut entries: Vec<DiscoverEntry>) -> String {
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    entries.truncate(DISCOVER_MAX_ENTRIES);
    let (freq, priority) = UrlKind::Discover.policy();

    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(
        "<urlset xmlns=\"{SITEMAP_NS}\" xmlns:image=\"{IMAGE_NS}\">\n"
    ));
    for entry in &entries {
        out.push_str("  <url>\n");
        push_element(&mut out, 4, "loc", &entry.loc);
        push_element(&mut out, 4, "lastmod", &iso8601(entry.lastmod));
        push_element(&mut out, 4, "changefreq", freq.as_str());
        push_element(&mut out, 4, "priority", &format!("{priority:.1}"));
        if let Some(image) = &entry.image {
            out.push_str("    <image:image>\n");
            push_element(&mut out, 6, "image:loc", image);
            push_element(&mut out, 6, "image:title", &entry.title);
            out.push_str("    </image:image>\n");
        }
        out.push_str("  </url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// ISO-8601 / W3C datetime, second precision, `Z` suffix.
pub fn iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Escape the five XML special characters and drop characters XML 1.0 forbids.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|c| is_xml_char(*c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// The XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t'
            | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn push_element(out: &mut String, indent: usize, name: &str, text: &str) {
    out.push_str(&" ".repeat(indent));
    out.push_str(&format!("<{name}>{}</{name}>\n", escape_xml(text)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn news(slug: &str, hours_ago: i64) -> NewsEntry {
        NewsEntry {
            loc: format!("https://www.example.com/blog/{slug}"),
            title: slug.to_string(),
            published_at: now() - Duration::hours(hours_ago),
        }
    }

    #[test]
    fn policy_table() {
        assert_eq!(UrlKind::Home.policy(), (ChangeFreq::Daily, 1.0));
        assert_eq!(UrlKind::TeamMember.policy(), (ChangeFreq::Monthly, 0.5));
        assert_eq!(UrlKind::Levee.policy(), (ChangeFreq::Daily, 0.6));
        assert_eq!(UrlKind::Toolbox.policy(), (ChangeFreq::Weekly, 0.6));
    }

    #[test]
    fn urlset_renders_policy_and_escapes() {
        let set: UrlSet = [
            UrlEntry::new("https://www.example.com/", now(), UrlKind::Home),
            UrlEntry::new(
                "https://www.example.com/search?a=1&b=2",
                now(),
                UrlKind::StaticPage,
            ),
        ]
        .into_iter()
        .collect();

        let xml = set.render();
        assert!(xml.starts_with(XML_DECL));
        assert!(xml.contains("<loc>https://www.example.com/</loc>"));
        assert!(xml.contains("<lastmod>2024-06-10T12:00:00Z</lastmod>"));
        assert!(xml.contains("<changefreq>daily</changefreq>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<priority>0.8</priority>"));
        assert!(xml.contains("a=1&amp;b=2"));
        assert_eq!(xml.matches("<url>").count(), 2);
    }

    #[test]
    fn escape_covers_all_five() {
        assert_eq!(
            escape_xml(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
        );
    }

    #[test]
    fn escape_drops_forbidden_control_characters() {
        assert_eq!(escape_xml("Titre\u{0b}vertical"), "Titrevertical");
        assert_eq!(escape_xml("a\u{0}b\u{1f}c\u{fffe}d\u{ffff}"), "abcd");
        assert_eq!(escape_xml("ligne 1\nligne 2\tfin\r"), "ligne 1\nligne 2\tfin\r");
        assert_eq!(escape_xml("émoji 🚀"), "émoji 🚀");
    }

    #[test]
    fn news_title_with_decoded_control_character_stays_well_formed() {
        let mut entry = news("article", 2);
        entry.title = vitrine_content::display_title("Titre&#11;x");
        let publication = Publication {
            name: "Vitrine".into(),
            language: "fr".into(),
        };
        let xml = render_news(vec![entry], now(), &publication);
        assert!(!xml.contains('\u{0b}'));
        assert!(xml.contains("<news:title>Titrex</news:title>"));
    }

    #[test]
    fn index_lists_nine_sitemaps() {
        let xml = render_index("https://www.example.com/", now());
        assert_eq!(xml.matches("<sitemap>").count(), 9);
        assert_eq!(xml.matches("<lastmod>2024-06-10T12:00:00Z</lastmod>").count(), 9);
        assert!(xml.contains("<loc>https://www.example.com/news-sitemap.xml</loc>"));
        assert!(xml.contains("<loc>https://www.example.com/static-sitemap.xml</loc>"));
    }

    #[test]
    fn news_window_is_strict() {
        let picked = select_news(vec![news("old", 49), news("fresh", 47), news("new", 1)], now());
        let slugs: Vec<_> = picked.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(slugs, vec!["new", "fresh"]);
    }

    #[test]
    fn news_caps_entries() {
        let entries = (0..1200)
            .map(|i| NewsEntry {
                loc: format!("https://www.example.com/blog/p{i}"),
                title: format!("p{i}"),
                published_at: now() - Duration::minutes(i),
            })
            .collect();
        assert_eq!(select_news(entries, now()).len(), NEWS_MAX_ENTRIES);
    }

    #[test]
    fn news_renders_publication() {
        let publication = Publication {
            name: "Vitrine".into(),
            language: "fr".into(),
        };
        let xml = render_news(vec![news("levee-record", 2)], now(), &publication);
        assert!(xml.contains(NEWS_NS));
        assert!(xml.contains("<news:name>Vitrine</news:name>"));
        assert!(xml.contains("<news:language>fr</news:language>"));
        assert!(
            xml.contains("<news:publication_date>2024-06-10T10:00:00Z</news:publication_date>")
        );
        assert!(xml.contains("<news:title>levee-record</news:title>"));
    }

    #[test]
    fn discover_keeps_latest_with_images() {
        let mut entries: Vec<DiscoverEntry> = (0..120)
            .map(|i| DiscoverEntry {
                loc: format!("https://www.example.com/blog/p{i}"),
                title: format!("Post {i}"),
                published_at: now() - Duration::hours(i),
                lastmod: now(),
                image: None,
            })
            .collect();
        entries[0].image = Some("https://cdn.example.com/a.jpg".into());

        let xml = render_discover(entries);
        assert_eq!(xml.matches("<url>").count(), DISCOVER_MAX_ENTRIES);
        assert_eq!(xml.matches("<image:image>").count(), 1);
        assert!(xml.contains("<image:loc>https://cdn.example.com/a.jpg</image:loc>"));
        assert!(xml.contains("/blog/p0<"));
        assert!(!xml.contains("/blog/p100<"));
        assert!(xml.contains("<priority>0.7</priority>"));
    }
}
