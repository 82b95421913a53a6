//! Delimited exports of the expertise catalogue for ad platforms.
//!
//! `campaigns.csv` has one row per (category, expertise) pair; `keywords.tsv`
//! has one row per keyword variant of each expertise.

use vitrine_content::{category_slug, expertise_slug};
use vitrine_shared::ExpertiseCategory;

/// UTF-8 byte order mark; spreadsheet tools need it to detect the encoding.
pub const BOM: &str = "\u{feff}";

/// Row terminator.
pub const CRLF: &str = "\r\n";

pub const CAMPAIGNS_FILE_NAME: &str = "campaigns.csv";
pub const KEYWORDS_FILE_NAME: &str = "keywords.tsv";

const CAMPAIGN_HEADER: [&str; 5] = ["Campaign", "Ad Group", "Final URL", "Headline", "Description"];
const KEYWORD_HEADER: [&str; 5] = ["Campaign", "Ad Group", "Keyword", "Match Type", "Final URL"];
const MATCH_TYPE: &str = "Phrase";

/// Field separator of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
        }
    }
}

/// Quote `field` if it contains the delimiter, a comma, a tab, a quote or a
/// line break. Embedded quotes are doubled.
pub fn escape_field(field: &str, delimiter: Delimiter) -> String {
    let needs_quotes = field
        .chars()
        .any(|c| c == delimiter.as_char() || matches!(c, ',' | '\t' | '"' | '\n' | '\r'));
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// A header plus rows, serialised with a fixed delimiter.
#[derive(Debug, Clone)]
pub struct Table {
    delimiter: Delimiter,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(delimiter: Delimiter, header: impl IntoIterator<Item = S>) -> Self {
        Self {
            delimiter,
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Serialise with a leading BOM and CRLF line endings.
    pub fn render(&self) -> String {
        let mut out = String::from(BOM);
        for row in std::iter::once(&self.header).chain(&self.rows) {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| escape_field(cell, self.delimiter))
                .collect();
            out.push_str(&cells.join(&self.delimiter.as_char().to_string()));
            out.push_str(CRLF);
        }
        out
    }
}

/// The five search phrasings generated for an expertise title.
pub fn keyword_variants(title: &str) -> [String; 5] {
    [
        title.to_string(),
        format!("{title} agence"),
        format!("agence {title}"),
        format!("{title} expert"),
        format!("expert {title}"),
    ]
}

/// Landing page of an expertise.
pub fn expertise_url(base_url: &str, category_slug: &str, expertise_slug: &str) -> String {
    format!(
        "{}/expertise/{category_slug}/{expertise_slug}",
        base_url.trim_end_matches('/')
    )
}

/// Build the campaigns table (comma-delimited).
pub fn campaigns_table(catalog: &[ExpertiseCategory], base_url: &str) -> Table {
    let mut table = Table::new(Delimiter::Comma, CAMPAIGN_HEADER);
    for category in catalog {
        let cat_slug = category_slug(category);
        for expertise in &category.expertises {
            let url = expertise_url(base_url, &cat_slug, &expertise_slug(expertise));
            let description = expertise
                .description
                .clone()
                .unwrap_or_else(|| format!("{} - {}", category.name, expertise.title));
            table.push_row([
                category.name.clone(),
                expertise.title.clone(),
                url,
                expertise.title.clone(),
                description,
            ]);
        }
    }
    table
}

/// Build the keywords table (tab-delimited).
pub fn keywords_table(catalog: &[ExpertiseCategory], base_url: &str) -> Table {
    let mut table = Table::new(Delimiter::Tab, KEYWORD_HEADER);
    for category in catalog {
        let cat_slug = category_slug(category);
        for expertise in &category.expertises {
            let url = expertise_url(base_url, &cat_slug, &expertise_slug(expertise));
            for keyword in keyword_variants(&expertise.title) {
                table.push_row([
                    category.name.clone(),
                    expertise.title.clone(),
                    keyword,
                    MATCH_TYPE.to_string(),
                    url.clone(),
                ]);
            }
        }
    }
    table
}

/// `campaigns.csv` body.
pub fn campaigns_csv(catalog: &[ExpertiseCategory], base_url: &str) -> String {
    campaigns_table(catalog, base_url).render()
}

/// `keywords.tsv` body.
pub fn keywords_tsv(catalog: &[ExpertiseCategory], base_url: &str) -> String {
    keywords_table(catalog, base_url).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_shared::Expertise;

    fn catalog() -> Vec<ExpertiseCategory> {
        vec![ExpertiseCategory {
            name: "Growth Marketing & Sales".into(),
            slug: None,
            expertises: vec![
                Expertise {
                    title: "SEO".into(),
                    slug: None,
                    description: Some("Référencement naturel, local et \"technique\"".into()),
                },
                Expertise {
                    title: "Google Ads".into(),
                    slug: Some("sea".into()),
                    description: None,
                },
            ],
        }]
    }

    #[test]
    fn plain_fields_are_unquoted() {
        assert_eq!(escape_field("SEO local", Delimiter::Comma), "SEO local");
        assert_eq!(escape_field("SEO local", Delimiter::Tab), "SEO local");
    }

    #[test]
    fn special_fields_are_quoted() {
        assert_eq!(escape_field("a,b", Delimiter::Comma), "\"a,b\"");
        assert_eq!(escape_field("a,b", Delimiter::Tab), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\"", Delimiter::Comma), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("a\tb", Delimiter::Tab), "\"a\tb\"");
        assert_eq!(escape_field("two\nlines", Delimiter::Comma), "\"two\nlines\"");
        assert_eq!(escape_field("cr\r", Delimiter::Tab), "\"cr\r\"");
    }

    #[test]
    fn table_has_bom_and_crlf() {
        let mut table = Table::new(Delimiter::Comma, ["a", "b"]);
        table.push_row(["1", "x,y"]);
        assert_eq!(table.render(), "\u{feff}a,b\r\n1,\"x,y\"\r\n");
    }

    #[test]
    fn campaigns_one_row_per_expertise() {
        let csv = campaigns_csv(&catalog(), "https://www.example.com/");
        let lines: Vec<&str> = csv.trim_start_matches(BOM).split(CRLF).collect();
        // header + 2 rows + trailing empty split
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Campaign,Ad Group,Final URL,Headline,Description");
        assert!(lines[1].starts_with(
            "Growth Marketing & Sales,SEO,https://www.example.com/expertise/growth-marketing-sales/seo,SEO,"
        ));
        assert!(lines[1].ends_with("\"Référencement naturel, local et \"\"technique\"\"\""));
        assert!(lines[2].contains("/expertise/growth-marketing-sales/sea,"));
    }

    #[test]
    fn keywords_five_variants_per_expertise() {
        let tsv = keywords_tsv(&catalog(), "https://www.example.com");
        let table = keywords_table(&catalog(), "https://www.example.com");
        assert_eq!(table.row_count(), 10);
        assert!(tsv.contains("\tSEO agence\t"));
        assert!(tsv.contains("\tagence SEO\t"));
        assert!(tsv.contains("\tSEO expert\t"));
        assert!(tsv.contains("\texpert SEO\t"));
        assert!(tsv.contains("\tGoogle Ads\tPhrase\t"));
    }

    #[test]
    fn empty_catalog_is_header_only() {
        assert_eq!(
            keywords_tsv(&[], "https://www.example.com"),
            "\u{feff}Campaign\tAd Group\tKeyword\tMatch Type\tFinal URL\r\n"
        );
    }
}
