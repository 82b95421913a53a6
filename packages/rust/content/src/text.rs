//! Plain-text extraction from rendered HTML: tag stripping, reading time,
//! and meta-description excerpts.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node};

/// Reading speed used for the estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// Elements whose boundaries separate words.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th",
    "section", "article", "blockquote", "figure", "figcaption", "pre", "hr",
];

/// Elements whose text is never visible.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Trailing "read more" marker WordPress appends to generated excerpts.
static MORE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[(?:…|\.\.\.)\]\s*$").expect("more marker regex"));

/// Visible text of an HTML fragment, entities decoded and whitespace collapsed.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => out.push(' '),
            Node::Text(text) => {
                let hidden = node.ancestors().any(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                });
                if !hidden {
                    out.push_str(text);
                }
            }
            _ => {}
        }
    }

    WHITESPACE_RE.replace_all(&out, " ").trim().to_string()
}

/// Number of whitespace-separated words in the visible text of `html`.
pub fn word_count(html: &str) -> usize {
    strip_tags(html).split_whitespace().count()
}

/// Estimated reading time in whole minutes, never less than 1.
pub fn estimate_reading_time(html: &str) -> u32 {
    let words = word_count(html);
    let minutes = (words as f64 / WORDS_PER_MINUTE as f64).round() as u32;
    minutes.max(1)
}

/// Human-readable form of [`estimate_reading_time`] (e.g. `"4 min"`).
pub fn format_reading_time(minutes: u32) -> String {
    format!("{minutes} min")
}

/// Plain-text excerpt of at most `max_chars` characters, cut on a word boundary.
///
/// Used for meta descriptions. The WordPress `[…]` marker is dropped and an
/// ellipsis is appended when the text had to be shortened.
pub fn excerpt_text(html: &str, max_chars: usize) -> String {
    let text = strip_tags(html);
    let text = MORE_MARKER_RE.replace(&text, "");

    if text.chars().count() <= max_chars {
        return text.into_owned();
    }

    let budget = max_chars.saturating_sub(1);
    let cut: String = text.chars().take(budget).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end_matches([',', ';', ':', ' ']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_keeps_visible_text() {
        let html = "<p>Hello <strong>world</strong></p><p>Second&nbsp;line &amp; more</p>";
        assert_eq!(strip_tags(html), "Hello world Second line & more");
    }

    #[test]
    fn strip_tags_drops_scripts_and_styles() {
        let html = "<p>Visible</p><script>var tracking = 1;</script><style>p{}</style>";
        assert_eq!(strip_tags(html), "Visible");
    }

    #[test]
    fn strip_tags_separates_blocks() {
        assert_eq!(strip_tags("<li>one</li><li>two</li>"), "one two");
    }

    #[test]
    fn reading_time_is_at_least_one() {
        assert_eq!(estimate_reading_time(""), 1);
        assert_eq!(estimate_reading_time("<p>Short.</p>"), 1);
    }

    #[test]
    fn reading_time_rounds_to_nearest_minute() {
        let words = |n: usize| format!("<p>{}</p>", vec!["mot"; n].join(" "));
        assert_eq!(estimate_reading_time(&words(200)), 1);
        assert_eq!(estimate_reading_time(&words(299)), 1);
        assert_eq!(estimate_reading_time(&words(300)), 2);
        assert_eq!(estimate_reading_time(&words(1000)), 5);
    }

    #[test]
    fn reading_time_is_monotonic() {
        let mut previous = 0;
        for n in (0..3000).step_by(37) {
            let html = format!("<p>{}</p>", vec!["mot"; n].join(" "));
            let minutes = estimate_reading_time(&html);
            assert!(minutes >= previous, "{n} words gave {minutes} < {previous}");
            previous = minutes;
        }
    }

    #[test]
    fn reading_time_ignores_markup() {
        let plain = "<p>un deux trois</p>";
        let heavy = r#"<div class="a"><p><a href="/x">un</a> <em>deux</em> trois</p></div>"#;
        assert_eq!(word_count(plain), word_count(heavy));
    }

    #[test]
    fn excerpt_drops_more_marker() {
        let html = "<p>Une levée de fonds record [&hellip;]</p>";
        assert_eq!(excerpt_text(html, 160), "Une levée de fonds record");
    }

    #[test]
    fn excerpt_cuts_on_word_boundary() {
        let html = "<p>Lorem ipsum dolor sit amet, consectetur adipiscing elit</p>";
        let out = excerpt_text(html, 20);
        assert!(out.chars().count() <= 20);
        assert!(out.ends_with('…'));
        assert_eq!(out, "Lorem ipsum dolor…");
    }
}
