//! HTML entity decoding for CMS titles and excerpts.
//!
//! WordPress renders titles with typographic entities (`&#8217;`, `&rsquo;`,
//! `&amp;`...). Anywhere the text leaves a raw-HTML context (meta tags, feeds,
//! JSON view-models) it has to be decoded first.

use std::sync::LazyLock;

use regex::Regex;

/// Matches `&name;`, `&#123;` and `&#x7B;`.
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
        .expect("entity regex")
});

/// Decode numeric and named HTML entities into literal text.
///
/// Unknown names and invalid code points are left exactly as written.
pub fn decode_html_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    ENTITY_RE
        .replace_all(input, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = match body.strip_prefix('#') {
                Some(num) => decode_numeric(num),
                None => named_entity(body).map(String::from),
            };
            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_numeric(num: &str) -> Option<String> {
    let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse::<u32>().ok()?,
    };
    if code == 0 {
        return None;
    }
    char::from_u32(code).map(String::from)
}

fn named_entity(name: &str) -> Option<&'static str> {
    let s = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "hellip" => "…",
        "ndash" => "–",
        "mdash" => "—",
        "lsquo" => "‘",
        "rsquo" => "’",
        "sbquo" => "‚",
        "ldquo" => "“",
        "rdquo" => "”",
        "bdquo" => "„",
        "laquo" => "«",
        "raquo" => "»",
        "bull" => "•",
        "middot" => "·",
        "euro" => "€",
        "pound" => "£",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "deg" => "°",
        "times" => "×",
        "agrave" => "à",
        "aacute" => "á",
        "acirc" => "â",
        "auml" => "ä",
        "ccedil" => "ç",
        "egrave" => "è",
        "eacute" => "é",
        "ecirc" => "ê",
        "euml" => "ë",
        "icirc" => "î",
        "iuml" => "ï",
        "ocirc" => "ô",
        "ouml" => "ö",
        "ugrave" => "ù",
        "ucirc" => "û",
        "uuml" => "ü",
        "oelig" => "œ",
        "Agrave" => "À",
        "Eacute" => "É",
        "Egrave" => "È",
        "Ecirc" => "Ê",
        "Ccedil" => "Ç",
        "OElig" => "Œ",
        _ => return None,
    };
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_named_entities() {
        assert_eq!(decode_html_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_html_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_html_entities("&laquo;Bonjour&raquo;"), "«Bonjour»");
        assert_eq!(decode_html_entities("Lev&eacute;e"), "Levée");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_html_entities("L&#039;agence"), "L'agence");
        assert_eq!(decode_html_entities("L&#8217;agence"), "L’agence");
        assert_eq!(decode_html_entities("&#x27;quoted&#X27;"), "'quoted'");
        assert_eq!(decode_html_entities("Wait&#8230;"), "Wait…");
    }

    #[test]
    fn leaves_unknown_and_invalid_untouched() {
        assert_eq!(decode_html_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_html_entities("&#0;"), "&#0;");
        assert_eq!(decode_html_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_html_entities("R&D"), "R&D");
        assert_eq!(decode_html_entities("a && b"), "a && b");
    }

    #[test]
    fn decoding_is_single_pass() {
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    }
}
