//! Text helpers shared by the fetcher, the client and logging.
//!
//! This module provides:
//! - HTML-to-text cleanup for feed summaries
//! - Whitespace collapsing and char-safe truncation
//! - Scrubbing of HTML-only entities that break XML parsing
//! - String truncation for log previews

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Named entities HTML defines but XML does not.
const HTML_ONLY_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&ndash;", "-"),
    ("&mdash;", "-"),
    ("&hellip;", "..."),
    ("&ldquo;", "\""),
    ("&rdquo;", "\""),
    ("&lsquo;", "'"),
    ("&rsquo;", "'"),
    ("&laquo;", "\""),
    ("&raquo;", "\""),
    ("&copy;", "(c)"),
    ("&reg;", "(R)"),
    ("&trade;", "(TM)"),
];

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a byte
/// count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        None => s,
        Some((cut, _)) => &s[..cut],
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Reduce an HTML fragment to its visible text.
///
/// Text nodes are joined with single spaces and entities are decoded, so
/// `"<p>Hello&amp;<b>bye</b></p>"` becomes `"Hello& bye"`.
pub fn strip_html(fragment: &str) -> String {
    if !fragment.contains('<') && !fragment.contains('&') {
        return collapse_whitespace(fragment);
    }
    let parsed = Html::parse_fragment(fragment);
    let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Replace HTML-only named entities so an XML parser accepts the document.
pub fn scrub_html_entities(xml: &str) -> String {
    if !xml.contains('&') {
        return xml.to_string();
    }
    HTML_ONLY_ENTITIES
        .iter()
        .fold(xml.to_string(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
}
