//! Syndication document parsing.
//!
//! RSS 2.0, RSS 1.0 (RDF) and Atom documents are parsed by `feed-rs`, which
//! picks the dialect from the root element and understands the common
//! namespaced extensions (`dc:date`, `content:encoded`, `media:*`).
//!
//! Entries come back in document order as [`FeedEntry`] values, which are
//! turned into [`Article`]s by [`FeedEntry::into_article`].

use crate::errors::SourceFetchError;
use crate::models::Article;
use crate::utils::{scrub_html_entities, strip_html, truncate_chars};
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use tracing::debug;

/// Maximum summary length, in characters, kept per article.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// One entry as it appears in the feed, before cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    /// Summary markup as found in the feed; may contain HTML.
    pub summary: String,
}

impl FeedEntry {
    /// Normalize into an [`Article`] attributed to `source_name`.
    ///
    /// The title and summary are stripped of markup and whitespace-collapsed;
    /// the summary is also capped at [`SUMMARY_MAX_CHARS`].
    pub fn into_article(self, source_name: &str) -> Article {
        let summary = strip_html(&self.summary);
        Article {
            source_name: source_name.to_string(),
            title: strip_html(&self.title),
            link: self.link.trim().to_string(),
            published: self.published,
            summary: truncate_chars(&summary, SUMMARY_MAX_CHARS).trim_end().to_string(),
        }
    }
}

impl From<Entry> for FeedEntry {
    fn from(entry: Entry) -> Self {
        let link = entry_link(&entry);
        let summary = entry
            .summary
            .map(|s| s.content)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        Self {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            link,
            published: entry.published.or(entry.updated),
            summary,
        }
    }
}

/// The entry's permalink: the first `alternate` (or untyped) link, else the
/// first link of any kind.
fn entry_link(entry: &Entry) -> String {
    let non_empty = || entry.links.iter().filter(|l| !l.href.trim().is_empty());
    non_empty()
        .find(|l| {
            l.rel
                .as_deref()
                .is_none_or(|rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| non_empty().next())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default()
}

/// Parse a syndication document into its entries, in document order.
///
/// # Errors
///
/// Returns [`SourceFetchError::Parse`] if the text is not a well-formed RSS,
/// RDF or Atom document.
pub fn parse_entries(document: &str) -> Result<Vec<FeedEntry>, SourceFetchError> {
    let xml = scrub_html_entities(document.trim_start_matches('\u{feff}'));
    let feed = parser::parse(xml.as_bytes())
        .map_err(|e| SourceFetchError::Parse(format!("unable to parse feed: {e}")))?;
    debug!(
        feed_type = ?feed.feed_type,
        entries = feed.entries.len(),
        "Parsed feed document"
    );
    Ok(feed.entries.into_iter().map(FeedEntry::from).collect())
}
