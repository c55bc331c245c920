//! Data models flowing through the newsletter pipeline.
//!
//! This module defines the records produced and consumed by each stage:
//! - [`Source`]: One named syndication endpoint from the registry
//! - [`Article`]: A normalized feed entry, read-only once built
//! - [`ArticleBatch`]: Every article collected in one run, grouped by source
//! - [`Prompt`]: The single text sent to the inference endpoint
//! - [`Newsletter`]: The model's Markdown output bound to the run date
//! - [`RunStage`]: The stage a run is in, used to label fatal failures

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named syndication endpoint.
///
/// Sources are defined once at process start (built in or loaded from the
/// YAML registry file) and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Display name, used as the article's source label.
    pub name: String,
    /// URL of the RSS or Atom document.
    #[serde(rename = "url")]
    pub feed_url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed_url: feed_url.into(),
        }
    }
}

/// A single feed entry after normalization.
///
/// # Fields
///
/// * `source_name` - Name of the [`Source`] the entry came from
/// * `title` - Trimmed entry title (may be empty if the feed omits it)
/// * `link` - Permalink of the entry
/// * `published` - Publication time when the feed provides a parseable one
/// * `summary` - Plain-text summary, markup stripped and length-capped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub source_name: String,
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub summary: String,
}

/// Ordered articles for one run.
///
/// Articles keep feed order inside each source and registry order across
/// sources; nothing is re-ranked globally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleBatch {
    articles: Vec<Article>,
}

impl ArticleBatch {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.articles.iter()
    }

    /// Number of articles contributed by the named source.
    #[cfg(test)]
    pub fn count_for(&self, source_name: &str) -> usize {
        self.articles
            .iter()
            .filter(|a| a.source_name == source_name)
            .count()
    }
}

impl FromIterator<Article> for ArticleBatch {
    fn from_iter<I: IntoIterator<Item = Article>>(iter: I) -> Self {
        Self {
            articles: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ArticleBatch {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.articles.iter()
    }
}

/// The text handed to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The Markdown produced by one run.
///
/// `date` is always the run date, never an article's publish date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Newsletter {
    pub date: NaiveDate,
    pub body: String,
}

/// Stages of a run, entered in order and at most once each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Fetching,
    Summarizing,
    Writing,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Fetching => "fetching",
            RunStage::Summarizing => "summarizing",
            RunStage::Writing => "writing",
        };
        f.write_str(name)
    }
}
