//! Feed source registry.
//!
//! The registry is an immutable, ordered list of [`Source`]s built once at
//! startup and passed explicitly to the fetcher. By default it holds the
//! built-in AI and developer-tooling feeds; a YAML file can replace it.
//!
//! # YAML Format
//!
//! ```yaml
//! sources:
//!   - name: GitHub Blog
//!     url: https://github.blog/feed/
//! ```

use crate::errors::NewsletterError;
use crate::models::Source;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("GitHub Blog", "https://github.blog/feed/"),
    (
        "GitHub Changelog – Copilot",
        "https://github.blog/changelog/label/copilot/feed/",
    ),
    (
        "GitHub Changelog – Actions",
        "https://github.blog/changelog/label/github-actions/feed/",
    ),
    ("OpenAI News", "https://openai.com/news/rss.xml"),
    ("Anthropic News", "https://www.anthropic.com/rss.xml"),
    ("Google DeepMind Blog", "https://deepmind.google/blog/rss.xml"),
    ("Microsoft AI Blog", "https://blogs.microsoft.com/ai/feed/"),
    ("HuggingFace Blog", "https://huggingface.co/blog/feed.xml"),
];

#[derive(Debug, Deserialize)]
struct RegistryFile {
    sources: Vec<Source>,
}

/// Ordered, read-only set of feed sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Build a registry from an explicit list.
    ///
    /// # Errors
    ///
    /// Returns [`NewsletterError::Config`] if the list is empty or any URL is
    /// not an absolute `http`/`https` URL.
    pub fn new(sources: Vec<Source>) -> Result<Self, NewsletterError> {
        if sources.is_empty() {
            return Err(NewsletterError::Config(
                "source registry is empty".to_string(),
            ));
        }
        for source in &sources {
            validate_feed_url(source)?;
        }
        Ok(Self { sources })
    }

    /// The built-in feed list.
    pub fn builtin() -> Self {
        Self {
            sources: BUILTIN_SOURCES
                .iter()
                .map(|(name, url)| Source::new(*name, *url))
                .collect(),
        }
    }

    /// Parse a registry from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, NewsletterError> {
        let file: RegistryFile = serde_yaml::from_str(yaml)
            .map_err(|e| NewsletterError::Config(format!("invalid source registry: {e}")))?;
        Self::new(file.sources)
    }

    /// Load a registry from a YAML file on disk.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NewsletterError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            NewsletterError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let registry = Self::from_yaml(&yaml)?;
        info!(count = registry.len(), "Loaded source registry");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Source> {
        self.sources.iter()
    }
}

fn validate_feed_url(source: &Source) -> Result<(), NewsletterError> {
    let url = Url::parse(&source.feed_url).map_err(|e| {
        NewsletterError::Config(format!(
            "source {:?} has an invalid URL {:?}: {e}",
            source.name, source.feed_url
        ))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(NewsletterError::Config(format!(
            "source {:?} uses unsupported scheme {other:?}",
            source.name
        ))),
    }
}
