//! Article fetcher.
//!
//! Retrieves every feed in a [`SourceRegistry`], keeps at most
//! `max_per_source` entries of each in feed order, and normalizes them into
//! [`Article`]s.
//!
//! # Failure Isolation
//!
//! Each source gets exactly one attempt. A network error, timeout, non-2xx
//! status or unparseable document is logged, recorded in the source's
//! [`SourceReport`], and the source contributes zero articles. The batch as a
//! whole never fails.
//!
//! # Ordering
//!
//! Feeds are fetched concurrently but results are merged in registry order,
//! one slot per source, so the batch is grouped by source and the output is
//! independent of network timing.

use crate::errors::{NewsletterError, SourceFetchError};
use crate::feeds::parse::parse_entries;
use crate::models::{Article, ArticleBatch, Source};
use crate::sources::SourceRegistry;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; ai-news-letter/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Outcome of one source's fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source_name: String,
    /// Article count on success, error text on failure.
    pub result: Result<usize, String>,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a fetch pass produced.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub batch: ArticleBatch,
    pub reports: Vec<SourceReport>,
}

impl FetchOutcome {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| !r.is_ok())
    }
}

/// HTTP feed fetcher with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    concurrency: usize,
}

impl Fetcher {
    /// Build a fetcher.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Upper bound on each feed request, connect to last byte
    /// * `concurrency` - How many feeds may be in flight at once (minimum 1)
    pub fn new(timeout: Duration, concurrency: usize) -> Result<Self, NewsletterError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NewsletterError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            concurrency: concurrency.max(1),
        })
    }

    /// Fetch all sources and collect their articles.
    ///
    /// Never fails: per-source errors are absorbed into the returned reports.
    #[instrument(level = "info", skip_all, fields(sources = registry.len(), max_per_source = max_per_source))]
    pub async fn fetch(&self, registry: &SourceRegistry, max_per_source: usize) -> FetchOutcome {
        let t0 = Instant::now();
        let results: Vec<(&Source, Result<Vec<Article>, SourceFetchError>)> =
            stream::iter(registry.iter())
                .map(|source| async move {
                    let res = self.fetch_source(source, max_per_source).await;
                    (source, res)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut articles = Vec::new();
        let mut reports = Vec::with_capacity(results.len());
        for (source, res) in results {
            match res {
                Ok(fetched) => {
                    info!(source = %source.name, count = fetched.len(), "Fetched articles");
                    reports.push(SourceReport {
                        source_name: source.name.clone(),
                        result: Ok(fetched.len()),
                    });
                    articles.extend(fetched);
                }
                Err(e) => {
                    warn!(source = %source.name, url = %source.feed_url, error = %e, "Source failed; skipping");
                    reports.push(SourceReport {
                        source_name: source.name.clone(),
                        result: Err(e.to_string()),
                    });
                }
            }
        }

        let batch = ArticleBatch::new(articles);
        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        info!(
            total = batch.len(),
            failed_sources = failed,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetch complete"
        );
        FetchOutcome { batch, reports }
    }

    #[instrument(level = "debug", skip_all, fields(source = %source.name))]
    async fn fetch_source(
        &self,
        source: &Source,
        max_per_source: usize,
    ) -> Result<Vec<Article>, SourceFetchError> {
        let response = self.client.get(&source.feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceFetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), "Downloaded feed");

        let articles = parse_entries(&body)?
            .into_iter()
            .take(max_per_source)
            .map(|entry| entry.into_article(&source.name))
            .collect();
        Ok(articles)
    }
}
