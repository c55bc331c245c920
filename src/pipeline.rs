//! The newsletter run.
//!
//! A run walks `FETCHING → SUMMARIZING → WRITING` once, in order:
//!
//! 1. **Fetching**: Pull every registered feed (per-source failures absorbed)
//! 2. **Summarizing**: Compose one prompt and make one inference call
//! 3. **Writing**: Persist the completion to `<output_dir>/<YYYY-MM-DD>.md`
//!
//! Any failure after fetching ends the run immediately, tagged with the stage
//! it happened in. Nothing is written unless the inference call succeeded.

use crate::api::{CompletionProvider, Credentials, OpenAiChat, RetryProvider};
use crate::cli::Cli;
use crate::errors::{NewsletterError, RunError};
use crate::feeds::Fetcher;
use crate::models::{Newsletter, RunStage};
use crate::outputs::markdown::{with_front_matter, write_newsletter};
use crate::prompt::compose;
use crate::sources::SourceRegistry;
use chrono::NaiveDate;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Per-run settings the stages need.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: String,
    pub max_articles_per_source: usize,
    pub output_dir: PathBuf,
    pub front_matter: bool,
}

impl From<&Cli> for RunConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            model: cli.model.clone(),
            max_articles_per_source: cli.max_articles_per_source,
            output_dir: cli.output_dir.clone(),
            front_matter: cli.front_matter,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub path: PathBuf,
    pub article_count: usize,
    pub failed_sources: usize,
}

/// Run the three stages with an already-built fetcher and provider.
#[instrument(level = "info", skip_all, fields(%run_date, model = %config.model))]
pub async fn run<P>(
    registry: &SourceRegistry,
    fetcher: &Fetcher,
    provider: &P,
    config: &RunConfig,
    run_date: NaiveDate,
) -> Result<RunSummary, RunError>
where
    P: CompletionProvider,
{
    info!(stage = %RunStage::Fetching, sources = registry.len(), "Entering stage");
    let outcome = fetcher.fetch(registry, config.max_articles_per_source).await;
    let article_count = outcome.batch.len();
    let failed_sources = outcome.failed_sources().count();
    let prompt = compose(&outcome.batch);
    debug!(articles = article_count, prompt_chars = prompt.as_str().len(), "Composed prompt");

    info!(stage = %RunStage::Summarizing, "Entering stage");
    let body = provider
        .summarize(&prompt, &config.model)
        .await
        .map_err(|e| RunError::new(RunStage::Summarizing, e))?;
    let newsletter = Newsletter {
        date: run_date,
        body,
    };

    info!(stage = %RunStage::Writing, "Entering stage");
    let contents = if config.front_matter {
        with_front_matter(&newsletter.body, newsletter.date, article_count, &config.model)
    } else {
        newsletter.body
    };
    let path = write_newsletter(&contents, newsletter.date, &config.output_dir)
        .await
        .map_err(|e| RunError::new(RunStage::Writing, e))?;

    Ok(RunSummary {
        path,
        article_count,
        failed_sources,
    })
}

/// Build the real fetcher and inference client from the CLI, then run.
///
/// The credential is validated before anything touches the network.
pub async fn execute(
    cli: &Cli,
    registry: &SourceRegistry,
    run_date: NaiveDate,
) -> Result<RunSummary, Box<dyn Error>> {
    let credentials = Credentials::new(cli.api_key.as_deref()).map_err(NewsletterError::from)?;
    let fetcher = Fetcher::new(Duration::from_secs(cli.fetch_timeout_secs), cli.concurrency)?;
    let client = OpenAiChat::new(
        &cli.endpoint,
        credentials,
        Duration::from_secs(cli.inference_timeout_secs),
    )
    .map_err(NewsletterError::from)?;
    let provider = RetryProvider::new(client, cli.inference_retries, Duration::from_secs(1));

    let summary = run(registry, &fetcher, &provider, &RunConfig::from(cli), run_date).await?;
    Ok(summary)
}
