//! # AI News Letter
//!
//! Collects recent posts from a fixed set of AI and developer-tooling feeds,
//! asks an OpenAI-compatible model to write them up as a themed newsletter,
//! and stores the result as `newsletters/YYYY-MM-DD.md`.
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=sk-... ai_news_letter
//! ```
//!
//! ## Architecture
//!
//! Each invocation is one stateless pass:
//! 1. **Fetching**: Pull every feed in the registry, at most N entries each
//! 2. **Summarizing**: Compose one prompt and make one inference call
//! 3. **Writing**: Write the completion to the dated Markdown file
//!
//! The exit status is non-zero on any fatal error; a failing feed on its own
//! is not fatal.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod errors;
mod feeds;
mod models;
mod outputs;
mod pipeline;
mod prompt;
mod sources;
#[cfg(test)]
mod test_support;
mod utils;

use cli::Cli;
use pipeline::execute;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ai_news_letter starting up");

    let args = Cli::parse();
    debug!(
        output_dir = %args.output_dir.display(),
        model = %args.model,
        endpoint = %args.endpoint,
        max_articles_per_source = args.max_articles_per_source,
        "Parsed CLI arguments"
    );

    let registry = match args.registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Could not load the source registry");
            return Err(e.into());
        }
    };

    let run_date = Utc::now().date_naive();
    let summary = match execute(&args, &registry, run_date).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Newsletter run failed");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        path = %summary.path.display(),
        articles = summary.article_count,
        failed_sources = summary.failed_sources,
        ?elapsed,
        "Newsletter saved"
    );
    Ok(())
}
