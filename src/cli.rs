//! Command-line interface definitions.
//!
//! Every option can be supplied as a flag or through its environment
//! variable, so the binary can run unattended from a scheduler with nothing
//! but environment configuration.

use crate::api::DEFAULT_ENDPOINT;
use crate::errors::NewsletterError;
use crate::sources::SourceRegistry;
use clap::Parser;
use std::path::PathBuf;

/// Build today's AI news newsletter.
///
/// # Examples
///
/// ```sh
/// # Built-in feeds, defaults everywhere
/// OPENAI_API_KEY=sk-... ai_news_letter
///
/// # Custom feed list and a different model
/// ai_news_letter -c feeds.yaml --model gpt-4o -o ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory the dated newsletter file is written to
    #[arg(short, long, env = "NEWSLETTERS_DIR", default_value = "newsletters")]
    pub output_dir: PathBuf,

    /// Optional YAML file replacing the built-in feed list
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API key for the inference endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier sent with the completion request
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Maximum number of articles taken from each feed
    #[arg(long, env = "MAX_ARTICLES_PER_SOURCE", default_value_t = 5)]
    pub max_articles_per_source: usize,

    /// Timeout for each feed request, in seconds
    #[arg(long, default_value_t = 15)]
    pub fetch_timeout_secs: u64,

    /// Timeout for the inference request, in seconds
    #[arg(long, default_value_t = 120)]
    pub inference_timeout_secs: u64,

    /// Extra attempts after a transient inference failure
    #[arg(long, env = "INFERENCE_RETRIES", default_value_t = 0)]
    pub inference_retries: usize,

    /// Wrap the newsletter in YAML front matter with a title and footer
    #[arg(long)]
    pub front_matter: bool,

    /// Number of feeds fetched at the same time
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,
}

impl Cli {
    /// The registry named by `--config`, or the built-in one.
    pub fn registry(&self) -> Result<SourceRegistry, NewsletterError> {
        match &self.config {
            Some(path) => SourceRegistry::load(path),
            None => Ok(SourceRegistry::builtin()),
        }
    }
}
