//! Error taxonomy for a newsletter run.
//!
//! Only [`SourceFetchError`] is recoverable: the fetcher absorbs it and the
//! affected source contributes no articles. Everything wrapped by
//! [`NewsletterError`] ends the run with a non-zero exit.

use crate::models::RunStage;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to retrieve or parse one feed. Never fatal.
#[derive(Debug, Error)]
pub enum SourceFetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("feed parse error: {0}")]
    Parse(String),
}

/// Failure of the single inference call.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Missing, blank or rejected credential.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Endpoint unreachable, timed out, throttled or temporarily down.
    #[error("inference service unavailable: {0}")]
    TransientService(String),

    /// Error status, undecodable body or empty completion.
    #[error("bad inference response: {0}")]
    Response(String),
}

impl SummarizeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SummarizeError::TransientService(_))
    }
}

/// Fatal errors surfaced to `main`.
#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A fatal error tagged with the stage that produced it.
#[derive(Debug, Error)]
#[error("run failed while {stage}: {error}")]
pub struct RunError {
    pub stage: RunStage,
    #[source]
    pub error: NewsletterError,
}

impl RunError {
    pub fn new(stage: RunStage, error: impl Into<NewsletterError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}
