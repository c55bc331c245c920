//! Newsletter Markdown output.
//!
//! # Output Path
//!
//! One file per calendar day, named after the run date:
//! ```text
//! newsletters/
//! ├── 2025-05-31.md
//! └── 2025-06-01.md
//! ```
//!
//! Re-running on the same day replaces that day's file.

use crate::errors::NewsletterError;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the newsletter for `run_date` inside `output_dir`.
pub fn newsletter_path(output_dir: &Path, run_date: NaiveDate) -> PathBuf {
    output_dir.join(format!("{}.md", run_date.format("%Y-%m-%d")))
}

/// Write `body` to `<output_dir>/<YYYY-MM-DD>.md`.
///
/// Creates `output_dir` (and parents) if missing and overwrites any existing
/// file for the same date. The body is written as-is in a single call.
///
/// # Returns
///
/// The path that was written.
///
/// # Errors
///
/// [`NewsletterError::Write`] if the directory cannot be created or the file
/// cannot be written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), %run_date))]
pub async fn write_newsletter(
    body: &str,
    run_date: NaiveDate,
    output_dir: &Path,
) -> Result<PathBuf, NewsletterError> {
    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create output directory");
        return Err(NewsletterError::Write {
            path: output_dir.to_path_buf(),
            source: e,
        });
    }

    let path = newsletter_path(output_dir, run_date);
    fs::write(&path, body)
        .await
        .map_err(|e| NewsletterError::Write {
            path: path.clone(),
            source: e,
        })?;

    info!(path = %path.display(), bytes = body.len(), "Wrote newsletter");
    Ok(path)
}

/// Wrap a model-written body with YAML front matter, a title and a footer.
///
/// # Output
///
/// ```text
/// ---
/// title: "AI & GitHub Agent News – June 01, 2025"
/// date: 2025-06-01
/// articles_analyzed: 6
/// model: gpt-4o-mini
/// ---
///
/// # AI & GitHub Agent News – June 01, 2025
///
/// <body>
///
/// ---
/// *Generated on June 01, 2025 · 6 articles analyzed · model: gpt-4o-mini*
/// ```
pub fn with_front_matter(
    body: &str,
    run_date: NaiveDate,
    article_count: usize,
    model: &str,
) -> String {
    let long_date = run_date.format("%B %d, %Y");
    let title = format!("AI & GitHub Agent News – {long_date}");
    format!(
        "---\n\
         title: \"{title}\"\n\
         date: {}\n\
         articles_analyzed: {article_count}\n\
         model: {model}\n\
         ---\n\
         \n\
         # {title}\n\
         \n\
         {}\n\
         \n\
         ---\n\
         *Generated on {long_date} · {article_count} articles analyzed · model: {model}*\n",
        run_date.format("%Y-%m-%d"),
        body.trim_end()
    )
}
