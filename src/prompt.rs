//! Prompt composition.
//!
//! [`compose`] turns an [`ArticleBatch`] into the single prompt sent to the
//! model: fixed editorial instructions followed by one numbered block per
//! article. The output depends only on the batch, so the same articles always
//! produce the same text.

use crate::models::{Article, ArticleBatch, Prompt};
use itertools::Itertools;

const INSTRUCTIONS: &str = "\
You are an expert AI and developer-tools journalist.

Below is a list of recent articles from GitHub blogs and AI news pages.
Your task is to write a concise, well-structured daily newsletter in
Markdown format that:

1. Starts with a short \"Today's Highlights\" paragraph (2-4 sentences)
   summarizing the most important themes.
2. Groups articles into thematic sections (e.g. \"GitHub & Copilot\",
   \"Foundation Models\", \"AI Agents & Tooling\", \"Research\", \"Other\"),
   each under its own Markdown heading.
3. For each article, writes a 1-3 sentence analysis explaining *why*
   it matters for AI agent developers and what to watch.
4. Ends with a \"Key Takeaways\" bullet list (3-5 bullets).

Use proper Markdown: headings, bullet points, and hyperlinks.
Do NOT invent facts - only use information from the articles provided.
If an article is not relevant to AI or developer tooling, skip it.
";

const NO_ARTICLES: &str = "\
No articles were found in any source for this edition.
Write a short Markdown newsletter with a single heading that states that no
articles were found today. Do not invent any news.";

/// Render the batch into a prompt.
///
/// Never fails. An empty batch yields instructions that ask the model to
/// report that no articles were found.
pub fn compose(batch: &ArticleBatch) -> Prompt {
    let mut text = String::with_capacity(INSTRUCTIONS.len() + batch.len() * 512);
    text.push_str(INSTRUCTIONS);
    text.push_str("\n---\n\nARTICLES:\n\n");

    if batch.is_empty() {
        text.push_str(NO_ARTICLES);
    } else {
        let blocks = batch
            .iter()
            .enumerate()
            .map(|(i, article)| article_block(i + 1, article))
            .join("\n\n");
        text.push_str(&blocks);
    }
    text.push('\n');

    Prompt::new(text)
}

fn article_block(index: usize, article: &Article) -> String {
    let mut lines = vec![
        format!("[{index}] Source: {}", article.source_name),
        format!("    Title: {}", article.title),
        format!("    URL: {}", article.link),
    ];
    if !article.summary.is_empty() {
        lines.push(format!("    Summary: {}", article.summary));
    }
    if let Some(published) = article.published {
        lines.push(format!(
            "    Published: {}",
            published.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    lines.iter().join("\n")
}
