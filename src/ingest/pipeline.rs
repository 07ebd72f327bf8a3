//! Heuristic extraction pipeline.
//!
//! Structural extraction with no external services: titles from headings,
//! summaries from leading text, themes from section headings, quotes from
//! blockquotes. Richer extractors implement the same trait and swap in at
//! startup.

use async_trait::async_trait;

use super::{DetectedType, ExtractedDocument, IngestionPipeline, PipelineOutput};
use crate::error::IngestError;

const SUMMARY_MAX_CHARS: usize = 240;
const MAX_THEMES: usize = 5;
const MAX_QUOTES: usize = 5;

/// Extraction pipeline driven entirely by document structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPipeline;

impl HeuristicPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IngestionPipeline for HeuristicPipeline {
    async fn extract(
        &self,
        bytes: &[u8],
        detected_type: DetectedType,
    ) -> Result<PipelineOutput, IngestError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| IngestError::Pipeline("content is not valid UTF-8".to_string()))?;

        let title = match detected_type {
            DetectedType::Markdown => markdown_title(text),
            DetectedType::PlainText | DetectedType::Unknown => first_line_title(text),
        };

        let themes = if detected_type == DetectedType::Markdown {
            markdown_themes(text)
        } else {
            Vec::new()
        };

        let quotes = if detected_type == DetectedType::Markdown {
            markdown_quotes(text)
        } else {
            Vec::new()
        };

        Ok(PipelineOutput {
            document: ExtractedDocument {
                title,
                body: text.to_string(),
            },
            summary: summarize(text),
            themes,
            quotes,
        })
    }
}

/// First `#` heading, falling back to the first non-empty line.
fn markdown_title(text: &str) -> String {
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix('#') {
            let heading = heading.trim_start_matches('#').trim();
            if !heading.is_empty() {
                return heading.to_string();
            }
        }
    }
    first_line_title(text)
}

fn first_line_title(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("Untitled")
        .to_string()
}

/// Leading prose squashed to one line, capped at a char boundary.
fn summarize(text: &str) -> String {
    let mut summary = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('>') {
            if summary.is_empty() {
                continue;
            }
            break;
        }
        if !summary.is_empty() {
            summary.push(' ');
        }
        summary.push_str(trimmed);
        if summary.len() >= SUMMARY_MAX_CHARS {
            break;
        }
    }

    if summary.len() > SUMMARY_MAX_CHARS {
        let cut = summary
            .char_indices()
            .take_while(|(i, _)| *i < SUMMARY_MAX_CHARS)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        summary.truncate(cut);
    }
    summary
}

/// Distinct section headings, in document order.
fn markdown_themes(text: &str) -> Vec<String> {
    let mut themes = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix('#') {
            let heading = heading.trim_start_matches('#').trim();
            if !heading.is_empty() && !themes.iter().any(|t| t == heading) {
                themes.push(heading.to_string());
                if themes.len() >= MAX_THEMES {
                    break;
                }
            }
        }
    }
    themes
}

/// Blockquote lines, in document order.
fn markdown_quotes(text: &str) -> Vec<String> {
    let mut quotes = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(quote) = trimmed.strip_prefix('>') {
            let quote = quote.trim();
            if !quote.is_empty() {
                quotes.push(quote.to_string());
                if quotes.len() >= MAX_QUOTES {
                    break;
                }
            }
        }
    }
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_markdown() {
        let pipeline = HeuristicPipeline::new();
        let text = "# Reading Notes\n\nSome thoughts on the book.\n\n## Memory\n\n> The palest ink beats the best memory.\n";

        let output = pipeline
            .extract(text.as_bytes(), DetectedType::Markdown)
            .await
            .unwrap();

        assert_eq!(output.document.title, "Reading Notes");
        assert_eq!(output.document.body, text);
        assert_eq!(output.summary, "Some thoughts on the book.");
        assert_eq!(output.themes, vec!["Reading Notes", "Memory"]);
        assert_eq!(output.quotes, vec!["The palest ink beats the best memory."]);
    }

    #[tokio::test]
    async fn test_extract_plain_text() {
        let pipeline = HeuristicPipeline::new();
        let text = "Grocery list\nmilk\neggs\n";

        let output = pipeline
            .extract(text.as_bytes(), DetectedType::PlainText)
            .await
            .unwrap();

        assert_eq!(output.document.title, "Grocery list");
        assert!(output.themes.is_empty());
        assert!(output.quotes.is_empty());
    }

    #[tokio::test]
    async fn test_extract_markdown_without_heading() {
        let pipeline = HeuristicPipeline::new();
        let text = "Just a paragraph with no heading.\n";

        let output = pipeline
            .extract(text.as_bytes(), DetectedType::Markdown)
            .await
            .unwrap();

        assert_eq!(output.document.title, "Just a paragraph with no heading.");
    }

    #[tokio::test]
    async fn test_extract_empty_file() {
        let pipeline = HeuristicPipeline::new();

        let output = pipeline
            .extract(b"", DetectedType::Markdown)
            .await
            .unwrap();

        assert_eq!(output.document.title, "Untitled");
        assert!(output.document.body.is_empty());
        assert!(output.summary.is_empty());
    }

    #[tokio::test]
    async fn test_extract_rejects_binary() {
        let pipeline = HeuristicPipeline::new();

        let result = pipeline
            .extract(&[0xff, 0xfe, 0x00, 0x80], DetectedType::Unknown)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_summary_capped() {
        let pipeline = HeuristicPipeline::new();
        let long = "word ".repeat(200);

        let output = pipeline
            .extract(long.as_bytes(), DetectedType::PlainText)
            .await
            .unwrap();

        assert!(output.summary.len() <= SUMMARY_MAX_CHARS);
        assert!(!output.summary.is_empty());
    }

    #[tokio::test]
    async fn test_themes_deduplicated() {
        let pipeline = HeuristicPipeline::new();
        let text = "# Ideas\n\n## Ideas\n\n## Plans\n";

        let output = pipeline
            .extract(text.as_bytes(), DetectedType::Markdown)
            .await
            .unwrap();

        assert_eq!(output.themes, vec!["Ideas", "Plans"]);
    }
}
