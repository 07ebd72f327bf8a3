//! Document ingestion collaborators.
//!
//! This module defines the trait seams the sync orchestrator hands new
//! files to:
//! - [`IngestionPipeline`]: raw bytes to document, summary, themes, quotes
//! - [`Embedder`]: text to embedding vector
//! - [`VectorStore`]: persistence and retrieval of ingested documents
//!
//! Concrete implementations are selected at startup and injected as trait
//! objects, keeping the sync core independent of any particular backend.

mod embed;
mod pipeline;
mod store;

pub use embed::NullEmbedder;
pub use pipeline::HeuristicPipeline;
pub use store::JsonDocumentStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::IngestError;

/// Content type detected from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectedType {
    Markdown,
    PlainText,
    Unknown,
}

impl DetectedType {
    /// Detect a file's content type from its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md" | "markdown") => Self::Markdown,
            Some("txt" | "text") => Self::PlainText,
            _ => Self::Unknown,
        }
    }
}

/// Title and body extracted from a file's raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub title: String,
    pub body: String,
}

/// Everything the ingestion pipeline produces for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub document: ExtractedDocument,
    pub summary: String,
    pub themes: Vec<String>,
    pub quotes: Vec<String>,
}

/// A fully ingested document as persisted by the document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    /// Stable document identifier, matches the path index.
    pub document_id: String,
    pub title: String,
    pub body: String,
    pub summary: String,
    pub themes: Vec<String>,
    pub quotes: Vec<String>,
    /// Project the document is filed under (from its sync source).
    pub project: String,
    /// Name of the sync source the document came from.
    pub source_name: String,
    /// Path the document was ingested from.
    pub source_path: String,
    /// Hex digest of the original file contents.
    pub content_hash: String,
    /// Unix timestamp of ingestion.
    pub ingested_at: i64,
    /// Embedding vector; empty when no embedding backend is configured.
    pub embedding: Vec<f32>,
}

/// Filters for listing stored documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilters {
    pub project: Option<String>,
    pub source: Option<String>,
}

/// Turns raw file bytes into a structured document.
///
/// Failures are per-file: the orchestrator counts them and moves on to
/// the next file.
#[async_trait]
pub trait IngestionPipeline: Send + Sync {
    /// Extract a document, summary, themes, and quotes from raw bytes.
    async fn extract(
        &self,
        bytes: &[u8],
        detected_type: DetectedType,
    ) -> Result<PipelineOutput, IngestError>;
}

/// Produces embedding vectors for document text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError>;

    /// Embed a batch of texts. The default implementation embeds
    /// sequentially; backends with batch endpoints should override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Persistent store for ingested documents and their vectors.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist a document record.
    async fn store(&self, record: &DocumentRecord) -> Result<(), IngestError>;

    /// Check whether a document is already stored.
    async fn exists(&self, document_id: &str) -> Result<bool, IngestError>;

    /// Fetch all stored documents matching the filters.
    async fn get_all(&self, filters: &DocumentFilters) -> Result<Vec<DocumentRecord>, IngestError>;

    /// Remove a stored document. Returns true if it existed.
    async fn delete(&self, document_id: &str) -> Result<bool, IngestError>;
}
