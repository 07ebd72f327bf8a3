//! No-op embedder.

use async_trait::async_trait;

use super::Embedder;
use crate::error::IngestError;

/// Embedder used when no embedding backend is configured.
///
/// Produces empty vectors, so documents are stored and listable but
/// carry no similarity signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmbedder;

impl NullEmbedder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Embedder for NullEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, IngestError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embed_returns_empty() {
        let embedder = NullEmbedder::new();
        let vector = embedder.embed("some text").await.unwrap();
        assert!(vector.is_empty());
    }

    #[tokio::test]
    async fn test_embed_batch_matches_input_length() {
        let embedder = NullEmbedder::new();
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 3);
    }
}
