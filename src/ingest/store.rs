//! JSON-file document store.
//!
//! Persists each document as `<document_id>.json` under the data repo's
//! `documents/` directory, so the corpus syncs across machines through
//! the same git remote as the rest of the repo.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{DocumentFilters, DocumentRecord, VectorStore};
use crate::error::IngestError;

/// Document store backed by one JSON file per document.
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    root: PathBuf,
}

impl JsonDocumentStore {
    /// Create a store rooted at the given directory. The directory is
    /// created on first write, not here.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory documents are stored under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, document_id: &str) -> PathBuf {
        self.root.join(format!("{document_id}.json"))
    }
}

#[async_trait]
impl VectorStore for JsonDocumentStore {
    async fn store(&self, record: &DocumentRecord) -> Result<(), IngestError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| IngestError::Store(format!("create documents dir: {e}")))?;

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| IngestError::Store(format!("serialize document: {e}")))?;

        let path = self.document_path(&record.document_id);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| IngestError::Store(format!("write {}: {e}", path.display())))?;

        tracing::debug!(
            document_id = %record.document_id,
            path = %path.display(),
            "Stored document"
        );
        Ok(())
    }

    async fn exists(&self, document_id: &str) -> Result<bool, IngestError> {
        tokio::fs::try_exists(self.document_path(document_id))
            .await
            .map_err(|e| IngestError::Store(e.to_string()))
    }

    async fn get_all(&self, filters: &DocumentFilters) -> Result<Vec<DocumentRecord>, IngestError> {
        let mut records = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // No directory yet means no documents yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(IngestError::Store(format!("read documents dir: {e}"))),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| IngestError::Store(format!("read {}: {e}", path.display())))?;

            let record: DocumentRecord = match serde_json::from_slice(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    // A corrupt file should not hide the rest of the corpus
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                    continue;
                }
            };

            if let Some(project) = &filters.project {
                if &record.project != project {
                    continue;
                }
            }
            if let Some(source) = &filters.source {
                if &record.source_name != source {
                    continue;
                }
            }

            records.push(record);
        }

        records.sort_by(|a, b| b.ingested_at.cmp(&a.ingested_at));
        Ok(records)
    }

    async fn delete(&self, document_id: &str) -> Result<bool, IngestError> {
        let path = self.document_path(document_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(IngestError::Store(format!(
                "delete {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_record(id: &str, project: &str, ingested_at: i64) -> DocumentRecord {
        DocumentRecord {
            document_id: id.to_string(),
            title: format!("Title {id}"),
            body: "body".to_string(),
            summary: "summary".to_string(),
            themes: vec!["theme".to_string()],
            quotes: Vec::new(),
            project: project.to_string(),
            source_name: "notes".to_string(),
            source_path: "/notes/a.md".to_string(),
            content_hash: format!("hash-{id}"),
            ingested_at,
            embedding: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_store_and_exists() {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(dir.path().join("documents"));

        assert!(!store.exists("doc-1").await.unwrap());

        store.store(&sample_record("doc-1", "personal", 1)).await.unwrap();

        assert!(store.exists("doc-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_all_empty_when_no_directory() {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(dir.path().join("documents"));

        let records = store.get_all(&DocumentFilters::default()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_get_all_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(dir.path().join("documents"));

        store.store(&sample_record("old", "personal", 100)).await.unwrap();
        store.store(&sample_record("new", "personal", 200)).await.unwrap();

        let records = store.get_all(&DocumentFilters::default()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].document_id, "new");
        assert_eq!(records[1].document_id, "old");
    }

    #[tokio::test]
    async fn test_get_all_filters_by_project() {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(dir.path().join("documents"));

        store.store(&sample_record("a", "personal", 1)).await.unwrap();
        store.store(&sample_record("b", "research", 2)).await.unwrap();

        let filters = DocumentFilters {
            project: Some("research".to_string()),
            source: None,
        };
        let records = store.get_all(&filters).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document_id, "b");
    }

    #[tokio::test]
    async fn test_get_all_skips_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("documents");
        let store = JsonDocumentStore::new(&root);

        store.store(&sample_record("good", "personal", 1)).await.unwrap();
        tokio::fs::write(root.join("bad.json"), b"not json")
            .await
            .unwrap();

        let records = store.get_all(&DocumentFilters::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document_id, "good");
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(dir.path().join("documents"));

        store.store(&sample_record("doc-1", "personal", 1)).await.unwrap();

        assert!(store.delete("doc-1").await.unwrap());
        assert!(!store.exists("doc-1").await.unwrap());
        assert!(!store.delete("doc-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(dir.path().join("documents"));

        store.store(&sample_record("doc-1", "personal", 1)).await.unwrap();

        let mut updated = sample_record("doc-1", "personal", 2);
        updated.title = "Updated".to_string();
        store.store(&updated).await.unwrap();

        let records = store.get_all(&DocumentFilters::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Updated");
    }
}
