//! Data models for storage operations.
//!
//! This module defines the core data structures used for:
//! - Sync sources (watched directories)
//! - Path index entries (document identity records)
//! - Blocklist entries (tombstones for deleted documents)

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp.
#[must_use]
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(0))
        .unwrap_or(0)
}

/// Generate a fresh document ID.
#[must_use]
pub fn new_document_id() -> String {
    format!("doc_{}", uuid::Uuid::new_v4().simple())
}

/// A watched source directory with a glob pattern for matching files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSource {
    /// Unique source name (e.g., "notes", "clippings").
    pub name: String,

    /// Absolute root directory to scan.
    pub root_path: String,

    /// Glob pattern relative to the root (e.g., "**/*.md").
    pub glob_pattern: String,

    /// Project that documents from this source are filed under.
    pub target_project: String,

    /// Disabled sources are skipped during discovery.
    pub enabled: bool,

    /// Unix timestamp when the source was added.
    pub created_at: i64,
}

impl SyncSource {
    /// Create a new enabled source.
    #[must_use]
    pub fn new(
        name: String,
        root_path: String,
        glob_pattern: String,
        target_project: String,
    ) -> Self {
        Self {
            name,
            root_path,
            glob_pattern,
            target_project,
            enabled: true,
            created_at: now_unix(),
        }
    }
}

/// One ingested document's identity record.
///
/// The content hash is the identity key: a file whose hash matches an
/// existing entry is the same document, even at a different path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathIndexEntry {
    /// Stable document identifier assigned at ingestion.
    pub document_id: String,

    /// Path the document was most recently seen at.
    pub last_path: String,

    /// Hex digest of the file contents.
    pub content_hash: String,

    /// Unix timestamp of the last sync that observed this document.
    pub last_seen_at: i64,
}

impl PathIndexEntry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(document_id: String, last_path: String, content_hash: String) -> Self {
        Self {
            document_id,
            last_path,
            content_hash,
            last_seen_at: now_unix(),
        }
    }
}

/// A content hash that must never be re-ingested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlocklistEntry {
    /// Hex digest of the blocked content.
    pub content_hash: String,

    /// Unix timestamp when the hash was blocked.
    pub blocked_at: i64,
}

impl BlocklistEntry {
    /// Block a hash as of now.
    #[must_use]
    pub fn new(content_hash: String) -> Self {
        Self {
            content_hash,
            blocked_at: now_unix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_unix_is_positive() {
        assert!(now_unix() > 0);
    }

    #[test]
    fn test_new_document_id_unique() {
        let a = new_document_id();
        let b = new_document_id();

        assert!(a.starts_with("doc_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_sync_source_new() {
        let source = SyncSource::new(
            "notes".to_string(),
            "/home/user/notes".to_string(),
            "**/*.md".to_string(),
            "personal".to_string(),
        );

        assert_eq!(source.name, "notes");
        assert_eq!(source.glob_pattern, "**/*.md");
        assert!(source.enabled);
        assert!(source.created_at > 0);
    }

    #[test]
    fn test_path_index_entry_new() {
        let entry = PathIndexEntry::new(
            "doc-1".to_string(),
            "/notes/a.md".to_string(),
            "abc123".to_string(),
        );

        assert_eq!(entry.document_id, "doc-1");
        assert_eq!(entry.last_path, "/notes/a.md");
        assert_eq!(entry.content_hash, "abc123");
        assert!(entry.last_seen_at > 0);
    }

    #[test]
    fn test_blocklist_entry_new() {
        let entry = BlocklistEntry::new("deadbeef".to_string());

        assert_eq!(entry.content_hash, "deadbeef");
        assert!(entry.blocked_at > 0);
    }

    #[test]
    fn test_sync_source_serialization() {
        let source = SyncSource::new(
            "clippings".to_string(),
            "/tmp/clips".to_string(),
            "*.txt".to_string(),
            "research".to_string(),
        );

        let json = serde_json::to_string(&source).unwrap();
        let parsed: SyncSource = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, source);
    }

    #[test]
    fn test_path_index_entry_serialization() {
        let entry = PathIndexEntry::new(
            "doc-9".to_string(),
            "/notes/z.md".to_string(),
            "ff00".to_string(),
        );

        let json = serde_json::to_string(&entry).unwrap();
        let parsed: PathIndexEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, entry);
    }
}
