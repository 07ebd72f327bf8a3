//! Source discovery and classification.
//!
//! Walks each enabled sync source, hashes every file matching the source's
//! glob, and classifies it against the path index and blocklist:
//! - hash on the blocklist: skipped, never re-ingested
//! - hash already indexed: existing document (a changed path is a move)
//! - otherwise: new, queued for ingestion
//!
//! Discovery is read-only. Index updates for new and moved files happen
//! in the orchestrator, after ingestion, so a dry run writes nothing.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use globset::Glob;
use ignore::WalkBuilder;

use crate::storage::{self, Database, SyncSource};
use crate::Result;

/// A file found under a sync source during one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Absolute path on disk.
    pub absolute_path: PathBuf,
    /// Path relative to the source root.
    pub relative_path: PathBuf,
    /// blake3 digest of the file contents.
    pub content_hash: String,
    /// File size in bytes.
    pub size: u64,
    /// Modification time as a Unix timestamp.
    pub mtime: i64,
    /// Name of the source the file was found under.
    pub source_name: String,
    /// Project documents from this source are filed under.
    pub target_project: String,
}

/// An indexed document found at a different path than last time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedFile {
    pub document_id: String,
    pub file: DiscoveredFile,
}

/// Aggregate counters for one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiscoveryStats {
    /// Sources that were actually walked.
    pub sources_scanned: usize,
    /// Files matching a source glob, including blocked and errored ones.
    pub total_files: usize,
    pub new_files: usize,
    pub existing_files: usize,
    /// Files skipped because their hash is on the blocklist.
    pub blocked: usize,
    /// Per-file and per-source failures (unreadable file, missing root).
    pub errors: usize,
}

/// Everything one discovery pass produces.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    /// Files queued for ingestion.
    pub new_files: Vec<DiscoveredFile>,
    /// Indexed documents whose path pointer is stale.
    pub moved_files: Vec<MovedFile>,
    pub stats: DiscoveryStats,
}

/// Scan the given sources and classify every matching file.
///
/// Blocking; call [`discover_async`] from async contexts.
///
/// # Errors
///
/// Returns an error only if the path index or blocklist cannot be read.
/// Per-file and per-source failures are counted in the stats instead.
pub fn discover(db: &Database, sources: &[SyncSource]) -> Result<DiscoveryOutcome> {
    // Snapshot index and blocklist once; classification is in-memory
    let (entries, blocked_entries) = db.with_conn(|conn| {
        Ok((storage::list_entries(conn)?, storage::list_blocked(conn)?))
    })?;

    let index_by_hash: HashMap<String, (String, String)> = entries
        .into_iter()
        .map(|e| (e.content_hash, (e.document_id, e.last_path)))
        .collect();
    let blocklist: HashSet<String> = blocked_entries
        .into_iter()
        .map(|b| b.content_hash)
        .collect();

    let mut scan = Scan {
        index_by_hash: &index_by_hash,
        blocklist: &blocklist,
        pending_hashes: HashSet::new(),
        anchored: HashSet::new(),
        outcome: DiscoveryOutcome::default(),
    };

    for source in sources {
        if !source.enabled {
            tracing::debug!(source = %source.name, "Skipping disabled source");
            continue;
        }
        scan.scan_source(source);
    }

    let mut outcome = scan.outcome;
    // A document also seen at its recorded path has not moved; a copy at
    // a second path must not flip the pointer back and forth across runs
    let anchored = scan.anchored;
    outcome
        .moved_files
        .retain(|m| !anchored.contains(&m.document_id));

    tracing::info!(
        sources = outcome.stats.sources_scanned,
        total = outcome.stats.total_files,
        new = outcome.stats.new_files,
        existing = outcome.stats.existing_files,
        blocked = outcome.stats.blocked,
        errors = outcome.stats.errors,
        "Discovery complete"
    );

    Ok(outcome)
}

/// Async wrapper running [`discover`] on the blocking pool.
///
/// # Errors
///
/// Returns an error if the scan task panics or storage reads fail.
pub async fn discover_async(db: Database, sources: Vec<SyncSource>) -> Result<DiscoveryOutcome> {
    tokio::task::spawn_blocking(move || discover(&db, &sources))
        .await
        .map_err(|e| crate::Error::internal(format!("Discovery task failed: {e}")))?
}

/// Working state for one discovery pass.
struct Scan<'a> {
    /// content_hash -> (document_id, last_path) snapshot of the index.
    index_by_hash: &'a HashMap<String, (String, String)>,
    blocklist: &'a HashSet<String>,
    /// Hashes already queued as new in this pass; a second copy of the
    /// same bytes is the same document, not a second candidate.
    pending_hashes: HashSet<String>,
    /// Documents seen at exactly their recorded path in this pass.
    anchored: HashSet<String>,
    outcome: DiscoveryOutcome,
}

impl Scan<'_> {
    fn scan_source(&mut self, source: &SyncSource) {
        let root = Path::new(&source.root_path);
        if !root.is_dir() {
            tracing::warn!(
                source = %source.name,
                root = %root.display(),
                "Source root missing, skipping source"
            );
            self.outcome.stats.errors += 1;
            return;
        }

        let matcher = match Glob::new(&source.glob_pattern) {
            Ok(glob) => glob.compile_matcher(),
            Err(e) => {
                tracing::warn!(
                    source = %source.name,
                    pattern = %source.glob_pattern,
                    error = %e,
                    "Invalid glob pattern, skipping source"
                );
                self.outcome.stats.errors += 1;
                return;
            }
        };

        tracing::debug!(source = %source.name, root = %root.display(), "Scanning source");
        self.outcome.stats.sources_scanned += 1;

        let walker = WalkBuilder::new(root)
            .hidden(true) // Skip dotfiles
            .git_ignore(true) // Respect .gitignore within source dirs
            .git_global(false)
            .git_exclude(false)
            .ignore(true) // Respect .ignore files
            .parents(false) // Sources are self-contained roots
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(source = %source.name, error = %e, "Error walking source");
                    self.outcome.stats.errors += 1;
                    continue;
                }
            };

            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if !matcher.is_match(relative) {
                continue;
            }

            self.outcome.stats.total_files += 1;
            self.classify_file(source, path, relative);
        }
    }

    fn classify_file(&mut self, source: &SyncSource, path: &Path, relative: &Path) {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot stat file, skipping");
                self.outcome.stats.errors += 1;
                return;
            }
        };

        let hash = match super::hash_file(path) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot hash file, skipping");
                self.outcome.stats.errors += 1;
                return;
            }
        };

        if self.blocklist.contains(&hash) {
            tracing::debug!(path = %path.display(), "Hash is blocklisted, skipping");
            self.outcome.stats.blocked += 1;
            return;
        }

        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(0));

        let file = DiscoveredFile {
            absolute_path: path.to_path_buf(),
            relative_path: relative.to_path_buf(),
            content_hash: hash.clone(),
            size: metadata.len(),
            mtime,
            source_name: source.name.clone(),
            target_project: source.target_project.clone(),
        };

        if let Some((document_id, last_path)) = self.index_by_hash.get(&hash) {
            self.outcome.stats.existing_files += 1;
            if last_path == &path.to_string_lossy() {
                self.anchored.insert(document_id.clone());
            } else if !self.outcome.moved_files.iter().any(|m| &m.document_id == document_id) {
                tracing::debug!(
                    document_id = %document_id,
                    from = %last_path,
                    to = %path.display(),
                    "Document moved"
                );
                self.outcome.moved_files.push(MovedFile {
                    document_id: document_id.clone(),
                    file,
                });
            }
            return;
        }

        if self.pending_hashes.contains(&hash) {
            tracing::debug!(path = %path.display(), "Duplicate of a file already queued");
            self.outcome.stats.existing_files += 1;
            return;
        }

        self.pending_hashes.insert(hash);
        self.outcome.stats.new_files += 1;
        self.outcome.new_files.push(file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{migrate, BlocklistEntry, PathIndexEntry};
    use crate::sync::hash_bytes;
    use std::fs;
    use tempfile::TempDir;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| migrate(conn)).unwrap();
        db
    }

    fn source_for(root: &Path) -> SyncSource {
        SyncSource::new(
            "notes".to_string(),
            root.to_string_lossy().to_string(),
            "**/*.md".to_string(),
            "personal".to_string(),
        )
    }

    #[test]
    fn test_three_new_files() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();
        fs::write(tmp.path().join("b.md"), "# B\n").unwrap();
        fs::write(tmp.path().join("c.md"), "# C\n").unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        assert_eq!(outcome.stats.sources_scanned, 1);
        assert_eq!(outcome.stats.total_files, 3);
        assert_eq!(outcome.stats.new_files, 3);
        assert_eq!(outcome.stats.existing_files, 0);
        assert_eq!(outcome.stats.errors, 0);
        assert_eq!(outcome.new_files.len(), 3);
    }

    #[test]
    fn test_indexed_files_are_existing() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.md");
        fs::write(&path, "# A\n").unwrap();

        db.with_conn(|conn| {
            storage::upsert_entry(
                conn,
                &PathIndexEntry::new(
                    "doc-1".to_string(),
                    path.to_string_lossy().to_string(),
                    hash_bytes(b"# A\n"),
                ),
            )
        })
        .unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        assert_eq!(outcome.stats.new_files, 0);
        assert_eq!(outcome.stats.existing_files, 1);
        // Same path: not a move
        assert!(outcome.moved_files.is_empty());
    }

    #[test]
    fn test_move_detection() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        let new_path = tmp.path().join("renamed.md");
        fs::write(&new_path, "# A\n").unwrap();

        db.with_conn(|conn| {
            storage::upsert_entry(
                conn,
                &PathIndexEntry::new(
                    "doc-1".to_string(),
                    tmp.path().join("original.md").to_string_lossy().to_string(),
                    hash_bytes(b"# A\n"),
                ),
            )
        })
        .unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        assert_eq!(outcome.stats.new_files, 0);
        assert_eq!(outcome.stats.existing_files, 1);
        assert_eq!(outcome.moved_files.len(), 1);
        assert_eq!(outcome.moved_files[0].document_id, "doc-1");
        assert_eq!(outcome.moved_files[0].file.absolute_path, new_path);
    }

    #[test]
    fn test_blocklisted_hash_skipped() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("deleted.md"), "# Gone\n").unwrap();

        db.with_conn(|conn| {
            storage::add_blocked(conn, &BlocklistEntry::new(hash_bytes(b"# Gone\n")))
        })
        .unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        // Neither new nor existing, silently skipped
        assert_eq!(outcome.stats.total_files, 1);
        assert_eq!(outcome.stats.new_files, 0);
        assert_eq!(outcome.stats.existing_files, 0);
        assert_eq!(outcome.stats.blocked, 1);
        assert_eq!(outcome.stats.errors, 0);
    }

    #[test]
    fn test_missing_root_is_source_error() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();

        let missing = SyncSource::new(
            "ghost".to_string(),
            "/nonexistent/satchel-test-root".to_string(),
            "**/*.md".to_string(),
            "personal".to_string(),
        );

        let outcome = discover(&db, &[missing, source_for(tmp.path())]).unwrap();

        // The good source still scans
        assert_eq!(outcome.stats.sources_scanned, 1);
        assert_eq!(outcome.stats.errors, 1);
        assert_eq!(outcome.stats.new_files, 1);
    }

    #[test]
    fn test_glob_filters_files() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("note.md"), "# Note\n").unwrap();
        fs::write(tmp.path().join("image.png"), [0xffu8, 0xd8]).unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        assert_eq!(outcome.stats.total_files, 1);
        assert_eq!(outcome.stats.new_files, 1);
    }

    #[test]
    fn test_glob_matches_nested_dirs() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("journal").join("2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("entry.md"), "# Entry\n").unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        assert_eq!(outcome.stats.new_files, 1);
        assert_eq!(
            outcome.new_files[0].relative_path,
            Path::new("journal/2024/entry.md")
        );
    }

    #[test]
    fn test_zero_byte_file_is_a_normal_candidate() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("empty.md"), "").unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        assert_eq!(outcome.stats.new_files, 1);
        assert_eq!(outcome.new_files[0].size, 0);
        assert_eq!(outcome.new_files[0].content_hash, hash_bytes(b""));
    }

    #[test]
    fn test_copy_at_second_path_does_not_move_anchored_document() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        let original = tmp.path().join("a.md");
        fs::write(&original, "# A\n").unwrap();
        fs::write(tmp.path().join("copy.md"), "# A\n").unwrap();

        db.with_conn(|conn| {
            storage::upsert_entry(
                conn,
                &PathIndexEntry::new(
                    "doc-1".to_string(),
                    original.to_string_lossy().to_string(),
                    hash_bytes(b"# A\n"),
                ),
            )
        })
        .unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        // Both copies count as existing, but the pointer stays put
        assert_eq!(outcome.stats.existing_files, 2);
        assert!(outcome.moved_files.is_empty());
    }

    #[test]
    fn test_duplicate_content_in_one_scan() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "# Same\n").unwrap();
        fs::write(tmp.path().join("b.md"), "# Same\n").unwrap();

        let outcome = discover(&db, &[source_for(tmp.path())]).unwrap();

        // One candidate, the copy counts as existing
        assert_eq!(outcome.stats.total_files, 2);
        assert_eq!(outcome.stats.new_files, 1);
        assert_eq!(outcome.stats.existing_files, 1);
    }

    #[test]
    fn test_disabled_source_skipped() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();

        let mut source = source_for(tmp.path());
        source.enabled = false;

        let outcome = discover(&db, &[source]).unwrap();

        assert_eq!(outcome.stats.sources_scanned, 0);
        assert_eq!(outcome.stats.total_files, 0);
    }

    #[tokio::test]
    async fn test_discover_async() {
        let db = setup_db();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();

        let outcome = discover_async(db, vec![source_for(tmp.path())])
            .await
            .unwrap();

        assert_eq!(outcome.stats.new_files, 1);
    }
}
