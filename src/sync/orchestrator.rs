//! The sync run.
//!
//! One orchestrated pass over the watched sources, in strict order:
//! optional pull, discovery, per-file ingestion, path index updates,
//! optional commit and push, status write. Every failure below the
//! storage layer is recorded in the result and the run keeps going;
//! only a broken path index, blocklist, or source table aborts it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::discovery::{discover_async, DiscoveredFile, DiscoveryStats};
use super::git::VersionControl;
use super::status::{write_status, DaemonStatus};
use crate::config::Config;
use crate::error::{Error, GitError, IngestError};
use crate::ingest::{DetectedType, DocumentRecord, Embedder, IngestionPipeline, VectorStore};
use crate::storage::{self, BlocklistEntry, Database, PathIndexEntry};
use crate::Result;

/// Knobs for one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Pull the data repo before discovery.
    pub pull: bool,
    /// Commit and push the data repo after processing.
    pub push: bool,
    /// Stop after discovery and write nothing.
    pub dry_run: bool,
}

/// Counters for the ingestion phase of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Files successfully ingested.
    pub processed: usize,
    /// Titles of the ingested documents, in processing order.
    pub titles: Vec<String>,
    /// Files that failed ingestion and were skipped.
    pub errors: usize,
}

/// Report produced by every sync run. Never persisted by the run itself
/// except as part of the daemon status file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncResult {
    pub git_pulled: bool,
    pub git_pushed: bool,
    /// Pull or push failure, recorded rather than raised.
    pub git_error: Option<String>,
    pub discovery: DiscoveryStats,
    pub processing: ProcessingStats,
}

/// Runs sync passes against the configured sources.
pub struct Orchestrator {
    db: Database,
    config: Config,
    pipeline: Arc<dyn IngestionPipeline>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    git: Arc<dyn VersionControl>,
    started_at: i64,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("data_dir", &self.config.data_dir)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Wire an orchestrator to its collaborators.
    #[must_use]
    pub fn new(
        db: Database,
        config: Config,
        pipeline: Arc<dyn IngestionPipeline>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        git: Arc<dyn VersionControl>,
    ) -> Self {
        Self {
            db,
            config,
            pipeline,
            embedder,
            store,
            git,
            started_at: storage::now_unix(),
        }
    }

    /// Run one sync pass.
    ///
    /// # Errors
    ///
    /// Returns an error only when sync state storage fails. Per-file,
    /// per-source, and git failures are recorded in the returned
    /// [`SyncResult`].
    pub async fn sync(&self, options: SyncOptions) -> Result<SyncResult> {
        tracing::info!(
            pull = options.pull,
            push = options.push,
            dry_run = options.dry_run,
            "Starting sync run"
        );
        let mut result = SyncResult::default();

        if options.pull {
            match self.git.pull(&self.config.data_dir).await {
                Ok(()) => result.git_pulled = true,
                Err(e) => {
                    tracing::warn!(error = %e, "Pull failed, continuing local-only");
                    record_git_error(&mut result, &e);
                }
            }
        }

        // Sources are read fresh every run so config edits apply live
        let sources = self.db.with_conn(|conn| storage::list_enabled_sources(conn))?;
        let outcome = discover_async(self.db.clone(), sources).await?;
        result.discovery = outcome.stats;

        if options.dry_run {
            tracing::info!("Dry run, stopping after discovery");
            return Ok(result);
        }

        for file in &outcome.new_files {
            match self.ingest_file(file).await {
                Ok(title) => {
                    result.processing.processed += 1;
                    result.processing.titles.push(title);
                }
                Err(e @ Error::Storage(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        path = %file.absolute_path.display(),
                        error = %e,
                        "Failed to ingest file, skipping"
                    );
                    result.processing.errors += 1;
                }
            }
        }

        if !outcome.moved_files.is_empty() {
            self.db.with_conn(|conn| {
                for moved in &outcome.moved_files {
                    storage::update_path(
                        conn,
                        &moved.document_id,
                        &moved.file.absolute_path.to_string_lossy(),
                        storage::now_unix(),
                    )?;
                }
                Ok(())
            })?;
        }

        if options.push {
            let message = format!("satchel sync: {} documents", result.processing.processed);
            match self.git.commit_and_push(&self.config.data_dir, &message).await {
                Ok(pushed) => result.git_pushed = pushed,
                Err(e) => {
                    tracing::warn!(error = %e, "Push failed, changes stay local");
                    record_git_error(&mut result, &e);
                }
            }
        }

        self.record_status(&result).await;

        tracing::info!(
            new = result.discovery.new_files,
            existing = result.discovery.existing_files,
            processed = result.processing.processed,
            errors = result.discovery.errors + result.processing.errors,
            "Sync run complete"
        );
        Ok(result)
    }

    /// Forget a document: remove its index entry, block its hash so it is
    /// never re-ingested, delete it from the store, and push the removal.
    ///
    /// Returns false if no such document is indexed.
    ///
    /// # Errors
    ///
    /// Returns an error if sync state storage fails.
    pub async fn forget(&self, document_id: &str) -> Result<bool> {
        let entry = self.db.with_conn(|conn| storage::get_entry(conn, document_id))?;
        let Some(entry) = entry else {
            return Ok(false);
        };

        // The tombstone and the entry removal land together or not at all
        self.db.with_transaction(|conn| {
            storage::add_blocked(conn, &BlocklistEntry::new(entry.content_hash.clone()))?;
            storage::remove_entry(conn, document_id)?;
            Ok(())
        })?;
        tracing::info!(document_id = %document_id, "Forgot document");

        if let Err(e) = self.store.delete(document_id).await {
            tracing::warn!(document_id = %document_id, error = %e, "Failed to delete stored document");
        }

        let message = format!("satchel forget: {document_id}");
        if let Err(e) = self.git.commit_and_push(&self.config.data_dir, &message).await {
            tracing::warn!(error = %e, "Push failed, removal stays local");
        }

        Ok(true)
    }

    /// Ingest one new file end to end. The index entry is written only
    /// after the document is safely in the store.
    async fn ingest_file(&self, file: &DiscoveredFile) -> Result<String> {
        let bytes = tokio::fs::read(&file.absolute_path).await.map_err(|e| {
            IngestError::read(file.absolute_path.to_string_lossy(), e.to_string())
        })?;

        let detected = DetectedType::from_path(&file.absolute_path);
        let output = self.pipeline.extract(&bytes, detected).await?;
        let embedding = self.embedder.embed(&output.document.body).await?;

        let document_id = storage::new_document_id();
        let record = DocumentRecord {
            document_id: document_id.clone(),
            title: output.document.title.clone(),
            body: output.document.body,
            summary: output.summary,
            themes: output.themes,
            quotes: output.quotes,
            project: file.target_project.clone(),
            source_name: file.source_name.clone(),
            source_path: file.absolute_path.to_string_lossy().to_string(),
            content_hash: file.content_hash.clone(),
            ingested_at: storage::now_unix(),
            embedding,
        };
        self.store.store(&record).await?;

        self.db.with_conn(|conn| {
            storage::upsert_entry(
                conn,
                &PathIndexEntry::new(
                    document_id.clone(),
                    file.absolute_path.to_string_lossy().to_string(),
                    file.content_hash.clone(),
                ),
            )
        })?;

        tracing::debug!(
            document_id = %document_id,
            title = %output.document.title,
            path = %file.absolute_path.display(),
            "Ingested document"
        );
        Ok(output.document.title)
    }

    async fn record_status(&self, result: &SyncResult) {
        let status = DaemonStatus {
            pid: std::process::id(),
            started_at: self.started_at,
            last_sync_at: storage::now_unix(),
            last_sync_result: result.clone(),
        };
        // Observers lose one status update, the run itself is fine
        if let Err(e) = write_status(&self.config.status_path(), &status).await {
            tracing::warn!(error = %e, "Failed to write status file");
        }
    }
}

fn record_git_error(result: &mut SyncResult, error: &GitError) {
    let message = error.to_string();
    result.git_error = Some(match result.git_error.take() {
        Some(existing) => format!("{existing}; {message}"),
        None => message,
    });
}
