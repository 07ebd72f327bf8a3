//! Error types and Result aliases for Satchel.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using Satchel's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Satchel operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database/storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Document ingestion error.
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Version-control error.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Storage-specific errors.
///
/// These are the only errors fatal to a whole sync run: if the path index,
/// blocklist, or source configuration cannot be read or written, nothing
/// is ingested.
#[derive(Error, Debug)]
pub enum StorageError {
    /// `SQLite` database error.
    #[error("database error: {0}")]
    Database(String),

    /// Record not found.
    #[error("not found: {entity} with id '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Per-file ingestion errors.
///
/// Always scoped to a single file: counted in the run result, never
/// propagated past the orchestrator.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Source file could not be read.
    #[error("failed to read '{path}': {reason}")]
    Read { path: String, reason: String },

    /// Pipeline failed to extract a document.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Embedding generation failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector store rejected the document.
    #[error("store error: {0}")]
    Store(String),
}

/// Version-control errors.
///
/// Recorded in the sync result as `git_error`; never fatal to a run.
#[derive(Error, Debug)]
pub enum GitError {
    /// A git subcommand exited non-zero.
    #[error("git {op} failed: {detail}")]
    CommandFailed { op: &'static str, detail: String },

    /// git is missing or the path is not a repository.
    #[error("git unavailable: {0}")]
    Unavailable(String),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Event channel closed or overflowed.
    #[error("event channel error: {0}")]
    Channel(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl StorageError {
    /// Create a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl IngestError {
    /// Create a read error for a path.
    pub fn read(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests;
