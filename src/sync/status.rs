//! Daemon status file.
//!
//! A small JSON record written after every sync run. Other processes
//! read it to answer "is the daemon up, when did it last sync" without
//! any IPC. It is purely an observer surface; the scheduler never reads
//! it back for its own decisions.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::SyncResult;
use crate::Result;

/// Snapshot of the daemon written after each sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonStatus {
    /// Process ID of the writer.
    pub pid: u32,
    /// Unix timestamp the process started.
    pub started_at: i64,
    /// Unix timestamp of the last completed sync run.
    pub last_sync_at: i64,
    /// Result of the last completed sync run.
    pub last_sync_result: SyncResult,
}

/// Write the status file, replacing any previous record.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub async fn write_status(path: &Path, status: &DaemonStatus) -> Result<()> {
    let json = serde_json::to_vec_pretty(status)?;
    tokio::fs::write(path, json).await?;
    tracing::debug!(path = %path.display(), "Wrote daemon status");
    Ok(())
}

/// Read the status file. Missing or unparseable files read as `None`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub async fn read_status(path: &Path) -> Result<Option<DaemonStatus>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice(&bytes) {
        Ok(status) => Ok(Some(status)),
        Err(e) => {
            // A half-written file from a dying process reads as no status
            tracing::warn!(path = %path.display(), error = %e, "Unparseable status file");
            Ok(None)
        }
    }
}

/// Render a status record as human-readable text.
///
/// `now` is injected so output is deterministic.
#[must_use]
pub fn render_status(status: Option<&DaemonStatus>, now: i64) -> String {
    let Some(status) = status else {
        return "no daemon status recorded\n".to_string();
    };

    let started = chrono::DateTime::<chrono::Utc>::from_timestamp(status.started_at, 0)
        .map_or_else(|| "unknown".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    let result = &status.last_sync_result;
    let mut out = String::new();
    out.push_str(&format!("daemon pid {}, started {started}\n", status.pid));
    out.push_str(&format!(
        "last sync {}: pulled {}, pushed {}\n",
        format_ago(now - status.last_sync_at),
        yes_no(result.git_pulled),
        yes_no(result.git_pushed),
    ));
    if let Some(error) = &result.git_error {
        out.push_str(&format!("  git error: {error}\n"));
    }
    out.push_str(&format!(
        "  discovery: {} total, {} new, {} existing, {} blocked, {} errors\n",
        result.discovery.total_files,
        result.discovery.new_files,
        result.discovery.existing_files,
        result.discovery.blocked,
        result.discovery.errors,
    ));
    out.push_str(&format!(
        "  processing: {} processed, {} errors\n",
        result.processing.processed, result.processing.errors,
    ));
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn format_ago(delta: i64) -> String {
    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        format!("{}m ago", delta / 60)
    } else if delta < 86400 {
        format!("{}h ago", delta / 3600)
    } else {
        format!("{}d ago", delta / 86400)
    }
}
