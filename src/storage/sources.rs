//! Sync source storage.
//!
//! Sources are the persisted watch configuration: each row names a root
//! directory, a glob pattern, and the project its documents belong to.
//! The orchestrator reads them fresh at the start of every run, so edits
//! take effect without a restart.

use rusqlite::Connection;

use super::models::SyncSource;
use crate::error::StorageError;
use crate::Result;

fn row_to_source(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncSource> {
    Ok(SyncSource {
        name: row.get(0)?,
        root_path: row.get(1)?,
        glob_pattern: row.get(2)?,
        target_project: row.get(3)?,
        enabled: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
    })
}

/// Add a new source.
///
/// # Errors
///
/// Returns an error if a source with the same name already exists or the
/// database operation fails.
pub fn add_source(conn: &Connection, source: &SyncSource) -> Result<()> {
    conn.execute(
        "INSERT INTO sources (name, root_path, glob_pattern, target_project, enabled, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            source.name,
            source.root_path,
            source.glob_pattern,
            source.target_project,
            i64::from(source.enabled),
            source.created_at
        ],
    )
    .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(())
}

/// Get a source by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_source(conn: &Connection, name: &str) -> Result<Option<SyncSource>> {
    let result = conn.query_row(
        "SELECT name, root_path, glob_pattern, target_project, enabled, created_at
         FROM sources WHERE name = ?",
        [name],
        row_to_source,
    );

    match result {
        Ok(source) => Ok(Some(source)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::Database(e.to_string()).into()),
    }
}

/// List all sources ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_sources(conn: &Connection) -> Result<Vec<SyncSource>> {
    let mut stmt = conn
        .prepare(
            "SELECT name, root_path, glob_pattern, target_project, enabled, created_at
             FROM sources ORDER BY name",
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

    let sources = stmt
        .query_map([], row_to_source)
        .map_err(|e| StorageError::Database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::Database(e.to_string()))?;

    Ok(sources)
}

/// List enabled sources ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_enabled_sources(conn: &Connection) -> Result<Vec<SyncSource>> {
    let mut stmt = conn
        .prepare(
            "SELECT name, root_path, glob_pattern, target_project, enabled, created_at
             FROM sources WHERE enabled = 1 ORDER BY name",
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

    let sources = stmt
        .query_map([], row_to_source)
        .map_err(|e| StorageError::Database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::Database(e.to_string()))?;

    Ok(sources)
}

/// Enable or disable a source. Returns true if the source existed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn set_source_enabled(conn: &Connection, name: &str, enabled: bool) -> Result<bool> {
    let rows = conn
        .execute(
            "UPDATE sources SET enabled = ? WHERE name = ?",
            rusqlite::params![i64::from(enabled), name],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(rows > 0)
}

/// Remove a source. Returns true if the source existed.
///
/// Removal does not touch the path index or blocklist; documents already
/// ingested from the source stay known.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn remove_source(conn: &Connection, name: &str) -> Result<bool> {
    let rows = conn
        .execute("DELETE FROM sources WHERE name = ?", [name])
        .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(rows > 0)
}
