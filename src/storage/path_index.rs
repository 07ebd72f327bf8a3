//! Path index storage for incremental sync.
//!
//! Maps each ingested document to the path it was last seen at and the
//! hash of its contents. Lookups by hash drive dedup and move detection.

use rusqlite::Connection;

use super::models::PathIndexEntry;
use crate::error::StorageError;
use crate::Result;

/// Get an index entry by document ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_entry(conn: &Connection, document_id: &str) -> Result<Option<PathIndexEntry>> {
    let result = conn.query_row(
        "SELECT document_id, last_path, content_hash, last_seen_at FROM path_index
         WHERE document_id = ?",
        [document_id],
        |row| {
            Ok(PathIndexEntry {
                document_id: row.get(0)?,
                last_path: row.get(1)?,
                content_hash: row.get(2)?,
                last_seen_at: row.get(3)?,
            })
        },
    );

    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::Database(e.to_string()).into()),
    }
}

/// Find the document a content hash belongs to, if any.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_by_hash(conn: &Connection, content_hash: &str) -> Result<Option<PathIndexEntry>> {
    let result = conn.query_row(
        "SELECT document_id, last_path, content_hash, last_seen_at FROM path_index
         WHERE content_hash = ?",
        [content_hash],
        |row| {
            Ok(PathIndexEntry {
                document_id: row.get(0)?,
                last_path: row.get(1)?,
                content_hash: row.get(2)?,
                last_seen_at: row.get(3)?,
            })
        },
    );

    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::Database(e.to_string()).into()),
    }
}

/// Insert or replace an index entry.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn upsert_entry(conn: &Connection, entry: &PathIndexEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO path_index (document_id, last_path, content_hash, last_seen_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(document_id) DO UPDATE SET
             last_path = excluded.last_path,
             content_hash = excluded.content_hash,
             last_seen_at = excluded.last_seen_at",
        rusqlite::params![
            entry.document_id,
            entry.last_path,
            entry.content_hash,
            entry.last_seen_at
        ],
    )
    .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(())
}

/// Record that a document was seen at a new path.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn update_path(
    conn: &Connection,
    document_id: &str,
    last_path: &str,
    last_seen_at: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE path_index SET last_path = ?, last_seen_at = ? WHERE document_id = ?",
        rusqlite::params![last_path, last_seen_at, document_id],
    )
    .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(())
}

/// Remove an index entry. Returns true if an entry existed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn remove_entry(conn: &Connection, document_id: &str) -> Result<bool> {
    let rows = conn
        .execute("DELETE FROM path_index WHERE document_id = ?", [document_id])
        .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(rows > 0)
}

/// List all index entries ordered by path.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_entries(conn: &Connection) -> Result<Vec<PathIndexEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT document_id, last_path, content_hash, last_seen_at FROM path_index
             ORDER BY last_path",
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

    let entries = stmt
        .query_map([], |row| {
            Ok(PathIndexEntry {
                document_id: row.get(0)?,
                last_path: row.get(1)?,
                content_hash: row.get(2)?,
                last_seen_at: row.get(3)?,
            })
        })
        .map_err(|e| StorageError::Database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::Database(e.to_string()))?;

    Ok(entries)
}

/// Count indexed documents.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_entries(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM path_index", [], |row| row.get(0))
        .map_err(|e| StorageError::Database(e.to_string()).into())
}
