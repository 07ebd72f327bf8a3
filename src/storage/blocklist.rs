//! Blocklist storage for deleted documents.
//!
//! Append-only set of content hashes that must never be re-ingested.
//! Hashes land here when a document is explicitly forgotten, so a stray
//! copy of the file reappearing in a source does not resurrect it.

use rusqlite::Connection;

use super::models::BlocklistEntry;
use crate::error::StorageError;
use crate::Result;

/// Check whether a content hash is blocked.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn is_blocked(conn: &Connection, content_hash: &str) -> Result<bool> {
    let result = conn.query_row(
        "SELECT 1 FROM blocklist WHERE content_hash = ?",
        [content_hash],
        |_| Ok(true),
    );

    match result {
        Ok(found) => Ok(found),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
        Err(e) => Err(StorageError::Database(e.to_string()).into()),
    }
}

/// Block a content hash. Returns true if it was newly added.
///
/// Already-blocked hashes are left untouched, preserving the original
/// blocked_at timestamp.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn add_blocked(conn: &Connection, entry: &BlocklistEntry) -> Result<bool> {
    let rows = conn
        .execute(
            "INSERT OR IGNORE INTO blocklist (content_hash, blocked_at) VALUES (?, ?)",
            rusqlite::params![entry.content_hash, entry.blocked_at],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(rows > 0)
}

/// List all blocked hashes ordered by when they were blocked.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_blocked(conn: &Connection) -> Result<Vec<BlocklistEntry>> {
    let mut stmt = conn
        .prepare("SELECT content_hash, blocked_at FROM blocklist ORDER BY blocked_at")
        .map_err(|e| StorageError::Database(e.to_string()))?;

    let entries = stmt
        .query_map([], |row| {
            Ok(BlocklistEntry {
                content_hash: row.get(0)?,
                blocked_at: row.get(1)?,
            })
        })
        .map_err(|e| StorageError::Database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::Database(e.to_string()))?;

    Ok(entries)
}

/// Count blocked hashes.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_blocked(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM blocklist", [], |row| row.get(0))
        .map_err(|e| StorageError::Database(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{migrate, Database};

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| migrate(conn)).unwrap();
        db
    }

    #[test]
    fn test_add_and_check() {
        let db = setup_db();

        db.with_conn(|conn| {
            assert!(!is_blocked(conn, "deadbeef")?);

            let added = add_blocked(conn, &BlocklistEntry::new("deadbeef".to_string()))?;
            assert!(added);
            assert!(is_blocked(conn, "deadbeef")?);

            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_add_is_idempotent() {
        let db = setup_db();

        db.with_conn(|conn| {
            let first = BlocklistEntry {
                content_hash: "deadbeef".to_string(),
                blocked_at: 100,
            };
            assert!(add_blocked(conn, &first)?);

            // Re-blocking does not overwrite the original timestamp
            let second = BlocklistEntry {
                content_hash: "deadbeef".to_string(),
                blocked_at: 200,
            };
            assert!(!add_blocked(conn, &second)?);

            let entries = list_blocked(conn)?;
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].blocked_at, 100);

            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_list_and_count() {
        let db = setup_db();

        db.with_conn(|conn| {
            assert_eq!(count_blocked(conn)?, 0);

            add_blocked(
                conn,
                &BlocklistEntry {
                    content_hash: "aaa".to_string(),
                    blocked_at: 2,
                },
            )?;
            add_blocked(
                conn,
                &BlocklistEntry {
                    content_hash: "bbb".to_string(),
                    blocked_at: 1,
                },
            )?;

            assert_eq!(count_blocked(conn)?, 2);

            let entries = list_blocked(conn)?;
            assert_eq!(entries[0].content_hash, "bbb");
            assert_eq!(entries[1].content_hash, "aaa");

            Ok(())
        })
        .unwrap();
    }
}
