//! `SQLite` storage for the sync state.
//!
//! This module provides persistent storage for:
//! - The path index (document identity records)
//! - The blocklist (tombstones for forgotten documents)
//! - Sync sources (watched directories)

mod blocklist;
mod connection;
mod models;
mod path_index;
mod schema;
mod sources;

pub use blocklist::{add_blocked, count_blocked, is_blocked, list_blocked};
pub use connection::Database;
pub use models::{new_document_id, now_unix, BlocklistEntry, PathIndexEntry, SyncSource};
pub use path_index::{
    count_entries, find_by_hash, get_entry, list_entries, remove_entry, update_path, upsert_entry,
};
pub use schema::{migrate, verify_schema, SCHEMA_VERSION};
pub use sources::{
    add_source, get_source, list_enabled_sources, list_sources, remove_source, set_source_enabled,
};

/// Initialize storage with migrations.
///
/// # Errors
///
/// Returns an error if database initialization fails.
pub fn init_storage(db: &Database) -> crate::Result<()> {
    db.with_conn(|conn| {
        migrate(conn)?;
        verify_schema(conn)?;

        tracing::info!("Storage initialized, schema version {SCHEMA_VERSION}");
        Ok(())
    })
}
