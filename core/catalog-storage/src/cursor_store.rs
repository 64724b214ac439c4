//! Sync cursor persistence.
//!
//! The table holds one row that every write overwrites. Reads still take
//! the oldest-created row, so a database written by an append-only writer
//! resumes from the same token it always did.

use crate::error::StorageResult;
use crate::{format_timestamp, lock, parse_timestamp, SharedConnection};
use catalog_types::SyncCursor;
use chrono::{SubsecRound, Utc};
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// Persistent store for the sync cursor.
#[derive(Clone)]
pub struct CursorStore {
    conn: SharedConnection,
}

impl CursorStore {
    /// Opens (or creates) a cursor store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let store = Self {
            conn: crate::open_connection(path.as_ref())?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory cursor store.
    pub fn open_in_memory() -> StorageResult<Self> {
        let store = Self {
            conn: crate::open_memory_connection()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sync_cursors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Returns the current cursor, if one was ever written.
    pub fn read_current(&self) -> StorageResult<Option<SyncCursor>> {
        let conn = lock(&self.conn)?;
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT token, created_at, updated_at FROM sync_cursors
                 ORDER BY created_at ASC, id ASC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(token, created_at, updated_at)| {
            Ok(SyncCursor {
                token,
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            })
        })
        .transpose()
    }

    /// Replaces the stored token. The row's `created_at` survives the
    /// overwrite; `updated_at` moves to now.
    pub fn write_new(&self, token: &str) -> StorageResult<SyncCursor> {
        let mut conn = lock(&self.conn)?;
        // Stored timestamps carry milliseconds; the returned cursor matches.
        let now = Utc::now().trunc_subsecs(3);
        let now_str = format_timestamp(&now);

        let tx = conn.transaction()?;
        let existing: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, created_at FROM sync_cursors ORDER BY created_at ASC, id ASC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let created_at = match existing {
            Some((id, created_at)) => {
                tx.execute(
                    "UPDATE sync_cursors SET token = ?1, updated_at = ?2 WHERE id = ?3",
                    params![token, now_str, id],
                )?;
                let stale = tx.execute("DELETE FROM sync_cursors WHERE id != ?1", params![id])?;
                if stale > 0 {
                    debug!(stale, "Collapsed legacy cursor rows");
                }
                parse_timestamp(&created_at)?
            }
            None => {
                tx.execute(
                    "INSERT INTO sync_cursors (token, created_at, updated_at) VALUES (?1, ?2, ?2)",
                    params![token, now_str],
                )?;
                now
            }
        };
        tx.commit()?;

        Ok(SyncCursor {
            token: token.to_string(),
            created_at,
            updated_at: now,
        })
    }

    /// Removes the cursor so the next sync starts from scratch.
    pub fn clear(&self) -> StorageResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute("DELETE FROM sync_cursors", [])?;
        Ok(())
    }
}
