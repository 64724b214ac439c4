//! SQLite storage layer for the product catalog.
//!
//! Provides the two stores the service persists to:
//!
//! - [`ProductStore`]: product rows, filtered through adapter predicates,
//!   upserted on the `(integration, external_id)` natural key and soft
//!   deleted by stamping `deleted_at`
//! - [`CursorStore`]: the single sync cursor row used to resume imports
//!
//! Both stores share the same connection handling: an `Arc<Mutex<Connection>>`
//! opened from a path or in memory, with the schema created on open.

mod cursor_store;
mod error;
mod product_store;
pub mod sql;

pub use cursor_store::CursorStore;
pub use error::{StorageError, StorageResult};
pub use product_store::ProductStore;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// How long a connection waits on a locked database file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) type SharedConnection = Arc<Mutex<Connection>>;

pub(crate) fn open_connection(path: &Path) -> StorageResult<SharedConnection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub(crate) fn open_memory_connection() -> StorageResult<SharedConnection> {
    Ok(Arc::new(Mutex::new(Connection::open_in_memory()?)))
}

pub(crate) fn lock(conn: &SharedConnection) -> StorageResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StorageError::Poisoned("connection mutex poisoned".into()))
}

/// Timestamps are stored as RFC 3339 text with millisecond precision and a
/// `Z` suffix, so lexical order matches chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("bad timestamp {raw:?}: {e}")))
}
