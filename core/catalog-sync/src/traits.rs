//! Collaborator interfaces the sync engine and import workers depend on.

use crate::entry::{ImportJob, SyncPage};
use crate::error::SyncResult;
use async_trait::async_trait;
use catalog_types::{NewProduct, SyncCursor};

/// A paginated external content source.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches the first page of a full sync.
    async fn initial_sync(&self) -> SyncResult<SyncPage>;

    /// Fetches the page `token` points at. The token is the full locator
    /// of the request, exactly as the source issued it.
    async fn continue_sync(&self, token: &str) -> SyncResult<SyncPage>;
}

/// Where the sync cursor lives between runs.
#[async_trait]
pub trait CursorRepository: Send + Sync {
    async fn read_current(&self) -> SyncResult<Option<SyncCursor>>;

    async fn write_new(&self, token: &str) -> SyncResult<SyncCursor>;

    /// Forgets the cursor; the next run starts from an initial fetch.
    async fn clear(&self) -> SyncResult<()>;
}

/// The product writes the importer needs.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Removes every product. Returns the number removed.
    async fn delete_all(&self) -> SyncResult<usize>;

    /// Inserts or updates by natural key.
    async fn upsert(&self, product: &NewProduct) -> SyncResult<()>;

    async fn soft_delete_by_natural_key(
        &self,
        integration: &str,
        external_id: &str,
    ) -> SyncResult<usize>;
}

/// Accepts import jobs for asynchronous, at-least-once processing.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Enqueues all jobs in one call. Returns how many were accepted.
    async fn enqueue_bulk(&self, jobs: Vec<ImportJob>) -> SyncResult<usize>;
}
