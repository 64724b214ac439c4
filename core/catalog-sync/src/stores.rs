//! Async repository implementations over the blocking SQLite stores.

use crate::error::{SyncError, SyncResult};
use crate::traits::{CursorRepository, ProductRepository};
use async_trait::async_trait;
use catalog_storage::{CursorStore, ProductStore, StorageResult};
use catalog_types::{NewProduct, SyncCursor};

/// Runs a store call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> SyncResult<T>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SyncError::Storage(format!("blocking task failed: {e}")))?
        .map_err(SyncError::from)
}

#[async_trait]
impl CursorRepository for CursorStore {
    async fn read_current(&self) -> SyncResult<Option<SyncCursor>> {
        let store = self.clone();
        run_blocking(move || store.read_current()).await
    }

    async fn write_new(&self, token: &str) -> SyncResult<SyncCursor> {
        let store = self.clone();
        let token = token.to_string();
        run_blocking(move || store.write_new(&token)).await
    }

    async fn clear(&self) -> SyncResult<()> {
        let store = self.clone();
        run_blocking(move || store.clear()).await
    }
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn delete_all(&self) -> SyncResult<usize> {
        let store = self.clone();
        run_blocking(move || store.delete_all_rows()).await
    }

    async fn upsert(&self, product: &NewProduct) -> SyncResult<()> {
        let store = self.clone();
        let product = product.clone();
        run_blocking(move || store.upsert_by_natural_key(&product).map(|_| ())).await
    }

    async fn soft_delete_by_natural_key(
        &self,
        integration: &str,
        external_id: &str,
    ) -> SyncResult<usize> {
        let store = self.clone();
        let integration = integration.to_string();
        let external_id = external_id.to_string();
        run_blocking(move || store.soft_delete_by_natural_key(&integration, &external_id)).await
    }
}
