use crate::entry::ImportJob;
use crate::error::SyncResult;
use crate::mapper::map_entry;
use crate::queue::{JobContext, JobProcessor};
use crate::traits::ProductRepository;
use async_trait::async_trait;
use catalog_types::INTEGRATION_CONTENTFUL;
use std::sync::Arc;
use tracing::debug;

/// Imports one Contentful entry: upserts it, or soft-deletes the product
/// when the source reports the entry as deleted.
pub struct ImportProcessor {
    products: Arc<dyn ProductRepository>,
    locale: String,
}

impl ImportProcessor {
    pub fn new(products: Arc<dyn ProductRepository>, locale: impl Into<String>) -> Self {
        Self {
            products,
            locale: locale.into(),
        }
    }
}

#[async_trait]
impl JobProcessor for ImportProcessor {
    async fn process(&self, job: &ImportJob, ctx: &JobContext) -> SyncResult<()> {
        if job.entry.is_deleted() {
            let affected = self
                .products
                .soft_delete_by_natural_key(INTEGRATION_CONTENTFUL, &job.entry.sys.id)
                .await?;
            debug!(entry = %job.entry.sys.id, affected, "Applied entry deletion");
            ctx.progress(100);
            return Ok(());
        }

        let product = map_entry(&job.entry, &self.locale)?;
        ctx.progress(50);
        self.products.upsert(&product).await?;
        ctx.progress(100);
        Ok(())
    }
}
