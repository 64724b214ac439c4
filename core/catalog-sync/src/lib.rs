//! Incremental product import from Contentful.
//!
//! # Components
//!
//! - **Engine**: [`SyncEngine`] follows the source's continuation links,
//!   persisting a cursor after every page
//! - **Source**: [`ContentfulClient`] talks to the Contentful sync API
//! - **Queue**: [`ImportQueue`] + [`ImportWorkerPool`] process one job per
//!   entry, concurrently and at least once
//! - **Processor**: [`ImportProcessor`] maps entries to products and upserts
//!   them on their natural key
//! - **Scheduler**: [`SyncScheduler`] triggers a run on a fixed interval
//!
//! The engine only sees the traits in [`traits`]; the SQLite stores
//! implement them in `stores`.
//!
//! # Example
//!
//! ```no_run
//! use catalog_storage::{CursorStore, ProductStore};
//! use catalog_sync::{
//!     ContentfulClient, ContentfulConfig, ImportProcessor, ImportQueue, ImportWorkerPool,
//!     QueueConfig, SyncConfig, SyncEngine,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> catalog_sync::SyncResult<()> {
//! let products = Arc::new(ProductStore::open_in_memory()?);
//! let cursors = Arc::new(CursorStore::open_in_memory()?);
//! let source = Arc::new(ContentfulClient::new(ContentfulConfig::default())?);
//!
//! let queue_config = QueueConfig::default();
//! let (queue, rx) = ImportQueue::bounded(queue_config.capacity);
//! let processor = Arc::new(ImportProcessor::new(products.clone(), "en-US"));
//! let workers = ImportWorkerPool::spawn(rx, processor, &queue_config);
//!
//! let engine = SyncEngine::new(source, cursors, products, Arc::new(queue), SyncConfig::default());
//! engine.sync().await?;
//! drop(engine);
//! workers.join().await;
//! # Ok(())
//! # }
//! ```

pub mod contentful;
mod engine;
mod entry;
mod error;
mod mapper;
mod processor;
pub mod queue;
mod scheduler;
mod stores;
pub mod traits;

pub use contentful::{ContentfulClient, ContentfulConfig};
pub use engine::{SyncConfig, SyncEngine, SyncMode, SyncOutcome, SyncReport};
pub use entry::{EntriesPage, Entry, EntrySys, ImportJob, SyncPage, DELETED_ENTRY};
pub use error::{SyncError, SyncResult};
pub use mapper::map_entry;
pub use processor::ImportProcessor;
pub use queue::{ImportQueue, ImportWorkerPool, JobContext, JobProcessor, QueueConfig, QueueStats};
pub use scheduler::{SyncScheduler, DEFAULT_SYNC_INTERVAL};
pub use traits::{ContentSource, CursorRepository, ProductRepository, WorkQueue};
