//! Incremental sync engine.
//!
//! Mirrors the content source into the local product store by following
//! the source's own continuation links:
//!
//! ```text
//! no cursor ──▶ initial fetch ──▶ paginating ──▶ done
//!                                   ▲     │
//!                                   └─────┘  nextPageUrl present
//! ```
//!
//! Items are never written here; each one becomes an import job on the work
//! queue. The cursor is persisted after every page, so a failed run resumes
//! from the last completed page.

use crate::entry::{ImportJob, SyncPage};
use crate::error::{SyncError, SyncResult};
use crate::traits::{ContentSource, CursorRepository, ProductRepository, WorkQueue};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound on pages fetched in one run. The cursor is persisted
    /// when the bound is hit, so the next run picks up where this one stopped.
    pub max_pages_per_run: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_pages_per_run: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Full refresh: the store was wiped and refetched.
    Initial,
    /// Resumed from a persisted cursor.
    Incremental,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Pages fetched, including the initial one.
    pub pages: usize,
    pub items_enqueued: usize,
    /// Last cursor persisted during the run, if any.
    pub cursor: Option<String>,
    /// True when the source answered with the token it was asked for,
    /// i.e. there is nothing newer.
    pub converged: bool,
}

impl SyncReport {
    fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            pages: 0,
            items_enqueued: 0,
            cursor: None,
            converged: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another run held the engine; nothing was done.
    AlreadyRunning,
}

/// The sync engine. Runs are serialized; see [`SyncEngine::sync`].
pub struct SyncEngine {
    source: Arc<dyn ContentSource>,
    cursors: Arc<dyn CursorRepository>,
    products: Arc<dyn ProductRepository>,
    queue: Arc<dyn WorkQueue>,
    config: SyncConfig,
    running: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn ContentSource>,
        cursors: Arc<dyn CursorRepository>,
        products: Arc<dyn ProductRepository>,
        queue: Arc<dyn WorkQueue>,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            cursors,
            products,
            queue,
            config,
            running: Mutex::new(()),
        }
    }

    /// Runs one sync: initial when no cursor exists, incremental otherwise.
    ///
    /// Returns [`SyncOutcome::AlreadyRunning`] without touching anything if
    /// another run is in progress.
    pub async fn sync(&self) -> SyncResult<SyncOutcome> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Sync already running, skipping");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let report = match self.cursors.read_current().await? {
            None => self.run_initial().await?,
            Some(cursor) => {
                let mut report = SyncReport::new(SyncMode::Incremental);
                self.paginate(cursor.token, &mut report).await?;
                report
            }
        };
        info!(
            mode = ?report.mode,
            pages = report.pages,
            items = report.items_enqueued,
            converged = report.converged,
            "Sync finished"
        );
        Ok(SyncOutcome::Completed(report))
    }

    /// Forces a full refresh regardless of the stored cursor.
    ///
    /// The cursor is dropped before the wipe, so a run that fails part way
    /// is retried as an initial sync rather than resumed against an
    /// emptied store.
    pub async fn initial_sync(&self) -> SyncResult<SyncOutcome> {
        let Ok(_guard) = self.running.try_lock() else {
            return Ok(SyncOutcome::AlreadyRunning);
        };
        self.cursors.clear().await?;
        Ok(SyncOutcome::Completed(self.run_initial().await?))
    }

    /// Continues from an explicit token.
    pub async fn continue_sync(&self, token: &str) -> SyncResult<SyncOutcome> {
        let Ok(_guard) = self.running.try_lock() else {
            return Ok(SyncOutcome::AlreadyRunning);
        };
        let mut report = SyncReport::new(SyncMode::Incremental);
        self.paginate(token.to_string(), &mut report).await?;
        Ok(SyncOutcome::Completed(report))
    }

    async fn run_initial(&self) -> SyncResult<SyncReport> {
        let mut report = SyncReport::new(SyncMode::Initial);

        let removed = self.products.delete_all().await?;
        info!(removed, "Cleared products for initial sync");

        let page = self.source.initial_sync().await?;
        report.pages += 1;
        let next_page_url = page.next_page_url.clone();
        let next_sync_url = page.next_sync_url.clone();
        report.items_enqueued += self.enqueue(page).await?;

        let next = next_page_url.or(next_sync_url).ok_or_else(|| {
            SyncError::Protocol("initial sync response has no continuation url".into())
        })?;
        self.cursors.write_new(&next).await?;
        report.cursor = Some(next.clone());

        self.paginate(next, &mut report).await?;
        Ok(report)
    }

    /// Follows continuation links from `token` until the source converges
    /// or stops handing out page links.
    async fn paginate(&self, mut token: String, report: &mut SyncReport) -> SyncResult<()> {
        loop {
            if report.pages >= self.config.max_pages_per_run {
                warn!(pages = report.pages, "Page limit reached, resuming next run");
                return Ok(());
            }

            let page = self.source.continue_sync(&token).await?;
            report.pages += 1;
            let next_page_url = page.next_page_url.clone();
            let next_sync_url = page.next_sync_url.clone();
            report.items_enqueued += self.enqueue(page).await?;

            if next_sync_url.as_deref() == Some(token.as_str()) {
                debug!("Source returned the same sync url, converged");
                report.converged = true;
                return Ok(());
            }

            let has_more_pages = next_page_url.is_some();
            let next = next_sync_url.or(next_page_url).ok_or_else(|| {
                SyncError::Protocol("sync response has neither nextSyncUrl nor nextPageUrl".into())
            })?;
            self.cursors.write_new(&next).await?;
            report.cursor = Some(next.clone());

            if !has_more_pages {
                return Ok(());
            }
            token = next;
        }
    }

    async fn enqueue(&self, page: SyncPage) -> SyncResult<usize> {
        if page.items.is_empty() {
            return Ok(0);
        }
        let jobs: Vec<ImportJob> = page.items.into_iter().map(ImportJob::new).collect();
        self.queue.enqueue_bulk(jobs).await
    }
}
