//! Recurring sync trigger.

use crate::engine::{SyncEngine, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Default interval between sync runs.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Calls [`SyncEngine::sync`] on a fixed interval, starting immediately.
///
/// Failures are logged and the next tick tries again. Ticks never overlap:
/// a run that outlasts the interval delays the next tick.
pub struct SyncScheduler {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl SyncScheduler {
    pub fn start(engine: Arc<SyncEngine>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs(), "Sync scheduler started");

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        match engine.sync().await {
                            Ok(SyncOutcome::Completed(report)) => {
                                debug!(pages = report.pages, "Scheduled sync completed");
                            }
                            Ok(SyncOutcome::AlreadyRunning) => {}
                            Err(e) => error!("Scheduled sync failed: {e}"),
                        }
                    }
                }
            }
            info!("Sync scheduler stopped");
        });
        Self {
            handle,
            shutdown_tx,
        }
    }

    /// Stops the scheduler, waiting for an in-flight run to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!("Sync scheduler task failed: {e}");
        }
    }
}
