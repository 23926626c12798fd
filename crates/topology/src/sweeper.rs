//! Periodic eviction of stale parents.
//!
//! Reads already evict before copying the table, but a table that nobody
//! queries would otherwise keep dead entries forever. The sweeper bounds that
//! by calling [`ParentTableStore::evict_stale`] on a fixed interval.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::parent_table::ParentTableStore;

/// Handle to a running sweeper task
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Sweep interval derived from a TTL: half of it, never below one second
    pub fn default_interval(ttl_secs: u64) -> Duration {
        Duration::from_secs((ttl_secs / 2).max(1))
    }

    /// Stop the sweeper and wait for the task to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Sweeper task ended abnormally");
        }
    }
}

/// Spawn a tokio task that evicts stale entries from `store` every `interval`.
///
/// A failed sweep is logged and the next tick tries again.
pub fn spawn_sweeper(store: Arc<ParentTableStore>, interval: Duration) -> SweeperHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = store.now();
                    match store.evict_stale(now) {
                        Ok(report) => debug!(
                            entries_removed = report.entries_removed,
                            records_removed = report.records_removed,
                            "Sweep complete"
                        ),
                        Err(e) => error!(error = %e, "Sweep failed"),
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Sweeper stopped");
    });

    SweeperHandle { shutdown, task }
}
