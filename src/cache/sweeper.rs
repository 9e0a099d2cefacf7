//! Background purge of expired cache entries
//!
//! `get` already refuses to return expired entries, so the sweeper only bounds
//! memory: entries nobody asks for again are dropped on a fixed interval.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::TtlCache;

/// Default interval between sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(120);

/// Handle for controlling the background sweep task
///
/// Dropping the handle also stops the task, since the shutdown channel closes.
pub struct SweeperHandle {
    /// Channel used to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
    /// The running task, absent when sweeping is disabled
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Spawns a task that purges `cache` every `interval`
    ///
    /// A zero interval disables sweeping; the returned handle is then inert.
    pub fn spawn(cache: TtlCache, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if interval.is_zero() {
            debug!("cache sweeper disabled");
            return Self {
                shutdown_tx,
                task: None,
            };
        }

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the first tick (immediate)
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = cache.purge_expired();
                        if purged > 0 {
                            info!(purged, remaining = cache.len(), "purged expired cache entries");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Whether a sweep task was started
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the sweep task and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Some(task) = self.task {
            let _ = task.await;
        }
    }
}
