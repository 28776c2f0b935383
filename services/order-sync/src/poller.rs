//! Fallback polling task
//!
//! The push feed offers no delivery guarantee, so a periodic full
//! reconciliation against the data source heals whatever a disconnect
//! window dropped. The poller is a proper task with a shutdown signal, not
//! an ad-hoc timer callback: it can be stopped cleanly when the view is
//! torn down, and it re-evaluates its cadence every cycle so a reported
//! disconnect tightens the interval on the next round.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::info;

use crate::service::OrderSync;

/// Poll cadence configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval while the push channel is connected.
    pub interval: Duration,
    /// Tightened interval while the push channel is down and the poll is
    /// the only source of truth.
    pub degraded_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            degraded_interval: Duration::from_secs(5),
        }
    }
}

/// Handle to a running poller task.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal the task to stop and wait for it to finish its current cycle.
    pub async fn shutdown(self) {
        // The task may already have exited; a send error is fine.
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the fallback poller for one view's sync handle.
pub fn spawn(sync: OrderSync, config: PollerConfig) -> PollerHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(
            view = %sync.view(),
            interval_ms = config.interval.as_millis() as u64,
            degraded_ms = config.degraded_interval.as_millis() as u64,
            "fallback poller started"
        );
        loop {
            let wait = if sync.is_connected() {
                config.interval
            } else {
                config.degraded_interval
            };
            tokio::select! {
                _ = sleep(wait) => {
                    // Failures are logged and counted by the service; the
                    // working set stays untouched either way.
                    let _ = sync.poll_fallback().await;
                }
                res = shutdown_rx.changed() => {
                    // A dropped sender counts as shutdown too.
                    let _ = res;
                    info!(view = %sync.view(), "fallback poller stopped");
                    return;
                }
            }
        }
    });

    PollerHandle { shutdown_tx, task }
}
