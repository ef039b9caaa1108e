//! Periodic full reload of the address space from the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Instrument};

use crate::service::IpamService;

/// Handle to the background reload task.
#[derive(Debug)]
pub struct ReloadScheduler {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReloadScheduler {
    /// Start reloading every `period`. The first reload happens one period
    /// from now; the caller performs the initial load itself.
    pub fn spawn(service: Arc<IpamService>, period: Duration) -> Self {
        let (shutdown, mut signal) = watch::channel(false);
        let task = tokio::spawn(
            async move {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                info!(period_secs = period.as_secs(), "reload scheduler started");

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            match service.reload().await {
                                Ok(stats) => debug!(
                                    prefixes = stats.prefixes,
                                    subnets = stats.subnets,
                                    hosts = stats.hosts,
                                    "scheduled reload finished"
                                ),
                                Err(e) => warn!(error = %e, "scheduled reload failed"),
                            }
                        }
                        _ = signal.changed() => {
                            debug!("reload scheduler shutting down");
                            break;
                        }
                    }
                }
            }
            .instrument(tracing::debug_span!("reload_scheduler")),
        );
        Self { shutdown, task }
    }

    /// Stop the task and wait for it. A reload in progress runs to
    /// completion first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "reload scheduler task ended abnormally");
        }
    }
}
