//! Periodic sync scheduling

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::sync::coordinator::{SyncService, SyncStatus};

/// Periodic driver invoking [`SyncService::run_sync`] on a fixed interval.
///
/// Ticks are skipped entirely while a sync is running or conflicts await
/// resolution. Outcomes and errors are logged, never propagated; a failed
/// attempt simply waits for the next tick.
pub struct SyncScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    /// Start the periodic task.
    ///
    /// The first attempt happens one full interval after start.
    #[must_use]
    pub fn start(service: SyncService, interval: Duration) -> Self {
        let (shutdown, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // interval fires immediately; consume the zeroth tick
            ticker.tick().await;
            tracing::info!("Periodic sync started (every {}s)", interval.as_secs());

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stopped.changed() => break,
                }

                match service.status().await {
                    SyncStatus::Syncing | SyncStatus::AwaitingResolution => {
                        tracing::debug!("Skipping scheduled sync, pipeline busy");
                        continue;
                    }
                    SyncStatus::Idle | SyncStatus::Error => {}
                }

                match service.run_sync().await {
                    Ok(outcome) => tracing::debug!(?outcome, "Scheduled sync finished"),
                    Err(error) => tracing::warn!("Scheduled sync failed: {error}"),
                }
            }

            tracing::info!("Periodic sync stopped");
        });

        Self { shutdown, handle }
    }

    /// Stop the periodic task, letting any in-flight sync run to completion.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
