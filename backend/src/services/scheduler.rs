//! Periodic snapshot refresh
//!
//! The timer only drives refreshes; reports are computed on request from
//! whatever snapshot is current.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::snapshot::SnapshotService;

pub struct RefreshScheduler {
    service: SnapshotService,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(service: SnapshotService, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Spawn the refresh loop. The first tick fires immediately so the
    /// initial snapshot is loaded at startup.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!("Snapshot refresh every {}s", self.interval.as_secs());

            loop {
                ticker.tick().await;
                if let Err(err) = self.service.refresh().await {
                    tracing::error!("Scheduled refresh failed: {}", err);
                }
            }
        })
    }
}
