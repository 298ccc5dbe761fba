//! Background sweep that reclaims messages stuck in `Validating` after a
//! worker crash ("A crashed worker leaves a message in
//! Validating... the janitor returns it to Pending").
//!
//! Shaped like `da-indexer`'s reconnect loop: a `tokio::spawn`ed task that
//! sleeps a fixed interval and keeps going even if one pass fails, rather
//! than tearing down the process.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::store::Store;

pub struct Janitor {
    store: Arc<Store>,
    sweep_interval: Duration,
    stuck_after: chrono::Duration,
}

impl Janitor {
    pub fn new(store: Arc<Store>, sweep_interval: Duration, stuck_after: chrono::Duration) -> Self {
        Janitor {
            store,
            sweep_interval,
            stuck_after,
        }
    }

    /// Runs until `cancel` fires. Intended to be spawned once per process
    /// alongside the worker pool.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("janitor stopping");
                    return;
                }
                _ = sleep(self.sweep_interval) => {
                    if let Err(e) = self.sweep_once().await {
                        warn!(error = %e, "janitor sweep failed, will retry next interval");
                    }
                }
            }
        }
    }

    async fn sweep_once(&self) -> Result<(), crate::error::StoreError> {
        self.store.lease_table().sweep_expired();
        let cutoff = chrono::Utc::now() - self.stuck_after;
        let stuck = self.store.validating_messages_older_than(cutoff).await?;
        for message_id in stuck {
            match self.store.release_stuck_validating(message_id).await {
                Ok(()) => info!(%message_id, "reclaimed stuck validating message"),
                Err(e) => warn!(%message_id, error = %e, "failed to reclaim stuck message"),
            }
        }
        Ok(())
    }
}
