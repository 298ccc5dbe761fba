//! Spawns the configured number of [`Worker`] tasks sharing one
//! [`ChainRegistry`]/[`Store`]/[`DeliveryQueue`]/[`ValidatorCohort`], each
//! pulling from the same consumer group ("N independent workers
//!... no partitioning beyond the Delivery Queue's own lease").

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use relayer_chain::ChainRegistry;
use relayer_queue::DeliveryQueue;
use relayer_signer::ValidatorCohort;
use relayer_store::Store;
use relayer_types::ChainId;

use crate::batch_offer::{BatchEligibility, BatchOffer};
use crate::config::RelayerConfig;
use crate::nonce::NonceIssuer;
use crate::worker::Worker;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        registry: Arc<ChainRegistry>,
        store: Arc<Store>,
        queue: Arc<DeliveryQueue>,
        cohort: Arc<dyn ValidatorCohort>,
        dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>>,
        bridge_contracts: Arc<HashMap<ChainId, String>>,
        batch_offer: Option<Arc<dyn BatchOffer>>,
        batch_eligibility: Arc<dyn BatchEligibility>,
        config: RelayerConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let config = Arc::new(config);
        let nonce_issuer = Arc::new(NonceIssuer::new());
        let mut handles = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count as u64 {
            let worker = Worker::new(
                id,
                registry.clone(),
                store.clone(),
                queue.clone(),
                cohort.clone(),
                dispatch_keys.clone(),
                bridge_contracts.clone(),
                nonce_issuer.clone(),
                batch_offer.clone(),
                batch_eligibility.clone(),
                config.clone(),
            );
            let worker_cancel = cancel.clone();
            handles.push(tokio::spawn(worker.run(worker_cancel)));
        }
        WorkerPool { handles, cancel }
    }

    /// Signals every worker to stop after its in-flight item finishes and
    /// waits for all of them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
