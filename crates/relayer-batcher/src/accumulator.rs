//! One single-threaded actor per `(source, destination)` pair, serializing
//! add/seal operations for that pair: accumulates Signed messages, seals on
//! whichever trigger fires first (count, wait, gas-saved estimate, or a
//! manual flush), and drives the sealed batch through submission and
//! confirmation.
//!
//! Shaped like [`relayer_store::Janitor`]'s cancellable tick loop, with the
//! inbox replaced by an `mpsc` channel carrying `Add`/`Flush` commands
//! instead of a fixed sleep interval — the same restart-loop convention the
//! Listener actor uses, narrowed to react to messages rather than a ticker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use relayer_chain::{BatchUnlockRequest, ChainRegistry};
use relayer_queue::DeliveryQueue;
use relayer_signer::ValidatorCohort;
use relayer_store::Store;
use relayer_types::{canonical_digest, Batch, BatchStatus, ChainId, Message, MessageId};

use crate::config::BatcherConfig;
use crate::error::BatcherError;
use crate::merkle::MerkleTree;

pub(crate) enum Command {
    Add(Message, oneshot::Sender<Result<(), String>>),
    Flush,
}

/// Handle to a running accumulator actor; cheaply cloned, just an `mpsc` sender.
#[derive(Clone)]
pub struct Accumulator {
    inbox: mpsc::Sender<Command>,
}

impl Accumulator {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        source: ChainId,
        destination: ChainId,
        config: Arc<BatcherConfig>,
        registry: Arc<ChainRegistry>,
        store: Arc<Store>,
        queue: Arc<DeliveryQueue>,
        consumer_group: String,
        cohort: Arc<dyn ValidatorCohort>,
        dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>>,
        signature_threshold: usize,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel(256);
        let actor = AccumulatorActor {
            source,
            destination,
            config,
            registry,
            store,
            queue,
            consumer_group,
            cohort,
            dispatch_keys,
            signature_threshold,
            open: Vec::new(),
            opened_at: None,
        };
        tokio::spawn(actor.run(rx, cancel));
        Accumulator { inbox: tx }
    }

    /// Offers a Signed message into the open batch; resolves once the
    /// message has been durably recorded as a member (either still
    /// accumulating, or as part of a seal this call triggered).
    pub async fn offer(&self, message: Message) -> Result<(), String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inbox
            .send(Command::Add(message, reply_tx))
            .await
            .map_err(|_| "accumulator actor is gone".to_string())?;
        reply_rx.await.map_err(|_| "accumulator actor dropped the reply".to_string())?
    }

    /// Manual flush, used by the control interface.
    pub async fn flush(&self) {
        let _ = self.inbox.send(Command::Flush).await;
    }
}

struct AccumulatorActor {
    source: ChainId,
    destination: ChainId,
    config: Arc<BatcherConfig>,
    registry: Arc<ChainRegistry>,
    store: Arc<Store>,
    queue: Arc<DeliveryQueue>,
    consumer_group: String,
    cohort: Arc<dyn ValidatorCohort>,
    dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>>,
    signature_threshold: usize,
    open: Vec<Message>,
    opened_at: Option<tokio::time::Instant>,
}

impl AccumulatorActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>, cancel: CancellationToken) {
        loop {
            let wait_deadline = self.opened_at.map(|opened| opened + self.config.max_wait);
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(source = %self.source, destination = %self.destination, "batcher accumulator stopping");
                    return;
                }
                cmd = rx.recv() => {
                    match cmd {
                        Some(Command::Add(message, reply)) => {
                            if self.opened_at.is_none() {
                                self.opened_at = Some(tokio::time::Instant::now());
                            }
                            self.open.push(message);
                            let should_seal = self.should_seal();
                            let _ = reply.send(Ok(()));
                            if should_seal {
                                self.seal().await;
                            }
                        }
                        Some(Command::Flush) => {
                            if !self.open.is_empty() {
                                self.seal().await;
                            }
                        }
                        None => return,
                    }
                }
                _ = Self::wait_for(wait_deadline) => {
                    if !self.open.is_empty() {
                        self.seal().await;
                    }
                }
            }
        }
    }

    async fn wait_for(deadline: Option<tokio::time::Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    /// Seal triggers 1-3; trigger 4 (manual flush) is handled
    /// directly by the `Flush` command.
    fn should_seal(&self) -> bool {
        if self.open.len() >= self.config.max_batch_size {
            return true;
        }
        let estimate = self.config.gas_saved_per_message.saturating_mul(self.open.len() as u128);
        estimate > self.config.min_gas_saved
    }

    #[instrument(skip(self), fields(source = %self.source, destination = %self.destination, count = self.open.len()))]
    async fn seal(&mut self) {
        let members = std::mem::take(&mut self.open);
        self.opened_at = None;
        if let Err(e) = self.seal_and_submit(members).await {
            warn!(error = %e, "batch seal/submit failed");
        }
    }

    /// Sorts leaves by `message_id`, builds the Merkle tree, persists the
    /// Sealed batch (atomically CASing every member `Signed -> Submitting`),
    /// collects cohort signatures over the root, dispatches, and resolves
    /// to Confirmed or unseals back to per-message Signing on revert.
    async fn seal_and_submit(&self, mut members: Vec<Message>) -> Result<(), BatcherError> {
        members.sort_by_key(|m| m.message_id);
        let message_ids: Vec<MessageId> = members.iter().map(|m| m.message_id).collect();

        let algo = self.registry.digest_algo(&self.destination)?;
        let leaves: Vec<[u8; 32]> = members.iter().map(|m| canonical_digest(m, algo)).collect();
        let tree = MerkleTree::new(leaves.clone(), algo);
        let root = tree.root();

        let mut batch = Batch::new_assembling(Store::new_batch_id(), self.source.clone(), self.destination.clone());
        batch.message_ids = message_ids;
        batch.merkle_root = Some(root);
        batch.status = BatchStatus::Sealed;
        batch.sealed_at = Some(chrono::Utc::now());
        batch.gas_saved_estimate = Some(self.config.gas_saved_per_message.saturating_mul(members.len() as u128));
        let batch_id = batch.batch_id;

        self.store.seal_batch(&batch).await?;
        info!(%batch_id, members = members.len(), root = %hex::encode(root), "batch sealed");

        let signatures = match self.cohort.request_signatures(&root, self.signature_threshold).await {
            Ok(sigs) => sigs,
            Err(e) => {
                self.unseal_and_requeue(batch_id).await?;
                return Err(BatcherError::Signer(e));
            }
        };

        let proofs: Vec<Vec<[u8; 32]>> = (0..leaves.len()).map(|i| tree.proof(i)).collect();
        let request = BatchUnlockRequest {
            merkle_root: root,
            leaves,
            proofs,
            signatures: signatures.into_iter().map(|(_, s)| s.bytes).collect(),
        };
        let dispatch_key = *self
            .dispatch_keys
            .get(&self.destination)
            .ok_or_else(|| BatcherError::MissingDispatchKey(self.destination.clone()))?;

        let tx_builder = self.registry.tx_builder(&self.destination)?;
        let tx_hash = match tx_builder.submit_batch_unlock(&request, &dispatch_key).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                self.unseal_and_requeue(batch_id).await?;
                return Err(BatcherError::Chain(e));
            }
        };
        self.store.mark_batch_submitted(batch_id, &tx_hash).await?;

        let client = self.registry.get(&self.destination)?;
        match client.wait_confirmed(&tx_hash, Duration::from_secs(10 * 60)).await {
            Ok(()) => {
                self.store.confirm_batch(batch_id, &tx_hash).await?;
                info!(%batch_id, tx_hash = %tx_hash, "batch confirmed");
                Ok(())
            }
            Err(e) => {
                self.unseal_and_requeue(batch_id).await?;
                Err(BatcherError::Chain(e))
            }
        }
    }

    /// Unseals the batch and puts every reverted member back on the
    /// Delivery Queue so a worker picks it up for a fresh Signing round --
    /// `fail_batch` alone only updates status; nothing redrives the row
    /// without a queue entry.
    async fn unseal_and_requeue(&self, batch_id: relayer_types::BatchId) -> Result<(), BatcherError> {
        let reverted = self.store.fail_batch(batch_id).await?;
        for message_id in reverted {
            if let Err(e) = self
                .queue
                .enqueue(message_id, &self.source, &self.destination, &self.consumer_group)
                .await
            {
                warn!(%batch_id, %message_id, error = %e, "failed to re-enqueue reverted batch member");
            }
        }
        Ok(())
    }
}
