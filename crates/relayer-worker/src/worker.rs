//! The per-message pipeline: a validate → build → submit → await-receipt
//! shape expanded into seven numbered steps, with the dequeue/process
//! cycle driven by a `tokio::select!` actor loop grounded on
//! `narwhal-worker`'s `BatchMaker::run`.
//!
//! Retries within a step (re-verify, signature collection, submission,
//! confirmation) are handled in-process with the configured backoff rather
//! than bounced back through the Delivery Queue: the Store's status CAS
//! only ever matches the status the pipeline itself just set, so a
//! redelivered work item would never find the row back in `Pending`.
//! Only failures before any status has moved off `Pending` (claim
//! contention, a transient store error) are left to queue-level NACK.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use relayer_chain::{ChainClient, ChainError, ChainRegistry, UnlockRequest};
use relayer_queue::{DeliveryQueue, WorkItem};
use relayer_signer::{SignedDigest, ValidatorCohort};
use relayer_store::{ClaimOutcome, Store};
use relayer_types::{canonical_digest, ChainId, Message, MessageId, MessageStatus, ValidatorId};

use crate::batch_offer::{BatchEligibility, BatchOffer};
use crate::config::RelayerConfig;
use crate::error::RelayerError;
use crate::nonce::NonceIssuer;
use crate::policy;
use crate::retry::RetryPolicy;

/// What happened to a dequeued work item, driving the queue ack/nack call.
enum PipelineOutcome {
    Acked,
    NackRetry(Duration),
    /// Terminal from the Queue's point of view — acked so it is never
    /// redelivered even though the Message itself is Failed/Abandoned.
    TerminalAck,
}

pub struct Worker {
    pub id: u64,
    registry: Arc<ChainRegistry>,
    store: Arc<Store>,
    queue: Arc<DeliveryQueue>,
    cohort: Arc<dyn ValidatorCohort>,
    /// Dispatch key bytes per destination chain — separate from validator
    /// signing keys ("sign the envelope with the worker's
    /// dispatch key").
    dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>>,
    /// Bridge contract address per source chain, needed to re-query the
    /// event at step 2.
    bridge_contracts: Arc<HashMap<ChainId, String>>,
    nonce_issuer: Arc<NonceIssuer>,
    batch_offer: Option<Arc<dyn BatchOffer>>,
    batch_eligibility: Arc<dyn BatchEligibility>,
    config: Arc<RelayerConfig>,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        registry: Arc<ChainRegistry>,
        store: Arc<Store>,
        queue: Arc<DeliveryQueue>,
        cohort: Arc<dyn ValidatorCohort>,
        dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>>,
        bridge_contracts: Arc<HashMap<ChainId, String>>,
        nonce_issuer: Arc<NonceIssuer>,
        batch_offer: Option<Arc<dyn BatchOffer>>,
        batch_eligibility: Arc<dyn BatchEligibility>,
        config: Arc<RelayerConfig>,
    ) -> Self {
        Worker {
            id,
            registry,
            store,
            queue,
            cohort,
            dispatch_keys,
            bridge_contracts,
            nonce_issuer,
            batch_offer,
            batch_eligibility,
            config,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(worker = self.id, "worker stopping");
                    return;
                }
                item = self.queue.dequeue(&self.config.consumer_group, &self.id.to_string()) => {
                    match item {
                        Ok(Some(item)) => self.handle(item, &cancel).await,
                        Ok(None) => tokio::time::sleep(Duration::from_millis(250)).await,
                        Err(e) => {
                            warn!(worker = self.id, error = %e, "dequeue failed");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }
    }

    #[instrument(skip(self, cancel), fields(worker = self.id, message_id = %item.message_id))]
    async fn handle(&self, item: WorkItem, cancel: &CancellationToken) {
        let queue_id = item.id;
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = tokio::time::timeout(self.config.processing_timeout, self.process(item)) => outcome,
        };
        let outcome = outcome.unwrap_or(PipelineOutcome::NackRetry(Duration::from_secs(5)));
        let result = match outcome {
            PipelineOutcome::Acked | PipelineOutcome::TerminalAck => self.queue.ack(queue_id).await,
            PipelineOutcome::NackRetry(backoff) => self.queue.nack(queue_id, backoff).await,
        };
        if let Err(e) = result {
            warn!(worker = self.id, error = %e, "failed to ack/nack queue item");
        }
    }

    /// Steps 1-7 for one work item.
    async fn process(&self, item: WorkItem) -> PipelineOutcome {
        // Step 1: lease.
        match self.store.claim_for_processing(item.message_id, self.id).await {
            Ok(ClaimOutcome::Claimed) => {}
            Ok(ClaimOutcome::AlreadyLeased) => return PipelineOutcome::NackRetry(Duration::from_secs(1)),
            Err(e) => {
                warn!(error = %e, "claim_for_processing failed");
                return PipelineOutcome::NackRetry(Duration::from_secs(2));
            }
        };

        let message = match self.store.get_message(item.message_id).await {
            Ok(Some(m)) => m,
            Ok(None) => {
                warn!("leased message vanished from the store");
                self.store.release_lease(&item.message_id);
                return PipelineOutcome::TerminalAck;
            }
            Err(e) => {
                warn!(error = %e, "get_message failed after claim");
                self.store.release_lease(&item.message_id);
                let _ = self
                    .store
                    .update_message_status(item.message_id, MessageStatus::Validating, MessageStatus::Pending)
                    .await;
                return PipelineOutcome::NackRetry(Duration::from_secs(2));
            }
        };

        if self.store.is_processed(item.message_id).await.unwrap_or(false) {
            // Exactly-once backstop ("Exactly-once property").
            self.store.release_lease(&item.message_id);
            return PipelineOutcome::TerminalAck;
        }

        let result = self.run_pipeline(message).await;
        self.store.release_lease(&item.message_id);
        match result {
            Ok(()) => PipelineOutcome::Acked,
            Err(_) => PipelineOutcome::TerminalAck,
        }
    }

    async fn run_pipeline(&self, message: Message) -> Result<(), RelayerError> {
        // Step 2: re-verify at source, retried in-process before abandoning.
        self.with_retry(message.message_id, MessageStatus::Validating, |_attempt| {
            self.reverify_source(&message)
        })
            .await?;
        self.transition(message.message_id, MessageStatus::Validating, MessageStatus::Signing)
            .await?;

        // Step 3: policy checks — terminal on violation, never retried.
        if let Err(violation) = policy::check(&self.store, &message, &self.config.limits).await {
            warn!(reason = %violation, "policy violation");
            let _ = self
                .transition(message.message_id, MessageStatus::Signing, MessageStatus::Failed)
                .await;
            return Err(RelayerError::Terminal);
        }

        // Step 4: signature collection.
        let digest_algo = self.registry.digest_algo(&message.destination_chain)?;
        let digest = canonical_digest(&message, digest_algo);
        let signatures = self
            .with_retry(message.message_id, MessageStatus::Signing, |_attempt| self.collect_signatures(&digest))
            .await?;
        for (validator_id, signed) in &signatures {
            let record = relayer_types::Signature {
                message_id: message.message_id,
                validator_id: validator_id.clone(),
                scheme: signed.scheme,
                bytes: signed.bytes.clone(),
                created_at: chrono::Utc::now(),
            };
            if let Err(e) = self.store.append_signature(&record).await {
                warn!(error = %e, "append_signature failed");
            }
        }
        self.transition(message.message_id, MessageStatus::Signing, MessageStatus::Signed)
            .await?;

        // Step 5: dispatch choice — batch hand-off or individual submission.
        // The message stays `Signed` while offered: the Batcher's own seal
        // performs the `Signed -> Submitting` CAS once the batch closes, so
        // a rejected offer here leaves the message exactly where individual
        // submission below expects to find it.
        if self.batch_eligibility.qualifies(&message) {
            if let Some(batch_offer) = &self.batch_offer {
                match batch_offer.offer(message.clone()).await {
                    Ok(()) => return Ok(()),
                    Err(reason) => {
                        warn!(reason = %reason, "batch offer rejected; falling back to individual submission");
                    }
                }
            }
        }

        // Step 6: submit individually.
        self.transition(message.message_id, MessageStatus::Signed, MessageStatus::Submitting)
            .await?;
        let tx_hash = self
            .with_retry(message.message_id, MessageStatus::Submitting, |_attempt| {
                self.submit_individual(&message, &signatures)
            })
            .await?;

        // Step 7: confirm.
        self.confirm(&message, tx_hash).await
    }

    /// Runs `step` up to the retry policy's attempt budget, sleeping the
    /// configured backoff between attempts. On exhaustion the message is
    /// transitioned to `Failed` (or `Abandoned`, for source divergence)
    /// from `current_status` and the error bubbles as [`RelayerError::Terminal`].
    async fn with_retry<T, F, Fut>(
        &self,
        message_id: MessageId,
        current_status: MessageStatus,
        mut step: F,
    ) -> Result<T, RelayerError>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, StepError>>,
    {
        let policy: RetryPolicy = self.config.retry_policy;
        let mut attempt = 1;
        loop {
            match step(attempt).await {
                Ok(value) => return Ok(value),
                Err(StepError::Abandon) => {
                    let _ = self
                        .transition(message_id, current_status, MessageStatus::Abandoned)
                        .await;
                    return Err(RelayerError::Terminal);
                }
                Err(StepError::Retryable) => {
                    if policy.exhausted(attempt) {
                        let _ = self.transition(message_id, current_status, MessageStatus::Failed).await;
                        return Err(RelayerError::Terminal);
                    }
                    tokio::time::sleep(policy.backoff_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn reverify_source(&self, message: &Message) -> Result<(), StepError> {
        let client = self.registry.get(&message.source_chain).map_err(|_| StepError::Abandon)?;
        let contract = self
            .bridge_contracts
            .get(&message.source_chain)
            .cloned()
            .unwrap_or_default();
        let events = match client
            .query_events(&contract, message.source_block, message.source_block)
            .await
            {
                Ok(events) => events,
                Err(e) if e.is_retryable() => return Err(StepError::Retryable),
                Err(e) => {
                    warn!(error = %e, "source re-query failed permanently");
                    return Err(StepError::Abandon);
                }
            };
        let found = events.iter().any(|e| {
            e.source_log_index == message.source_log_index
            && e.sender == message.sender
            && e.recipient_on_destination == message.recipient
            && e.token == message.token
            && e.nonce == message.nonce
        });
        if !found {
            return Err(StepError::Abandon);
        }
        Ok(())
    }

    async fn collect_signatures(
        &self,
        digest: &[u8; 32],
    ) -> Result<Vec<(ValidatorId, SignedDigest)>, StepError> {
        match tokio::time::timeout(
            self.config.signature_collection_timeout,
            self.cohort.request_signatures(digest, self.config.signature_threshold),
        )
            .await
            {
                Ok(Ok(signatures)) => Ok(signatures),
                Ok(Err(e)) => {
                    warn!(error = %e, "signature collection failed to reach threshold");
                    Err(StepError::Retryable)
                }
                Err(_elapsed) => {
                    warn!("signature collection timed out");
                    Err(StepError::Retryable)
                }
            }
    }

    async fn submit_individual(
        &self,
        message: &Message,
        signatures: &[(ValidatorId, SignedDigest)],
    ) -> Result<String, StepError> {
        let dispatch_key = match self.dispatch_keys.get(&message.destination_chain) {
            Some(key) => *key,
            None => {
                warn!("no dispatch key configured for destination chain");
                return Err(StepError::Abandon);
            }
        };
        let nonce = self.nonce_issuer.issue_next(&message.destination_chain.0).await;
        let amount_or_token_id = match message.payload {
            relayer_types::MessageAmount::Fungible { amount } => amount,
            relayer_types::MessageAmount::NonFungible { token_id } => token_id,
        };
        let request = UnlockRequest {
            message_id: message.message_id.0,
            sender: message.sender.clone(),
            recipient: message.recipient.clone(),
            token: message.token.clone(),
            amount_or_token_id,
            nonce,
            signatures: signatures.iter().map(|(_, s)| s.bytes.clone()).collect(),
        };
        let tx_builder = self
            .registry
            .tx_builder(&message.destination_chain)
            .map_err(|_| StepError::Retryable)?;
        match tx_builder.submit_unlock(&request, &dispatch_key).await {
            Ok(tx_hash) => {
                self.nonce_issuer.record_confirmed(&message.destination_chain.0, nonce).await;
                Ok(tx_hash)
            }
            Err(ChainError::Permanent(reason)) => {
                warn!(reason = %reason, "destination rejected the submission permanently");
                Err(StepError::Abandon)
            }
            Err(e) => {
                warn!(error = %e, "destination submission failed transiently");
                Err(StepError::Retryable)
            }
        }
    }

    async fn confirm(&self, message: &Message, tx_hash: String) -> Result<(), RelayerError> {
        let client = self.registry.get(&message.destination_chain)?;
        match client.wait_confirmed(&tx_hash, self.config.confirmation_timeout).await {
            Ok(()) => {
                let height = client.latest_height().await.unwrap_or(0);
                if let Err(e) = self.store.record_completion(message.message_id, tx_hash, height).await {
                    warn!(error = %e, "record_completion failed");
                    return Err(RelayerError::Terminal);
                }
                Ok(())
            }
            Err(ChainError::Permanent(reason)) => self.on_revert(message, client, &tx_hash, &reason).await,
            Err(e) => {
                warn!(error = %e, "confirmation failed transiently");
                let _ = self
                    .transition(message.message_id, MessageStatus::Submitting, MessageStatus::Failed)
                    .await;
                Err(RelayerError::Terminal)
            }
        }
    }

    /// `AlreadyProcessed` counts as Completed, recorded through the same
    /// path as a normal confirmation so the
    /// `destination_tx_hash`/`ProcessedMessage` invariant still holds;
    /// `InvalidSignatures`/`ThresholdNotMet` return to Signing for a fresh
    /// round and are re-enqueued since nothing else will ever redrive a
    /// `Signing` row; anything else is a terminal Failed.
    async fn on_revert(
        &self,
        message: &Message,
        client: &dyn ChainClient,
        tx_hash: &str,
        reason: &str,
    ) -> Result<(), RelayerError> {
        match reason {
            "AlreadyProcessed" => {
                let height = client.latest_height().await.unwrap_or(0);
                if let Err(e) = self
                    .store
                    .record_completion(message.message_id, tx_hash.to_string(), height)
                    .await
                {
                    warn!(error = %e, "record_completion failed for already-processed message");
                    return Err(RelayerError::Terminal);
                }
                Ok(())
            }
            "InvalidSignatures" | "ThresholdNotMet" => {
                let _ = self
                    .transition(message.message_id, MessageStatus::Submitting, MessageStatus::Signing)
                    .await;
                if let Err(e) = self
                    .queue
                    .enqueue(
                        message.message_id,
                        &message.source_chain,
                        &message.destination_chain,
                        &self.config.consumer_group,
                    )
                    .await
                {
                    warn!(error = %e, "failed to re-enqueue message reverted to signing");
                }
                Err(RelayerError::Terminal)
            }
            _ => {
                let _ = self
                    .transition(message.message_id, MessageStatus::Submitting, MessageStatus::Failed)
                    .await;
                Err(RelayerError::Terminal)
            }
        }
    }

    async fn transition(
        &self,
        id: MessageId,
        from: MessageStatus,
        to: MessageStatus,
    ) -> Result<(), RelayerError> {
        self.store.update_message_status(id, from, to).await.map_err(|e| {
            warn!(error = %e, "status transition failed");
            RelayerError::from(e)
        })
    }
}

/// Outcome of a single pipeline step attempt, fed into [`Worker::with_retry`].
enum StepError {
    Retryable,
    Abandon,
}
