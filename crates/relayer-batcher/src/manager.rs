//! Wires one [`Accumulator`] per configured, enabled `(source, destination)`
//! pair and exposes them to the Relayer Worker Pool through the narrow
//! [`BatchOffer`]/[`BatchEligibility`] capabilities `relayer-worker` defines
//! ("Cyclic references avoided").

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use async_trait::async_trait;
use relayer_chain::ChainRegistry;
use relayer_queue::DeliveryQueue;
use relayer_signer::ValidatorCohort;
use relayer_store::Store;
use relayer_types::{ChainId, Message, MessageAmount};
use relayer_worker::{BatchEligibility, BatchOffer};

use crate::accumulator::Accumulator;
use crate::config::BatcherConfig;

/// Owns the set of running accumulators, one per enabled pair, and the
/// lifetime of their background tasks.
pub struct BatcherManager {
    config: Arc<BatcherConfig>,
    accumulators: DashMap<(ChainId, ChainId), Accumulator>,
    registry: Arc<ChainRegistry>,
    store: Arc<Store>,
    queue: Arc<DeliveryQueue>,
    consumer_group: String,
    cohort: Arc<dyn ValidatorCohort>,
    dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>>,
    signature_threshold: usize,
    cancel: CancellationToken,
}

impl BatcherManager {
    /// Eagerly spawns an accumulator for every pair named in
    /// `config.enabled_pairs` — deterministic at startup rather than
    /// lazily on first offer, so a pair's `max_wait` clock only ever starts
    /// once a message actually arrives.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: BatcherConfig,
        registry: Arc<ChainRegistry>,
        store: Arc<Store>,
        queue: Arc<DeliveryQueue>,
        consumer_group: String,
        cohort: Arc<dyn ValidatorCohort>,
        dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>>,
        signature_threshold: usize,
    ) -> Self {
        let config = Arc::new(config);
        let manager = BatcherManager {
            config: config.clone(),
            accumulators: DashMap::new(),
            registry,
            store,
            queue,
            consumer_group,
            cohort,
            dispatch_keys,
            signature_threshold,
            cancel: CancellationToken::new(),
        };
        for (source, destination) in config.enabled_pairs.iter().cloned() {
            manager.spawn_pair(source, destination);
        }
        manager
    }

    fn spawn_pair(&self, source: ChainId, destination: ChainId) {
        let accumulator = Accumulator::spawn(
            source.clone(),
            destination.clone(),
            self.config.clone(),
            self.registry.clone(),
            self.store.clone(),
            self.queue.clone(),
            self.consumer_group.clone(),
            self.cohort.clone(),
            self.dispatch_keys.clone(),
            self.signature_threshold,
            self.cancel.clone(),
        );
        self.accumulators.insert((source, destination), accumulator);
    }

    /// Manually flushes every open batch,
    /// surfaced to the control interface as an operator action.
    pub async fn flush_all(&self) {
        for entry in self.accumulators.iter() {
            entry.value().flush().await;
        }
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl BatchOffer for BatcherManager {
    async fn offer(&self, message: Message) -> Result<(), String> {
        let key = (message.source_chain.clone(), message.destination_chain.clone());
        let accumulator = self
            .accumulators
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| format!("no accumulator configured for pair ({}, {})", key.0, key.1))?;
        accumulator.offer(message).await
    }
}

/// A message qualifies for batching when batching is enabled for its pair
/// and its amount falls below the per-message threshold. Per-message
/// size/priority has no field on [`Message`] in this data model, so
/// qualification here is pair-enablement plus the amount threshold.
pub struct ConfiguredBatchEligibility {
    config: Arc<BatcherConfig>,
}

impl ConfiguredBatchEligibility {
    pub fn new(config: Arc<BatcherConfig>) -> Self {
        ConfiguredBatchEligibility { config }
    }
}

impl BatchEligibility for ConfiguredBatchEligibility {
    fn qualifies(&self, message: &Message) -> bool {
        if !self.config.pair_enabled(&message.source_chain, &message.destination_chain) {
            return false;
        }
        let amount = match message.payload {
            MessageAmount::Fungible { amount } => amount,
            MessageAmount::NonFungible { token_id } => token_id,
        };
        amount <= self.config.max_batchable_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)], max_amount: u128) -> Arc<BatcherConfig> {
        let mut config = BatcherConfig::default();
        config.enabled_pairs = pairs
            .iter()
            .map(|(s, d)| (ChainId::from(*s), ChainId::from(*d)))
            .collect();
        config.max_batchable_amount = max_amount;
        Arc::new(config)
    }

    fn message(source: &str, destination: &str, amount: u128) -> Message {
        let now = chrono::Utc::now();
        Message {
            message_id: relayer_types::MessageId::derive(source, b"tx", 0, 1),
            kind: relayer_types::MessageKind::TokenTransfer,
            source_chain: ChainId::from(source),
            destination_chain: ChainId::from(destination),
            sender: relayer_types::ChainAddress("0xa".into()),
            recipient: relayer_types::ChainAddress("0xb".into()),
            token: relayer_types::ChainAddress("0xusdc".into()),
            payload: MessageAmount::Fungible { amount },
            source_tx_hash: "0xtx".into(),
            source_block: 1,
            source_log_index: 0,
            nonce: 1,
            status: relayer_types::MessageStatus::Signed,
            destination_tx_hash: None,
            destination_block: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn disabled_pair_never_qualifies() {
        let eligibility = ConfiguredBatchEligibility::new(config(&[], u128::MAX));
        assert!(!eligibility.qualifies(&message("a", "b", 10)));
    }

    #[test]
    fn enabled_pair_under_amount_threshold_qualifies() {
        let eligibility = ConfiguredBatchEligibility::new(config(&[("a", "b")], 100));
        assert!(eligibility.qualifies(&message("a", "b", 10)));
        assert!(!eligibility.qualifies(&message("a", "b", 1000)));
    }
}
