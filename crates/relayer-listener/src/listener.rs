//! The Listener actor: one instance per configured source
//! chain, a single-threaded tick loop translating lock events into durable
//! `Pending` messages and Delivery Queue work items.
//!
//! A cancellable `tokio::select!` restart loop for a long-lived background
//! actor, combined with a tick/select body in the shape of
//! `narwhal-worker`'s `BatchMaker::run`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use relayer_chain::ChainRegistry;
use relayer_queue::DeliveryQueue;
use relayer_store::{InsertOutcome, Store};
use relayer_types::{ChainId, Message, MessageAmount, MessageId, MessageKind, MessageStatus};

use crate::error::ListenerError;
use crate::pause::PauseRegistry;

pub struct ListenerConfig {
    pub chain: ChainId,
    pub bridge_contract: String,
    pub batch_width: u64,
    pub tick_interval: Duration,
    pub configured_start: u64,
    /// Routes enqueued work to a Delivery Queue consumer group; typically
    /// the deployment's single worker pool name.
    pub consumer_group: String,
}

pub struct Listener {
    registry: Arc<ChainRegistry>,
    store: Arc<Store>,
    queue: Arc<DeliveryQueue>,
    pause: Arc<PauseRegistry>,
    config: ListenerConfig,
    cursor: u64,
}

#[derive(Debug, Default)]
pub struct TickOutcome {
    pub events_found: usize,
    pub advanced: bool,
}

impl Listener {
    pub async fn new(
        registry: Arc<ChainRegistry>,
        store: Arc<Store>,
        queue: Arc<DeliveryQueue>,
        pause: Arc<PauseRegistry>,
        config: ListenerConfig,
    ) -> Result<Self, ListenerError> {
        let cursor = store
            .listener_cursor(&config.chain)
            .await?
            .unwrap_or(config.configured_start)
            .max(config.configured_start);
        Ok(Listener {
            registry,
            store,
            queue,
            pause,
            config,
            cursor,
        })
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(chain = %self.config.chain, "listener stopping");
                    return;
                }
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(outcome) => {
                            if outcome.events_found > 0 || outcome.advanced {
                                info!(
                                    chain = %self.config.chain,
                                    cursor = self.cursor,
                                    events_found = outcome.events_found,
                                    "tick"
                                );
                            }
                        }
                        Err(e) => warn!(chain = %self.config.chain, error = %e, "tick failed, retrying at cursor"),
                    }
                }
            }
        }
    }

    /// One iteration of 's loop invariant. Never advances the
    /// cursor on failure — the range is retried verbatim on the next tick.
    #[instrument(skip(self), fields(chain = %self.config.chain))]
    pub async fn tick(&mut self) -> Result<TickOutcome, ListenerError> {
        if self.pause.is_paused(&self.config.chain) {
            return Ok(TickOutcome::default());
        }
        let client = self.registry.get(&self.config.chain)?;
        let tip = client.latest_height().await?;
        let safe_tip = tip.saturating_sub(client.confirmation_depth());
        if safe_tip < self.cursor {
            return Ok(TickOutcome::default());
        }
        let to = safe_tip.min(self.cursor + self.config.batch_width.saturating_sub(1));
        let events = client
            .query_events(&self.config.bridge_contract, self.cursor, to)
            .await?;

        let mut ordered = events;
        ordered.sort_by_key(|e| (e.source_block, e.source_log_index));

        for event in &ordered {
            let message_id = MessageId::derive(
                self.config.chain.0.as_str(),
                &event.source_tx_hash,
                event.source_log_index,
                event.nonce,
            );
            let now = Utc.timestamp_opt(event.timestamp, 0).single().unwrap_or_else(Utc::now);
            let payload = match event.kind {
                MessageKind::TokenTransfer => MessageAmount::Fungible {
                    amount: event.amount_or_token_id,
                },
                MessageKind::NftTransfer => MessageAmount::NonFungible {
                    token_id: event.amount_or_token_id,
                },
            };
            let destination_chain = ChainId(event.destination_chain_id.clone());
            let message = Message {
                message_id,
                kind: event.kind,
                source_chain: self.config.chain.clone(),
                destination_chain: destination_chain.clone(),
                sender: event.sender.clone(),
                recipient: event.recipient_on_destination.clone(),
                token: event.token.clone(),
                payload,
                source_tx_hash: hex::encode(&event.source_tx_hash),
                source_block: event.source_block,
                source_log_index: event.source_log_index,
                nonce: event.nonce,
                status: MessageStatus::Pending,
                destination_tx_hash: None,
                destination_block: None,
                created_at: now,
                updated_at: now,
                completed_at: None,
            };
            let outcome = self.store.insert_message(&message).await?;
            if outcome == InsertOutcome::Inserted {
                self.queue
                    .enqueue(
                        message_id,
                        &self.config.chain,
                        &destination_chain,
                        &self.config.consumer_group,
                    )
                    .await?;
            }
        }

        self.store.checkpoint_listener(&self.config.chain, to + 1).await?;
        self.cursor = to + 1;

        Ok(TickOutcome {
            events_found: ordered.len(),
            advanced: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_width_window_is_inclusive_and_capped() {
        let cursor = 100u64;
        let batch_width = 50u64;
        let safe_tip = 1_000u64;
        let to = safe_tip.min(cursor + batch_width.saturating_sub(1));
        assert_eq!(to, 149);
    }

    #[test]
    fn batch_width_window_does_not_exceed_safe_tip() {
        let cursor = 100u64;
        let batch_width = 500u64;
        let safe_tip = 120u64;
        let to = safe_tip.min(cursor + batch_width.saturating_sub(1));
        assert_eq!(to, 120);
    }
}
