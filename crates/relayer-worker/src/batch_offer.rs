//! Narrow capability a worker uses to hand a Signed message to the Batcher
//! ("hand the Message to the Batcher"), kept here rather
//! than depending on `relayer-batcher` directly — the dependency order spec
//! draws puts the Batcher before the Relayer Worker Pool, so the binary
//! wires a concrete `BatcherManager` into this trait object instead.

use async_trait::async_trait;
use relayer_types::Message;

/// Returned error is surfaced as [`crate::error::RelayerError::BatchOfferRejected`].
#[async_trait]
pub trait BatchOffer: Send + Sync {
    async fn offer(&self, message: Message) -> Result<(), String>;
}

/// Decides whether a Signed message should go to the Batcher rather than an
/// individual submission ("batching enabled for the pair
/// and the message qualifies — size, amount threshold, not priority").
pub trait BatchEligibility: Send + Sync {
    fn qualifies(&self, message: &Message) -> bool;
}

/// No batching configured: every message takes the individual path.
pub struct NeverBatch;

impl BatchEligibility for NeverBatch {
    fn qualifies(&self, _message: &Message) -> bool {
        false
    }
}
