use thiserror::Error;

use relayer_types::MessageId;

/// Errors raised by the Relayer Worker Pool. Transient chain/store
/// errors are handled inline as NACK-and-retry decisions in
/// [`crate::worker::Worker`] rather than surfaced here; this enum covers the
/// failures that abort a pipeline run outright.
#[derive(Debug, Error)]
pub enum RelayerError {
    #[error(transparent)]
    Chain(#[from] relayer_chain::ChainError),

    #[error(transparent)]
    Store(#[from] relayer_store::StoreError),

    #[error(transparent)]
    Queue(#[from] relayer_queue::QueueError),

    #[error(transparent)]
    Signer(#[from] relayer_signer::SignerError),

    #[error("message {0} references a destination chain with no configured dispatch key")]
    MissingDispatchKey(MessageId),

    #[error("batcher rejected offered message {0}: {1}")]
    BatchOfferRejected(MessageId, String),

    /// The pipeline stopped because the message already reached a terminal
    /// status (`Failed`/`Abandoned`) via a transition recorded inline; there
    /// is nothing further for the caller to act on beyond acking the queue
    /// item.
    #[error("message reached a terminal state")]
    Terminal,
}

/// A policy check failure: terminal, no retry, surfaced
/// as the `Failed` transition's reason string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    AmountExceedsLimit { amount: u128, limit: u128 },
    HourlyRateExceeded { count: u64, cap: u64 },
    DailyVolumeExceeded { projected: u128, cap: u128 },
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyViolation::AmountExceedsLimit { amount, limit } => {
                write!(f, "amount_exceeds_limit: {amount} > {limit}")
            }
            PolicyViolation::HourlyRateExceeded { count, cap } => {
                write!(f, "hourly_rate_exceeded: {count} >= {cap}")
            }
            PolicyViolation::DailyVolumeExceeded { projected, cap } => {
                write!(f, "daily_volume_exceeded: {projected} > {cap}")
            }
        }
    }
}
