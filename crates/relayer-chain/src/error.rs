use thiserror::Error;

/// Errors surfaced by a [`crate::client::ChainClient`] implementation.
///
/// The `Transport`/`Transient` variants are retried by the caller (endpoint
/// rotation, rebuild-and-resubmit); `Permanent` carries the chain's own
/// rejection reason and drives a state machine transition rather than a retry.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transport error talking to {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("all {count} endpoints in the pool are on cooldown or failed")]
    EndpointPoolExhausted { count: usize },

    #[error("chain rejected the transaction transiently: {0}")]
    Transient(String),

    #[error("chain rejected the transaction permanently: {0}")]
    Permanent(String),

    #[error("timed out waiting for confirmation of {tx_hash} after {waited:?}")]
    ConfirmationTimeout {
        tx_hash: String,
        waited: std::time::Duration,
    },

    #[error("no chain client configured for chain {0:?}")]
    UnknownChain(relayer_types::ChainId),

    #[error("malformed response from endpoint: {0}")]
    Decode(String),
}

impl ChainError {
    /// Whether this error should be retried locally rather than bubbled up
    /// as a state-machine transition.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChainError::Transport {.. } | ChainError::Transient(_)
        )
    }
}
