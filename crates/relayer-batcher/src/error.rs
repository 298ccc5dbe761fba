use thiserror::Error;
use relayer_types::{BatchId, ChainId};

/// Errors raised by the Batcher ("Batcher-local errors").
#[derive(Debug, Error)]
pub enum BatcherError {
    #[error(transparent)]
    Chain(#[from] relayer_chain::ChainError),

    #[error(transparent)]
    Store(#[from] relayer_store::StoreError),

    #[error(transparent)]
    Signer(#[from] relayer_signer::SignerError),

    #[error("no accumulator configured for pair ({0}, {1})")]
    PairNotConfigured(ChainId, ChainId),

    #[error("no dispatch key configured for destination {0}")]
    MissingDispatchKey(ChainId),

    #[error("accumulator inbox for ({0}, {1}) is gone")]
    AccumulatorGone(ChainId, ChainId),

    #[error("batch {0} cannot be built from an empty leaf set")]
    EmptyBatch(BatchId),
}
