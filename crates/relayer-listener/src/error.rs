use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Chain(#[from] relayer_chain::error::ChainError),

    #[error(transparent)]
    Store(#[from] relayer_store::StoreError),

    #[error(transparent)]
    Queue(#[from] relayer_queue::QueueError),

    #[error("unknown chain {0}")]
    UnknownChain(relayer_types::ChainId),
}
