use thiserror::Error;
use relayer_types::MessageId;

/// Errors raised by the Message Store ("Store contention").
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("message {0} was not found")]
    MessageNotFound(MessageId),

    #[error("status compare-and-set failed for {message_id}: expected {expected}, found {actual}")]
    StatusMismatch {
        message_id: MessageId,
        expected: relayer_types::MessageStatus,
        actual: relayer_types::MessageStatus,
    },

    #[error("lease for {0} is held by another worker")]
    LeaseHeld(MessageId),

    #[error("listener cursor update for {chain} is non-increasing: current {current}, proposed {proposed}")]
    NonMonotonicCursor {
        chain: relayer_types::ChainId,
        current: u64,
        proposed: u64,
    },

    #[error("stored field could not be decoded: {0}")]
    Decode(String),
}
