//! Batch commitment records ("Batch").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BatchId, ChainId, MessageId};
use crate::status::BatchStatus;

/// A Merkle-committed group of messages sharing `(source_chain, destination_chain)`.
///
/// Invariant: once `status >= Sealed`, `message_ids` and `merkle_root` are frozen.
/// The Batcher is the only writer; the Relayer only reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: BatchId,
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    pub merkle_root: Option<[u8; 32]>,
    /// Ordered by `message_id` ascending; this order defines leaf index.
    pub message_ids: Vec<MessageId>,
    pub status: BatchStatus,
    pub destination_tx_hash: Option<String>,
    pub gas_saved_estimate: Option<u128>,
    pub created_at: DateTime<Utc>,
    pub sealed_at: Option<DateTime<Utc>>,
}

impl Batch {
    pub fn new_assembling(batch_id: BatchId, source_chain: ChainId, destination_chain: ChainId) -> Self {
        let now = Utc::now();
        Batch {
            batch_id,
            source_chain,
            destination_chain,
            merkle_root: None,
            message_ids: Vec::new(),
            status: BatchStatus::Assembling,
            destination_tx_hash: None,
            gas_saved_estimate: None,
            created_at: now,
            sealed_at: None,
        }
    }

    pub fn is_frozen(&self) -> bool {
        !matches!(self.status, BatchStatus::Assembling)
    }
}

/// The exactly-once completion oracle ("ProcessedMessage").
///
/// Written exactly once when a `Completed` transition commits; the relayer
/// consults this independently of `Message.status` before submitting, so a
/// crash between the status update and a later duplicate attempt cannot
/// cause a second on-chain unlock ("Exactly-once property").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedMessage {
    pub message_id: MessageId,
    pub destination_tx_hash: String,
    pub confirmed_at: DateTime<Utc>,
}
