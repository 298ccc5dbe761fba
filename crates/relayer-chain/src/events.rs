use relayer_types::{ChainAddress, MessageKind};

/// A decoded `TokensLocked`/`NFTLocked` event ("Source-chain event").
///
/// The Listener must derive the same `message_id` the source contract
/// produced, so every field needed for that derivation is carried here
/// rather than re-fetched later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: MessageKind,
    pub source_tx_hash: Vec<u8>,
    pub source_block: u64,
    pub source_log_index: u64,
    pub sender: ChainAddress,
    pub recipient_on_destination: ChainAddress,
    pub token: ChainAddress,
    pub amount_or_token_id: u128,
    pub destination_chain_id: String,
    pub nonce: u64,
    pub timestamp: i64,
}

/// Outcome of `tx_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Included { height: u64 },
    Failed { reason: String },
}
