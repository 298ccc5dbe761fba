//! The atomic unit the relay pipeline carries ("Message").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChainId, MessageId};
use crate::status::MessageStatus;

/// Discriminates a token transfer from an NFT transfer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    TokenTransfer,
    NftTransfer,
}

/// A chain-typed address. The relayer never interprets the bytes itself;
/// formatting/parsing per chain family is the job of the `AddressCodec`
/// capability in `relayer-chain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAddress(pub String);

impl std::fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The payload-specific fields of a [`Message`]: either a fungible amount
/// or an NFT token id, matching `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageAmount {
    Fungible { amount: u128 },
    NonFungible { token_id: u128 },
}

/// The atomic unit the pipeline carries end to end.
///
/// Invariant: once `status` reaches a terminal state, no field other than
/// `updated_at` may be modified — enforced by the Store's compare-and-set,
/// not by this struct itself (the struct is a plain value type).
///
/// Invariant: `destination_tx_hash` is `Some` iff `status == Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub kind: MessageKind,
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    pub sender: ChainAddress,
    pub recipient: ChainAddress,
    pub token: ChainAddress,
    pub payload: MessageAmount,
    pub source_tx_hash: String,
    pub source_block: u64,
    pub source_log_index: u64,
    pub nonce: u64,
    pub status: MessageStatus,
    pub destination_tx_hash: Option<String>,
    pub destination_block: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Checks the two struct-level invariants calls out explicitly.
    /// Intended for use in tests and Store-layer assertions, not as a runtime
    /// gate (the Store is the sole mutator and enforces these by construction).
    pub fn invariants_hold(&self) -> bool {
        let completion_consistent = (self.status == MessageStatus::Completed)
        == self.destination_tx_hash.is_some();
        completion_consistent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: MessageStatus, destination_tx_hash: Option<&str>) -> Message {
        let now = Utc::now();
        Message {
            message_id: MessageId::derive("eip155:1", b"tx", 0, 1),
            kind: MessageKind::TokenTransfer,
            source_chain: ChainId::from("eip155:1"),
            destination_chain: ChainId::from("eip155:8453"),
            sender: ChainAddress("0xabc".into()),
            recipient: ChainAddress("0xdef".into()),
            token: ChainAddress("0xusdc".into()),
            payload: MessageAmount::Fungible { amount: 100 },
            source_tx_hash: "0xtx".into(),
            source_block: 12345,
            source_log_index: 2,
            nonce: 7,
            status,
            destination_tx_hash: destination_tx_hash.map(str::to_string),
            destination_block: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn completed_requires_destination_tx_hash() {
        assert!(sample(MessageStatus::Completed, Some("0xT1")).invariants_hold());
        assert!(!sample(MessageStatus::Completed, None).invariants_hold());
    }

    #[test]
    fn non_completed_must_not_carry_destination_tx_hash() {
        assert!(sample(MessageStatus::Pending, None).invariants_hold());
        assert!(!sample(MessageStatus::Pending, Some("0xT1")).invariants_hold());
    }
}
