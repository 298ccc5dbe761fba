//! The canonical digest every validator signs and every destination contract
//! re-derives before verifying a signature set.

use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::message::{Message, MessageAmount};

/// Which hash function the destination chain expects over the canonical
/// encoding — Keccak-256 for EVM destinations, SHA-256 for Ed25519 ones.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DigestAlgo {
    Keccak256,
    Sha256,
}

/// Fixed concatenation of a message's semantic fields, in the exact order
///: source_chain_id, destination_chain_id,
/// message_id, kind_tag, sender, recipient, token, amount_or_token_id, nonce.
fn canonical_encoding(message: &Message) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(message.source_chain.0.as_bytes());
    buf.extend_from_slice(message.destination_chain.0.as_bytes());
    buf.extend_from_slice(message.message_id.as_bytes());
    let kind_tag: u8 = match message.kind {
        crate::message::MessageKind::TokenTransfer => 0,
        crate::message::MessageKind::NftTransfer => 1,
    };
    buf.push(kind_tag);
    buf.extend_from_slice(message.sender.0.as_bytes());
    buf.extend_from_slice(message.recipient.0.as_bytes());
    buf.extend_from_slice(message.token.0.as_bytes());
    match message.payload {
        MessageAmount::Fungible { amount } => buf.extend_from_slice(&amount.to_be_bytes()),
        MessageAmount::NonFungible { token_id } => buf.extend_from_slice(&token_id.to_be_bytes()),
    }
    buf.extend_from_slice(&message.nonce.to_be_bytes());
    buf
}

/// Computes `H(canonical_encoding(message))` with the hash function the
/// destination chain expects.
pub fn canonical_digest(message: &Message, algo: DigestAlgo) -> [u8; 32] {
    let encoded = canonical_encoding(message);
    digest_bytes(&encoded, algo)
}

/// Hashes arbitrary bytes with the requested algorithm; used both for
/// message digests and for Merkle leaves/internal nodes.
pub fn digest_bytes(bytes: &[u8], algo: DigestAlgo) -> [u8; 32] {
    match algo {
        DigestAlgo::Keccak256 => {
            let mut hasher = Keccak256::new();
            hasher.update(bytes);
            let out = hasher.finalize();
            let mut array = [0u8; 32];
            array.copy_from_slice(&out);
            array
        }
        DigestAlgo::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let out = hasher.finalize();
            let mut array = [0u8; 32];
            array.copy_from_slice(&out);
            array
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ChainId, MessageId};
    use crate::message::{ChainAddress, MessageKind};
    use chrono::Utc;

    fn sample() -> Message {
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
            source_block: 1,
            source_log_index: 0,
            nonce: 1,
            status: crate::status::MessageStatus::Signing,
            destination_tx_hash: None,
            destination_block: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn digest_is_deterministic_and_scheme_sensitive() {
        let message = sample();
        let a = canonical_digest(&message, DigestAlgo::Keccak256);
        let b = canonical_digest(&message, DigestAlgo::Keccak256);
        assert_eq!(a, b);
        let c = canonical_digest(&message, DigestAlgo::Sha256);
        assert_ne!(a, c);
    }

    #[test]
    fn digest_changes_when_fields_change() {
        let mut message = sample();
        let original = canonical_digest(&message, DigestAlgo::Keccak256);
        message.payload = MessageAmount::Fungible { amount: 101 };
        let changed = canonical_digest(&message, DigestAlgo::Keccak256);
        assert_ne!(original, changed);
    }
}
