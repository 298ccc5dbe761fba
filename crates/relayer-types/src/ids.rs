//! Identifier types shared across the relay pipeline.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 32-byte digest identifying a [`crate::message::Message`] uniquely and
/// deterministically, derived from `(source_chain_id, source_tx_hash, log_index, nonce)`.
///
/// Serializes as a `0x`-prefixed hex string, matching the on-chain convention
/// used by the destination contracts that verify it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub [u8; 32]);

impl MessageId {
    /// Derives the message id from the tuple the Listener observes on-chain.
    ///
    /// `message_id = keccak256(source_chain_id || source_tx_hash || log_index_be || nonce_be)`.
    pub fn derive(source_chain_id: &str, source_tx_hash: &[u8], log_index: u64, nonce: u64) -> Self {
        use sha3::{Digest, Keccak256};
        let mut hasher = Keccak256::new();
        hasher.update(source_chain_id.as_bytes());
        hasher.update(source_tx_hash);
        hasher.update(log_index.to_be_bytes());
        hasher.update(nonce.to_be_bytes());
        let out = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&out);
        MessageId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for MessageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let trimmed = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(trimmed).map_err(serde::de::Error::custom)?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("message_id must be 32 bytes"))?;
        Ok(MessageId(array))
    }
}

/// A chain identifier string, e.g. `"eip155:8453"` or `"substrate:rococo"`.
///
/// Kept as an owned string (rather than a CAIP-2 parsed struct) because the
/// relayer treats chain ids as opaque keys into the configured chain set;
/// the [`crate::chain`]-level crate is the one that interprets the prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub String);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChainId {
    fn from(value: &str) -> Self {
        ChainId(value.to_string())
    }
}

impl From<String> for ChainId {
    fn from(value: String) -> Self {
        ChainId(value)
    }
}

/// Identifies a validator in the cohort; opaque beyond equality/ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidatorId(pub String);

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UUID identifying a [`crate::batch::Batch`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub uuid::Uuid);

impl BatchId {
    pub fn new(id: uuid::Uuid) -> Self {
        BatchId(id)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_derivation_is_deterministic() {
        let a = MessageId::derive("eip155:1", b"txhash", 2, 7);
        let b = MessageId::derive("eip155:1", b"txhash", 2, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn message_id_derivation_is_sensitive_to_each_field() {
        let base = MessageId::derive("eip155:1", b"txhash", 2, 7);
        assert_ne!(base, MessageId::derive("eip155:2", b"txhash", 2, 7));
        assert_ne!(base, MessageId::derive("eip155:1", b"otherhash", 2, 7));
        assert_ne!(base, MessageId::derive("eip155:1", b"txhash", 3, 7));
        assert_ne!(base, MessageId::derive("eip155:1", b"txhash", 2, 8));
    }

    #[test]
    fn message_id_round_trips_through_serde() {
        let id = MessageId::derive("eip155:1", b"txhash", 2, 7);
        let json = serde_json::to_string(&id).unwrap();
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
