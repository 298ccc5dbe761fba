//! Attestation records ("Signature").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, ValidatorId};

/// The signature scheme a validator used, tagged so the verifier can dispatch
/// without a side-channel ("Signer").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    EcdsaSecp256k1,
    Ed25519,
}

/// A single validator's attestation over a message's canonical digest.
///
/// Invariant: for a given `message_id`, every stored `Signature`
/// verifies against the same digest — enforced when the Store appends a row,
/// not represented structurally here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub message_id: MessageId,
    pub validator_id: ValidatorId,
    pub scheme: SignatureScheme,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
}
