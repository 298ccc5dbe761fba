//! Shared data model, canonical digest and state machine for the bridge relayer.
//!
//! This crate has no I/O of its own: it defines the [`message::Message`],
//! [`signature::Signature`], [`batch::Batch`] and [`batch::ProcessedMessage`]
//! value types, the [`status`] state machine, and the [`digest`] module
//! every signer/verifier and the Batcher's Merkle tree build on.

pub mod batch;
pub mod digest;
pub mod ids;
pub mod message;
pub mod signature;
pub mod status;

pub use batch::{Batch, ProcessedMessage};
pub use digest::{canonical_digest, digest_bytes, DigestAlgo};
pub use ids::{BatchId, ChainId, MessageId, ValidatorId};
pub use message::{ChainAddress, Message, MessageAmount, MessageKind};
pub use signature::{Signature, SignatureScheme};
pub use status::{BatchStatus, MessageStatus};
