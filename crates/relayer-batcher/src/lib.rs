//! The Batcher: amortizes destination-chain gas by settling
//! many Signed messages sharing a `(source, destination)` pair in one
//! Merkle-committed transaction while preserving per-message verifiability.
//!
//! One [`accumulator::Accumulator`] actor per enabled pair accumulates
//! offered messages and seals on whichever trigger fires first (count,
//! wait, gas-saved estimate, manual flush); [`manager::BatcherManager`]
//! owns the set of accumulators and is the concrete type the binary wires
//! into the Relayer Worker Pool's [`relayer_worker::BatchOffer`] capability.

mod accumulator;
pub mod config;
pub mod error;
pub mod manager;
pub mod merkle;

pub use config::BatcherConfig;
pub use error::BatcherError;
pub use manager::{BatcherManager, ConfiguredBatchEligibility};
pub use merkle::{verify as merkle_verify, MerkleTree};
