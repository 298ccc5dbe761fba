//! Durable, transactional Message Store: the sole persistence
//! layer for `Message`, `Signature`, `Batch`, `ProcessedMessage` and listener
//! cursors, backed by `sea-orm` over Postgres (or sqlite for tests).
//!
//! Grounded on `blockscout-blockscout-rs`'s `da-indexer` split between
//! `*-entity` (models), `*-migration` (schema) and a logic crate that wraps
//! a `DatabaseConnection`; here that logic crate is `relayer-store` itself.

pub mod convert;
pub mod error;
pub mod janitor;
pub mod lease;
pub mod store;

pub use error::StoreError;
pub use janitor::Janitor;
pub use lease::{Lease, LeaseTable};
pub use store::{InsertOutcome, Store};
