//! Delivery Queue: at-least-once, partitioned, consumer-group work
//! distribution between the Listener and the Relayer Worker Pool.
//!
//! The distilled contract leaves the transport unspecified; this resolves
//! it as a Postgres-backed queue table reusing the same `sea-orm`
//! transaction machinery as the Message Store, rather than introducing a
//! second durable system.

pub mod entity;
pub mod error;
pub mod migration;
pub mod queue;

pub use error::QueueError;
pub use migration::Migrator;
pub use queue::{DeliveryQueue, WorkItem};
