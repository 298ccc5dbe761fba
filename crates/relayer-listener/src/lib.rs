//! Listener: per-source-chain translation of on-chain lock
//! events into durable `Pending` messages, enqueued exactly once each.

pub mod error;
pub mod listener;
pub mod pause;

pub use error::ListenerError;
pub use listener::{Listener, ListenerConfig, TickOutcome};
pub use pause::PauseRegistry;
