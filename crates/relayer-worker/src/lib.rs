//! Relayer Worker Pool: N workers draining the Delivery Queue,
//! each re-verifying a message at its source, enforcing policy limits,
//! collecting the validator cohort's signatures, and dispatching the
//! unlock to the destination chain — individually or via the Batcher.

pub mod batch_offer;
pub mod config;
pub mod error;
pub mod nonce;
pub mod policy;
pub mod pool;
pub mod retry;
pub mod worker;

pub use batch_offer::{BatchEligibility, BatchOffer, NeverBatch};
pub use config::RelayerConfig;
pub use error::{PolicyViolation, RelayerError};
pub use nonce::NonceIssuer;
pub use policy::PolicyLimits;
pub use pool::WorkerPool;
pub use retry::RetryPolicy;
pub use worker::Worker;
