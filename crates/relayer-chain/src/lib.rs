//! Chain Client abstraction: a uniform async capability over
//! per-chain-family RPC, with ordered-endpoint failover and narrow
//! transaction-building/address-parsing capabilities composed in by callers.
//!
//! An enum-of-variants `ChainRegistry` over a `FillProvider` composition;
//! the non-EVM [`account::AccountChainClient`] is shaped after
//! `paritytech-polkadot-sdk`'s `relay-substrate-client` crate.

pub mod account;
pub mod account_tx;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod evm;
pub mod evm_tx;
pub mod events;
pub mod registry;
pub mod tx;

pub use account_tx::{AccountAddressCodec, AccountTransactionBuilder};
pub use client::ChainClient;
pub use config::{ChainConfig, ChainKind};
pub use endpoint::{Endpoint, EndpointPool};
pub use error::ChainError;
pub use evm_tx::{EvmAddressCodec, EvmTransactionBuilder};
pub use events::{RawEvent, TxStatus};
pub use registry::{ChainClientImpl, ChainRegistry};
pub use tx::{AddressCodec, BatchUnlockRequest, TransactionBuilder, UnlockRequest};
