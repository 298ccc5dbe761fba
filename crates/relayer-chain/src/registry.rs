use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;

use relayer_types::{ChainId, DigestAlgo};

use crate::account::AccountChainClient;
use crate::account_tx::{AccountAddressCodec, AccountTransactionBuilder};
use crate::client::ChainClient;
use crate::config::{ChainConfig, ChainKind};
use crate::endpoint::{Endpoint, EndpointPool};
use crate::error::ChainError;
use crate::evm::EvmChainClient;
use crate::evm_tx::{EvmAddressCodec, EvmTransactionBuilder};
use crate::tx::{AddressCodec, TransactionBuilder};

/// One configured chain, dispatching to the EVM or Account implementation
/// behind the uniform [`ChainClient`] trait ("Polymorphism for
/// chains"), as an enum-of-variants. Bundles
/// the matching [`TransactionBuilder`]/[`AddressCodec`] built over the same
/// [`EndpointPool`], since the Relayer Worker Pool and Batcher need both the
/// read path and the dispatch path for a chain behind one lookup.
pub enum ChainClientImpl {
    Evm {
        client: EvmChainClient,
        tx_builder: EvmTransactionBuilder,
        address_codec: EvmAddressCodec,
    },
    Account {
        client: AccountChainClient,
        tx_builder: AccountTransactionBuilder,
        address_codec: AccountAddressCodec,
    },
}

impl ChainClientImpl {
    pub fn from_config(config: &ChainConfig) -> Result<Self, ChainError> {
        let endpoints = config
            .rpc_endpoints
            .iter()
            .map(|url| Endpoint { url: url.clone() })
            .collect();
        let pool = Arc::new(EndpointPool::new(endpoints, config.endpoint_cooldown));
        match config.kind {
            ChainKind::Evm => {
                let contract = config
                    .bridge_contract
                    .parse::<Address>()
                    .map_err(|e| ChainError::Decode(format!("bad bridge contract address: {e}")))?;
                Ok(ChainClientImpl::Evm {
                    client: EvmChainClient::new(pool.clone(), config.confirmation_depth, contract),
                    tx_builder: EvmTransactionBuilder::new(pool, contract),
                    address_codec: EvmAddressCodec,
                })
            }
            ChainKind::Account => Ok(ChainClientImpl::Account {
                client: AccountChainClient::new(
                    pool.clone(),
                    config.confirmation_depth,
                    config.bridge_contract.clone(),
                ),
                tx_builder: AccountTransactionBuilder::new(pool),
                address_codec: AccountAddressCodec,
            }),
        }
    }

    pub fn as_client(&self) -> &dyn ChainClient {
        match self {
            ChainClientImpl::Evm { client,.. } => client,
            ChainClientImpl::Account { client,.. } => client,
        }
    }

    pub fn as_tx_builder(&self) -> &dyn TransactionBuilder {
        match self {
            ChainClientImpl::Evm { tx_builder,.. } => tx_builder,
            ChainClientImpl::Account { tx_builder,.. } => tx_builder,
        }
    }

    pub fn as_address_codec(&self) -> &dyn AddressCodec {
        match self {
            ChainClientImpl::Evm { address_codec,.. } => address_codec,
            ChainClientImpl::Account { address_codec,.. } => address_codec,
        }
    }

    /// The hash function this chain family's contracts expect over the
    /// canonical encoding.
    pub fn digest_algo(&self) -> DigestAlgo {
        match self {
            ChainClientImpl::Evm {.. } => DigestAlgo::Keccak256,
            ChainClientImpl::Account {.. } => DigestAlgo::Sha256,
        }
    }
}

/// Holds one [`ChainClientImpl`] per configured chain, keyed by [`ChainId`]
///. Construction-time failures (bad address, empty
/// endpoint list) are surfaced eagerly rather than on first use.
pub struct ChainRegistry {
    clients: HashMap<ChainId, ChainClientImpl>,
}

impl ChainRegistry {
    pub fn from_configs(configs: &[ChainConfig]) -> Result<Self, ChainError> {
        let mut clients = HashMap::with_capacity(configs.len());
        for config in configs {
            clients.insert(config.id.clone(), ChainClientImpl::from_config(config)?);
        }
        Ok(ChainRegistry { clients })
    }

    pub fn get(&self, chain: &ChainId) -> Result<&dyn ChainClient, ChainError> {
        self.clients
            .get(chain)
            .map(ChainClientImpl::as_client)
            .ok_or_else(|| ChainError::UnknownChain(chain.clone()))
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = &ChainId> {
        self.clients.keys()
    }

    pub fn digest_algo(&self, chain: &ChainId) -> Result<DigestAlgo, ChainError> {
        self.clients
            .get(chain)
            .map(ChainClientImpl::digest_algo)
            .ok_or_else(|| ChainError::UnknownChain(chain.clone()))
    }

    pub fn tx_builder(&self, chain: &ChainId) -> Result<&dyn TransactionBuilder, ChainError> {
        self.clients
            .get(chain)
            .map(ChainClientImpl::as_tx_builder)
            .ok_or_else(|| ChainError::UnknownChain(chain.clone()))
    }

    pub fn address_codec(&self, chain: &ChainId) -> Result<&dyn AddressCodec, ChainError> {
        self.clients
            .get(chain)
            .map(ChainClientImpl::as_address_codec)
            .ok_or_else(|| ChainError::UnknownChain(chain.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_chain_is_a_decode_free_distinct_error() {
        let registry = ChainRegistry::from_configs(&[]).unwrap();
        let err = registry.get(&ChainId("ethereum".into())).unwrap_err();
        assert!(matches!(err, ChainError::UnknownChain(_)));
    }
}
