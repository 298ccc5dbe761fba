//! EVM chain family implementation of [`ChainClient`]: a
//! `ProviderBuilder`-assembled provider per endpoint, and an
//! `AtomicUsize`-cursor rotation scheme over RPC endpoints, via
//! [`crate::endpoint::EndpointPool`].
//!
//! `query_events`/`send_signed_tx` below are built directly against the
//! `alloy_provider::Provider` trait for log queries and raw-tx broadcast.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_types_eth::{BlockNumberOrTag, Filter};
use alloy_sol_types::sol;
use async_trait::async_trait;
use relayer_types::{ChainAddress, MessageKind};
use tracing::instrument;

use crate::client::{poll_until_confirmed, ChainClient};
use crate::endpoint::{Endpoint, EndpointPool};
use crate::error::ChainError;
use crate::events::{RawEvent, TxStatus};

sol! {
    #[derive(Debug)]
    event TokensLocked(
        address indexed sender,
        bytes32 indexed recipientOnDestination,
        address token,
        uint256 amountOrTokenId,
        bytes32 destinationChainId,
        uint64 nonce,
        uint64 timestamp,
        uint8 kind
    );
}

pub struct EvmChainClient {
    pool: Arc<EndpointPool>,
    confirmation_depth: u64,
    contract: Address,
}

impl EvmChainClient {
    pub fn new(pool: Arc<EndpointPool>, confirmation_depth: u64, contract: Address) -> Self {
        EvmChainClient {
            pool,
            confirmation_depth,
            contract,
        }
    }

    fn provider_for(endpoint: &Endpoint) -> RootProvider {
        ProviderBuilder::new().connect_http(endpoint.url.clone())
    }

    fn transport_err(endpoint: &Endpoint, err: impl std::error::Error + Send + Sync + 'static) -> ChainError {
        ChainError::Transport {
            endpoint: endpoint.url.to_string(),
            source: Box::new(err),
        }
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    #[instrument(skip(self))]
    async fn latest_height(&self) -> Result<u64, ChainError> {
        self.pool
            .call(|endpoint| async move {
                let provider = Self::provider_for(endpoint);
                provider
                    .get_block_number()
                    .await
                    .map_err(|e| Self::transport_err(endpoint, e))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn header_timestamp(&self, height: u64) -> Result<i64, ChainError> {
        self.pool
            .call(|endpoint| async move {
                let provider = Self::provider_for(endpoint);
                let block = provider
                    .get_block_by_number(BlockNumberOrTag::Number(height))
                    .await
                    .map_err(|e| Self::transport_err(endpoint, e))?
                    .ok_or_else(|| ChainError::Decode(format!("block {height} not found")))?;
                Ok(block.header.timestamp as i64)
            })
            .await
    }

    fn confirmation_depth(&self) -> u64 {
        self.confirmation_depth
    }

    #[instrument(skip(self))]
    async fn query_events(
        &self,
        contract: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawEvent>, ChainError> {
        let contract_addr = contract
            .parse::<Address>()
            .map_err(|e| ChainError::Decode(format!("bad contract address {contract}: {e}")))?;
        self.pool
            .call(|endpoint| async move {
                let provider = Self::provider_for(endpoint);
                let filter = Filter::new()
                    .address(contract_addr)
                    .from_block(from)
                    .to_block(to);
                let logs = provider
                    .get_logs(&filter)
                    .await
                    .map_err(|e| Self::transport_err(endpoint, e))?;
                logs.into_iter()
                    .map(|log| decode_raw_event(&log))
                    .collect::<Result<Vec<_>, _>>()
            })
            .await
    }

    #[instrument(skip(self, bytes))]
    async fn send_signed_tx(&self, bytes: Vec<u8>) -> Result<String, ChainError> {
        self.pool
            .call(|endpoint| {
                let bytes = bytes.clone();
                async move {
                    let provider = Self::provider_for(endpoint);
                    let pending = provider
                        .send_raw_transaction(&bytes)
                        .await
                        .map_err(|e| Self::transport_err(endpoint, e))?;
                    Ok(pending.tx_hash.to_string())
                }
            })
            .await
    }

    #[instrument(skip(self))]
    async fn tx_status(&self, tx_hash: &str) -> Result<TxStatus, ChainError> {
        let hash: B256 = tx_hash
            .parse()
            .map_err(|_| ChainError::Decode(format!("bad tx hash {tx_hash}")))?;
        self.pool
            .call(|endpoint| async move {
                let provider = Self::provider_for(endpoint);
                let receipt = provider
                    .get_transaction_receipt(hash)
                    .await
                    .map_err(|e| Self::transport_err(endpoint, e))?;
                Ok(match receipt {
                    None => TxStatus::Pending,
                    Some(r) if r.status => TxStatus::Included {
                        height: r.block_number.unwrap_or_default(),
                    },
                    Some(_) => TxStatus::Failed {
                        reason: "reverted".to_string(),
                    },
                })
            })
            .await
    }

    async fn wait_confirmed(&self, tx_hash: &str, timeout: Duration) -> Result<(), ChainError> {
        poll_until_confirmed(self, tx_hash, timeout).await
    }

    #[instrument(skip(self))]
    async fn native_balance(&self, addr: &ChainAddress) -> Result<u128, ChainError> {
        let address = addr
            .0
            .parse::<Address>()
            .map_err(|e| ChainError::Decode(format!("bad address {}: {e}", addr.0)))?;
        self.pool
            .call(|endpoint| async move {
                let provider = Self::provider_for(endpoint);
                let balance = provider
                    .get_balance(address)
                    .await
                    .map_err(|e| Self::transport_err(endpoint, e))?;
                u128::try_from(balance).map_err(|_| ChainError::Decode("balance overflows u128".into()))
            })
            .await
    }
}

fn decode_raw_event(log: &alloy_rpc_types_eth::Log) -> Result<RawEvent, ChainError> {
    let decoded = log
        .log_decode::<TokensLocked>()
        .map_err(|e| ChainError::Decode(format!("TokensLocked decode failed: {e}")))?;
    let event = &decoded.inner.data;
    let kind = match event.kind {
        0 => MessageKind::TokenTransfer,
        1 => MessageKind::NftTransfer,
        other => return Err(ChainError::Decode(format!("unknown event kind tag {other}"))),
    };
    Ok(RawEvent {
        kind,
        source_tx_hash: log
            .transaction_hash
            .ok_or_else(|| ChainError::Decode("log missing transaction hash".into()))?
            .to_vec(),
            source_block: log
            .block_number
            .ok_or_else(|| ChainError::Decode("log missing block number".into()))?,
            source_log_index: log
            .log_index
            .ok_or_else(|| ChainError::Decode("log missing log index".into()))?,
            sender: ChainAddress(event.sender.to_string()),
        recipient_on_destination: ChainAddress(hex::encode(event.recipientOnDestination)),
        token: ChainAddress(event.token.to_string()),
        amount_or_token_id: u128::try_from(event.amountOrTokenId)
            .map_err(|_| ChainError::Decode("amountOrTokenId overflows u128".into()))?,
            destination_chain_id: hex::encode(event.destinationChainId),
        nonce: event.nonce,
        timestamp: event.timestamp as i64,
    })
}
