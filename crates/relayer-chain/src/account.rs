//! Account-based (non-EVM) chain family implementation of [`ChainClient`]
//! ("Polymorphism for chains"). The teacher's stack has no
//! non-EVM client; this is enriched conceptually from
//! `paritytech-polkadot-sdk`'s `relay-substrate-client` crate (endpoint
//! list, header-by-number, balance-by-account queries over JSON-RPC) without
//! adopting its Substrate-specific types, since nothing downstream of this
//! crate needs SCALE-codec precision — only the uniform `ChainClient`
//! contract. The JSON-RPC transport itself reuses `alloy_rpc_client::RpcClient`,
//! which is chain-agnostic plumbing already in the dependency stack (the
//! teacher connects it the same way in `evm.rs`'s `RpcClient::builder()`).

use std::sync::Arc;
use std::time::Duration;

use alloy_rpc_client::RpcClient;
use async_trait::async_trait;
use relayer_types::{ChainAddress, MessageKind};
use serde_json::Value;
use tracing::instrument;

use crate::client::{poll_until_confirmed, ChainClient};
use crate::endpoint::{Endpoint, EndpointPool};
use crate::error::ChainError;
use crate::events::{RawEvent, TxStatus};

pub struct AccountChainClient {
    pool: Arc<EndpointPool>,
    confirmation_depth: u64,
    contract: String,
}

impl AccountChainClient {
    pub fn new(pool: Arc<EndpointPool>, confirmation_depth: u64, contract: String) -> Self {
        AccountChainClient {
            pool,
            confirmation_depth,
            contract,
        }
    }

    async fn connect(endpoint: &Endpoint) -> Result<RpcClient, ChainError> {
        connect(endpoint).await
    }

    async fn call<P: serde::Serialize + Send + Sync>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<Value, ChainError>
    where
        P: Clone,
    {
        self.pool
            .call(|endpoint| {
                let params = params.clone();
                async move {
                    let client = Self::connect(endpoint).await?;
                    client
                        .request::<P, Value>(method, params)
                        .await
                        .map_err(|e| ChainError::Transport {
                            endpoint: endpoint.url.to_string(),
                            source: Box::new(e),
                        })
                }
            })
            .await
    }
}

#[async_trait]
impl ChainClient for AccountChainClient {
    #[instrument(skip(self))]
    async fn latest_height(&self) -> Result<u64, ChainError> {
        let value = self.call("chain_getLatestHeight", ()).await?;
        value
            .get("height")
            .and_then(Value::as_u64)
            .ok_or_else(|| ChainError::Decode("missing height in chain_getLatestHeight response".into()))
    }

    #[instrument(skip(self))]
    async fn header_timestamp(&self, height: u64) -> Result<i64, ChainError> {
        let value = self.call("chain_getHeader", (height,)).await?;
        value
            .get("timestamp")
            .and_then(Value::as_i64)
            .ok_or_else(|| ChainError::Decode("missing timestamp in chain_getHeader response".into()))
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
        let contract = if contract.is_empty() { &self.contract } else { contract };
        let value = self
            .call("bridge_queryEvents", (contract.to_string(), from, to))
            .await?;
        let items = value
            .as_array()
            .ok_or_else(|| ChainError::Decode("bridge_queryEvents did not return an array".into()))?;
        items.iter().map(decode_raw_event).collect()
    }

    #[instrument(skip(self, bytes))]
    async fn send_signed_tx(&self, bytes: Vec<u8>) -> Result<String, ChainError> {
        let value = self
            .call("author_submitExtrinsic", (hex::encode(&bytes),))
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChainError::Decode("author_submitExtrinsic did not return a hash".into()))
    }

    #[instrument(skip(self))]
    async fn tx_status(&self, tx_hash: &str) -> Result<TxStatus, ChainError> {
        let value = self.call("author_txStatus", (tx_hash.to_string(),)).await?;
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::Decode("missing status in author_txStatus response".into()))?;
        Ok(match status {
            "pending" => TxStatus::Pending,
            "included" => TxStatus::Included {
                height: value
                    .get("height")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| ChainError::Decode("included status missing height".into()))?,
            },
            "failed" => TxStatus::Failed {
                reason: value
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            },
            other => return Err(ChainError::Decode(format!("unknown tx status {other}"))),
        })
    }

    async fn wait_confirmed(&self, tx_hash: &str, timeout: Duration) -> Result<(), ChainError> {
        poll_until_confirmed(self, tx_hash, timeout).await
    }

    #[instrument(skip(self))]
    async fn native_balance(&self, addr: &ChainAddress) -> Result<u128, ChainError> {
        let value = self.call("state_getBalance", (addr.0.clone(),)).await?;
        value
            .get("free")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u128>().ok())
            .ok_or_else(|| ChainError::Decode("missing/unparseable balance".into()))
    }
}

pub(crate) async fn connect(endpoint: &Endpoint) -> Result<RpcClient, ChainError> {
    RpcClient::builder()
        .connect(endpoint.url.as_str())
        .await
        .map_err(|e| ChainError::Transport {
            endpoint: endpoint.url.to_string(),
            source: Box::new(e),
        })
}

fn decode_raw_event(value: &Value) -> Result<RawEvent, ChainError> {
    let get_str = |key: &str| -> Result<String, ChainError> {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ChainError::Decode(format!("event missing field {key}")))
    };
    let get_u64 = |key: &str| -> Result<u64, ChainError> {
        value
            .get(key)
            .and_then(Value::as_u64)
            .ok_or_else(|| ChainError::Decode(format!("event missing field {key}")))
    };
    let kind = match get_str("kind")?.as_str() {
        "token_transfer" => MessageKind::TokenTransfer,
        "nft_transfer" => MessageKind::NftTransfer,
        other => return Err(ChainError::Decode(format!("unknown event kind {other}"))),
    };
    Ok(RawEvent {
        kind,
        source_tx_hash: hex::decode(get_str("source_tx_hash")?.trim_start_matches("0x"))
            .map_err(|e| ChainError::Decode(e.to_string()))?,
            source_block: get_u64("source_block")?,
        source_log_index: get_u64("source_log_index")?,
        sender: ChainAddress(get_str("sender")?),
        recipient_on_destination: ChainAddress(get_str("recipient_on_destination")?),
        token: ChainAddress(get_str("token")?),
        amount_or_token_id: value
            .get("amount_or_token_id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u128>().ok())
            .ok_or_else(|| ChainError::Decode("event missing amount_or_token_id".into()))?,
            destination_chain_id: get_str("destination_chain_id")?,
        nonce: get_u64("nonce")?,
        timestamp: value
            .get("timestamp")
            .and_then(Value::as_i64)
            .ok_or_else(|| ChainError::Decode("event missing timestamp".into()))?,
    })
}
