//! EVM [`TransactionBuilder`]/[`AddressCodec`]: a `sol!`-generated call
//! type for ABI encoding, a `ProviderBuilder::new().wallet(wallet)`-composed
//! provider turning a `PrivateKeySigner` into a transaction-signing
//! provider, and `send_transaction` to dispatch.

use std::sync::Arc;

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use relayer_types::ChainAddress;

use crate::endpoint::{Endpoint, EndpointPool};
use crate::error::ChainError;
use crate::tx::{AddressCodec, BatchUnlockRequest, TransactionBuilder, UnlockRequest};

sol! {
    function unlock(bytes32 messageId, address recipient, address token, uint256 amountOrTokenId, uint64 nonce, bytes[] signatures) external;
    function batchUnlock(bytes32 merkleRoot, bytes32[] leaves, bytes32[][] proofs, bytes[] signatures) external;
}

pub struct EvmTransactionBuilder {
    pool: Arc<EndpointPool>,
    contract: Address,
}

impl EvmTransactionBuilder {
    pub fn new(pool: Arc<EndpointPool>, contract: Address) -> Self {
        EvmTransactionBuilder { pool, contract }
    }

    fn wallet_for(dispatch_key: &[u8; 32]) -> Result<EthereumWallet, ChainError> {
        let signer = PrivateKeySigner::from_bytes(dispatch_key.into())
            .map_err(|e| ChainError::Decode(format!("bad dispatch key: {e}")))?;
        Ok(EthereumWallet::from(signer))
    }

    async fn dispatch(
        &self,
        endpoint: &Endpoint,
        wallet: EthereumWallet,
        calldata: Vec<u8>,
    ) -> Result<String, ChainError> {
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(endpoint.url.clone());
        let tx = TransactionRequest::default()
            .to(self.contract)
            .input(Bytes::from(calldata).into());
        let pending = provider.send_transaction(tx).await.map_err(|e| ChainError::Transport {
            endpoint: endpoint.url.to_string(),
            source: Box::new(e),
        })?;
        Ok(format!("{:#x}", pending.tx_hash))
    }
}

fn parse_address(addr: &ChainAddress) -> Result<Address, ChainError> {
    addr.0
        .parse::<Address>()
        .map_err(|e| ChainError::Decode(format!("bad address {}: {e}", addr.0)))
}

#[async_trait]
impl TransactionBuilder for EvmTransactionBuilder {
    async fn submit_unlock(
        &self,
        request: &UnlockRequest,
        dispatch_key: &[u8; 32],
    ) -> Result<String, ChainError> {
        let wallet = Self::wallet_for(dispatch_key)?;
        let call = unlockCall {
            messageId: FixedBytes::from(request.message_id),
            recipient: parse_address(&request.recipient)?,
            token: parse_address(&request.token)?,
            amountOrTokenId: U256::from(request.amount_or_token_id),
            nonce: request.nonce,
            signatures: request.signatures.iter().cloned().map(Bytes::from).collect(),
        };
        let calldata = call.abi_encode();
        self.pool
            .call(|endpoint| {
                let wallet = wallet.clone();
                let calldata = calldata.clone();
                async move { self.dispatch(endpoint, wallet, calldata).await }
            })
            .await
    }

    async fn submit_batch_unlock(
        &self,
        request: &BatchUnlockRequest,
        dispatch_key: &[u8; 32],
    ) -> Result<String, ChainError> {
        let wallet = Self::wallet_for(dispatch_key)?;
        let call = batchUnlockCall {
            merkleRoot: FixedBytes::from(request.merkle_root),
            leaves: request.leaves.iter().copied().map(FixedBytes::from).collect(),
            proofs: request
                .proofs
                .iter()
                .map(|proof| proof.iter().copied().map(FixedBytes::from).collect())
                .collect(),
                signatures: request.signatures.iter().cloned().map(Bytes::from).collect(),
        };
        let calldata = call.abi_encode();
        self.pool
            .call(|endpoint| {
                let wallet = wallet.clone();
                let calldata = calldata.clone();
                async move { self.dispatch(endpoint, wallet, calldata).await }
            })
            .await
    }
}

pub struct EvmAddressCodec;

impl AddressCodec for EvmAddressCodec {
    fn parse(&self, raw: &str) -> Result<ChainAddress, ChainError> {
        let addr = raw
            .parse::<Address>()
            .map_err(|e| ChainError::Decode(format!("bad EVM address {raw}: {e}")))?;
        Ok(ChainAddress(addr.to_string()))
    }

    fn format(&self, addr: &ChainAddress) -> String {
        addr.0.clone()
    }
}
