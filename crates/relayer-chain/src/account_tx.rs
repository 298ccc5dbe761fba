//! Account-chain [`TransactionBuilder`]/[`AddressCodec`], the non-EVM counterpart to [`crate::evm_tx::EvmTransactionBuilder`].
//! There is no teacher precedent for a non-EVM dispatch path; this mirrors
//! [`crate::account::AccountChainClient`]'s JSON-RPC call shape, signing the
//! submission envelope with the worker's Ed25519 dispatch key the way
//! `relayer-signer`'s `Ed25519Signer` already signs message digests.

use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use relayer_types::ChainAddress;
use serde_json::json;

use crate::endpoint::EndpointPool;
use crate::error::ChainError;
use crate::tx::{AddressCodec, BatchUnlockRequest, TransactionBuilder, UnlockRequest};

pub struct AccountTransactionBuilder {
    pool: Arc<EndpointPool>,
}

impl AccountTransactionBuilder {
    pub fn new(pool: Arc<EndpointPool>) -> Self {
        AccountTransactionBuilder { pool }
    }

    fn signing_key(dispatch_key: &[u8; 32]) -> SigningKey {
        SigningKey::from_bytes(dispatch_key)
    }
}

#[async_trait]
impl TransactionBuilder for AccountTransactionBuilder {
    async fn submit_unlock(
        &self,
        request: &UnlockRequest,
        dispatch_key: &[u8; 32],
    ) -> Result<String, ChainError> {
        let key = Self::signing_key(dispatch_key);
        let payload = json!({
            "message_id": format!("0x{}", hex::encode(request.message_id)),
            "recipient": request.recipient.0,
            "token": request.token.0,
            "amount_or_token_id": request.amount_or_token_id.to_string(),
            "nonce": request.nonce,
            "signatures": request.signatures.iter().map(hex::encode).collect::<Vec<_>>(),
        });
        let envelope = sign_envelope(&key, &payload);
        self.pool
            .call(|endpoint| {
                let envelope = envelope.clone();
                async move {
                    let client = crate::account::connect(endpoint).await?;
                    client
                        .request::<_, serde_json::Value>("bridge_submitUnlock", (envelope,))
                        .await
                        .map_err(|e| ChainError::Transport {
                            endpoint: endpoint.url.to_string(),
                            source: Box::new(e),
                        })
                        .and_then(extract_tx_hash)
                }
            })
            .await
    }

    async fn submit_batch_unlock(
        &self,
        request: &BatchUnlockRequest,
        dispatch_key: &[u8; 32],
    ) -> Result<String, ChainError> {
        let key = Self::signing_key(dispatch_key);
        let payload = json!({
            "merkle_root": format!("0x{}", hex::encode(request.merkle_root)),
            "leaves": request.leaves.iter().map(hex::encode).collect::<Vec<_>>(),
            "proofs": request
                .proofs
                .iter()
                .map(|proof| proof.iter().map(hex::encode).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
                "signatures": request.signatures.iter().map(hex::encode).collect::<Vec<_>>(),
        });
        let envelope = sign_envelope(&key, &payload);
        self.pool
            .call(|endpoint| {
                let envelope = envelope.clone();
                async move {
                    let client = crate::account::connect(endpoint).await?;
                    client
                        .request::<_, serde_json::Value>("bridge_submitBatchUnlock", (envelope,))
                        .await
                        .map_err(|e| ChainError::Transport {
                            endpoint: endpoint.url.to_string(),
                            source: Box::new(e),
                        })
                        .and_then(extract_tx_hash)
                }
            })
            .await
    }
}

fn sign_envelope(key: &SigningKey, payload: &serde_json::Value) -> serde_json::Value {
    let canonical = payload.to_string();
    let signature = key.sign(canonical.as_bytes());
    json!({
        "payload": payload,
        "dispatcher": hex::encode(key.verifying_key().to_bytes()),
        "signature": hex::encode(signature.to_bytes()),
    })
}

fn extract_tx_hash(value: serde_json::Value) -> Result<String, ChainError> {
    value
        .get("tx_hash")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ChainError::Decode("submission response missing tx_hash".into()))
}

pub struct AccountAddressCodec;

impl AddressCodec for AccountAddressCodec {
    fn parse(&self, raw: &str) -> Result<ChainAddress, ChainError> {
        Ok(ChainAddress(raw.to_string()))
    }

    fn format(&self, addr: &ChainAddress) -> String {
        addr.0.clone()
    }
}
