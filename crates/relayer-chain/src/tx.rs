use async_trait::async_trait;
use relayer_types::ChainAddress;

use crate::error::ChainError;

/// An unsigned request to unlock funds/NFTs at a destination (/// "Destination-chain payload (output, individual)").
#[derive(Debug, Clone)]
pub struct UnlockRequest {
    pub message_id: [u8; 32],
    pub sender: ChainAddress,
    pub recipient: ChainAddress,
    pub token: ChainAddress,
    pub amount_or_token_id: u128,
    pub nonce: u64,
    pub signatures: Vec<Vec<u8>>,
}

/// A batch-unlock request ("Destination-chain payload (output,
/// batched)"): one leaf per message, a Merkle proof per leaf, and the
/// signature set collected over the root.
#[derive(Debug, Clone)]
pub struct BatchUnlockRequest {
    pub merkle_root: [u8; 32],
    pub leaves: Vec<[u8; 32]>,
    pub proofs: Vec<Vec<[u8; 32]>>,
    pub signatures: Vec<Vec<u8>>,
}

/// Signs and submits a destination-chain unlock call with the worker's
/// dispatch key ("sign the envelope... submit via
/// destination Chain Client"), returning the destination tx hash.
///
/// Kept as a narrow capability next to (not folded into) [`crate::client::ChainClient`]
/// ("Polymorphism for chains") because only the Relayer Worker Pool's
/// dispatch step needs it; the Listener and confirmation-polling paths never
/// touch a dispatch key.
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    async fn submit_unlock(
        &self,
        request: &UnlockRequest,
        dispatch_key: &[u8; 32],
    ) -> Result<String, ChainError>;

    async fn submit_batch_unlock(
        &self,
        request: &BatchUnlockRequest,
        dispatch_key: &[u8; 32],
    ) -> Result<String, ChainError>;
}

/// Parses/formats chain-typed addresses for a given chain family.
pub trait AddressCodec: Send + Sync {
    fn parse(&self, raw: &str) -> Result<ChainAddress, ChainError>;
    fn format(&self, addr: &ChainAddress) -> String;
}
