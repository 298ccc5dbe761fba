use std::time::Duration;

use async_trait::async_trait;
use relayer_types::ChainAddress;

use crate::error::ChainError;
use crate::events::{RawEvent, TxStatus};

/// The capability every source/destination chain family implements (spec
/// §4.1). A single uniform interface lets the Listener and Relayer Worker
/// Pool stay chain-agnostic; chain-specific concerns (transaction envelope
/// building, signature `v` adjustment, address parsing) live behind the
/// narrower [`crate::tx::TransactionBuilder`]/[`crate::tx::AddressCodec`]
/// capabilities instead of leaking into this trait.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn latest_height(&self) -> Result<u64, ChainError>;

    /// Block header timestamp at `height`, used by the Listener to stamp
    /// `Message::created_at` independent of wall-clock skew between chains.
    async fn header_timestamp(&self, height: u64) -> Result<i64, ChainError>;

    fn confirmation_depth(&self) -> u64;

    /// Inclusive block range `[from, to]`; the caller (Listener) paginates
    /// in `batch_width`-sized windows
    async fn query_events(
        &self,
        contract: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawEvent>, ChainError>;

    async fn send_signed_tx(&self, bytes: Vec<u8>) -> Result<String, ChainError>;

    async fn tx_status(&self, tx_hash: &str) -> Result<TxStatus, ChainError>;

    /// Polls `tx_status` until `latest_height - inclusion_height >=
    /// confirmation_depth`, or returns [`ChainError::ConfirmationTimeout`].
    async fn wait_confirmed(&self, tx_hash: &str, timeout: Duration) -> Result<(), ChainError>;

    async fn native_balance(&self, addr: &ChainAddress) -> Result<u128, ChainError>;
}

/// Default `wait_confirmed` loop shared by every [`ChainClient`]
/// implementation: poll on a fixed cadence, succeed once confirmation
/// depth is cleared, fail fast on a `Failed` status, time out otherwise.
pub(crate) async fn poll_until_confirmed<C: ChainClient + ?Sized>(
    client: &C,
    tx_hash: &str,
    timeout: Duration,
) -> Result<(), ChainError> {
    let deadline = std::time::Instant::now() + timeout;
    let poll_interval = Duration::from_secs(2);
    loop {
        match client.tx_status(tx_hash).await? {
            TxStatus::Included { height } => {
                let tip = client.latest_height().await?;
                if tip.saturating_sub(height) >= client.confirmation_depth() {
                    return Ok(());
                }
            }
            TxStatus::Failed { reason } => return Err(ChainError::Permanent(reason)),
            TxStatus::Pending => {}
        }
        if std::time::Instant::now() >= deadline {
            return Err(ChainError::ConfirmationTimeout {
                tx_hash: tx_hash.to_string(),
                waited: timeout,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}
