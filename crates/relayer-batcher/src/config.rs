use std::collections::HashSet;
use std::time::Duration;

use relayer_types::ChainId;

/// The `batching` configuration block ("Configuration"):
/// `{enabled_pairs[], max_batch_size, max_wait, min_gas_saved}`.
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    pub enabled_pairs: HashSet<(ChainId, ChainId)>,
    /// Seal trigger 1: message count reaches this (typical 50).
    pub max_batch_size: usize,
    /// Seal trigger 2: wait time since the first message in the open batch
    /// (typical 30s).
    pub max_wait: Duration,
    /// Seal trigger 3: accumulated `gas_saved_estimate` exceeds this.
    pub min_gas_saved: u128,
    /// Per-message gas-saved estimate used to compute the running total —
    /// a constant rather than a live gas-price oracle ("a
    /// constant protocol rate").
    pub gas_saved_per_message: u128,
    /// Amount threshold below which a message qualifies for batching (spec
    /// §4.5 step 5 "amount below per-message threshold").
    pub max_batchable_amount: u128,
}

impl BatcherConfig {
    pub fn pair_enabled(&self, source: &ChainId, destination: &ChainId) -> bool {
        self.enabled_pairs.contains(&(source.clone(), destination.clone()))
    }
}

impl Default for BatcherConfig {
    fn default() -> Self {
        BatcherConfig {
            enabled_pairs: HashSet::new(),
            max_batch_size: 50,
            max_wait: Duration::from_secs(30),
            min_gas_saved: u128::MAX,
            gas_saved_per_message: 21_000,
            max_batchable_amount: u128::MAX,
        }
    }
}
