//! The `relayer: {...}` section of the deployment configuration.

use std::time::Duration;

use crate::policy::PolicyLimits;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct RelayerConfig {
    pub worker_count: usize,
    pub consumer_group: String,
    /// Top-level per-message deadline.
    pub processing_timeout: Duration,
    pub confirmation_timeout: Duration,
    /// Signature-collection wait before NACK-with-backoff.
    pub signature_collection_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub limits: PolicyLimits,
    pub signature_threshold: usize,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        RelayerConfig {
            worker_count: 10,
            consumer_group: "relayer".to_string(),
            processing_timeout: Duration::from_secs(5 * 60),
            confirmation_timeout: Duration::from_secs(10 * 60),
            signature_collection_timeout: Duration::from_secs(3 * 60),
            retry_policy: RetryPolicy::default(),
            limits: PolicyLimits {
                max_transaction_amount: u128::MAX,
                hourly_rate_per_sender: u64::MAX,
                daily_volume_per_sender: u128::MAX,
            },
            signature_threshold: 2,
        }
    }
}
