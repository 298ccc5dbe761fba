use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;
use url::Url;

use crate::error::ChainError;

/// One RPC endpoint in a chain's failover list.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: Url,
}

/// Ordered RPC endpoint list with failover ("Failover policy").
///
/// The hot path is a read-only lookup of the current index, so the cursor is
/// an [`AtomicUsize`], the same rotation mechanism used elsewhere for
/// signer-address rotation, reused here for *endpoint* rotation. Cooldown
/// bookkeeping touches all endpoints'
/// state together, so it sits behind a [`Mutex`] rather than per-endpoint
/// atomics.
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    cursor: AtomicUsize,
    cooldowns: Mutex<Vec<Option<Instant>>>,
    cooldown: Duration,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<Endpoint>, cooldown: Duration) -> Self {
        let n = endpoints.len();
        EndpointPool {
            endpoints,
            cursor: AtomicUsize::new(0),
            cooldowns: Mutex::new(vec![None; n]),
            cooldown,
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Runs `op` against the current endpoint, rotating and retrying on
    /// transport/transient error up to once per configured endpoint. Places
    /// a failing endpoint on cooldown; never mixes fields from two
    /// endpoints' responses into one result.
    pub async fn call<T, F, Fut>(&self, mut op: F) -> Result<T, ChainError>
    where
        F: FnMut(&Endpoint) -> Fut,
        Fut: Future<Output = Result<T, ChainError>>,
    {
        if self.endpoints.is_empty() {
            return Err(ChainError::EndpointPoolExhausted { count: 0 });
        }

        let mut last_err = None;
        for _ in 0..self.endpoints.len() {
            let idx = self.cursor.load(Ordering::Relaxed) % self.endpoints.len();
            if self.is_on_cooldown(idx).await {
                self.advance(idx);
                continue;
            }
            let endpoint = &self.endpoints[idx];
            match op(endpoint).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    warn!(endpoint = %endpoint.url, error = %err, "endpoint failed, rotating");
                    self.put_on_cooldown(idx).await;
                    self.advance(idx);
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or(ChainError::EndpointPoolExhausted {
            count: self.endpoints.len(),
        }))
    }

    fn advance(&self, idx: usize) {
        let _ = self.cursor.compare_exchange(
            idx,
            (idx + 1) % self.endpoints.len(),
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }

    async fn is_on_cooldown(&self, idx: usize) -> bool {
        let cooldowns = self.cooldowns.lock().await;
        matches!(cooldowns[idx], Some(until) if Instant::now() < until)
    }

    async fn put_on_cooldown(&self, idx: usize) {
        let mut cooldowns = self.cooldowns.lock().await;
        cooldowns[idx] = Some(Instant::now() + self.cooldown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    fn endpoint(s: &str) -> Endpoint {
        Endpoint {
            url: Url::parse(s).unwrap(),
        }
    }

    #[tokio::test]
    async fn rotates_to_next_endpoint_after_a_transient_failure() {
        let pool = EndpointPool::new(
            vec![
                endpoint("http://a.example/"),
                endpoint("http://b.example/"),
            ],
            Duration::from_secs(300),
        );
        let calls: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
        let result = pool
            .call(|e| {
                let calls = calls.clone();
                let url = e.url.clone();
                async move {
                    calls.fetch_add(1, Ordering::Relaxed);
                    if url.host_str() == Some("a.example") {
                        Err(ChainError::Transient("nonce too low".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn exhausts_after_bounded_retries_equal_to_endpoint_count() {
        let pool = EndpointPool::new(vec![endpoint("http://a.example/")], Duration::from_secs(300));
        let result = pool
            .call(|_e| async {
                Err::<i32, _>(ChainError::Transport {
                    endpoint: "a".into(),
                    source: Box::new(std::io::Error::other("boom")),
                })
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried_across_endpoints() {
        let pool = EndpointPool::new(
            vec![endpoint("http://a.example/"), endpoint("http://b.example/")],
            Duration::from_secs(300),
        );
        let calls: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
        let result = pool
            .call(|_e| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Err::<i32, _>(ChainError::Permanent("InvalidSignatures".into()))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
