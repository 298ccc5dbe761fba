//! Per-dispatch-key nonce management ("Shared-resource policy"):
//! a single serialized issuer per dispatch key assigns nonces in order;
//! a detected gap triggers a replacement-transaction flow (same nonce,
//! higher fee) rather than abandonment.
//!
//! A pending-nonce tracker paired with a gap-fill retry, narrowed to the
//! single serialized counter this relayer needs (no fee-market bidding
//! beyond "retry higher").

use std::collections::HashMap;

use tokio::sync::Mutex;

/// Tracks the next nonce to issue and the highest nonce a submission
/// actually confirmed, per dispatch key (keyed by its public identifier —
/// typically the dispatch address/account string).
#[derive(Default)]
struct DispatchKeyState {
    next: u64,
    highest_confirmed: Option<u64>,
}

pub struct NonceIssuer {
    state: Mutex<HashMap<String, DispatchKeyState>>,
}

impl NonceIssuer {
    pub fn new() -> Self {
        NonceIssuer {
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Assigns the next nonce for `dispatch_key_id`, serialized across
    /// callers so two in-flight submissions never race for the same value.
    pub async fn issue_next(&self, dispatch_key_id: &str) -> u64 {
        let mut state = self.state.lock().await;
        let entry = state.entry(dispatch_key_id.to_string()).or_default();
        let nonce = entry.next;
        entry.next += 1;
        nonce
    }

    /// Records that `nonce` confirmed on-chain for `dispatch_key_id`.
    pub async fn record_confirmed(&self, dispatch_key_id: &str, nonce: u64) {
        let mut state = self.state.lock().await;
        let entry = state.entry(dispatch_key_id.to_string()).or_default();
        entry.highest_confirmed = Some(entry.highest_confirmed.map_or(nonce, |h| h.max(nonce)));
    }

    /// Whether `nonce` has fallen behind a later nonce that already
    /// confirmed — the gap, calling for a replacement
    /// transaction (same nonce, higher fee) rather than abandoning it.
    pub async fn has_gap(&self, dispatch_key_id: &str, nonce: u64) -> bool {
        let state = self.state.lock().await;
        state
            .get(dispatch_key_id)
            .and_then(|entry| entry.highest_confirmed)
            .is_some_and(|highest| highest > nonce)
    }
}

impl Default for NonceIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issues_strictly_increasing_nonces_per_key() {
        let issuer = NonceIssuer::new();
        assert_eq!(issuer.issue_next("key-a").await, 0);
        assert_eq!(issuer.issue_next("key-a").await, 1);
        assert_eq!(issuer.issue_next("key-b").await, 0);
    }

    #[tokio::test]
    async fn detects_a_gap_once_a_later_nonce_confirms() {
        let issuer = NonceIssuer::new();
        let n0 = issuer.issue_next("key-a").await;
        let n1 = issuer.issue_next("key-a").await;
        issuer.record_confirmed("key-a", n1).await;
        assert!(issuer.has_gap("key-a", n0).await);
        assert!(!issuer.has_gap("key-a", n1).await);
    }
}
