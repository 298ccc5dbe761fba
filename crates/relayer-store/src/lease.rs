use std::time::{Duration, Instant};

use dashmap::DashMap;
use relayer_types::MessageId;

/// An in-memory soft lease a worker holds while processing a message (spec
/// §4.4 "`claim_for_processing`... sets an in-memory lease"). Leases are
/// not durable: a process crash drops them, and the janitor sweep reclaims
/// any message whose lease has expired without a status change.
#[derive(Debug, Clone, Copy)]
pub struct Lease {
    pub worker: u64,
    pub expires_at: Instant,
}

/// Process-local lease table, keyed by `message_id`. Concurrent access from
/// every worker task is expected, so it is backed by [`DashMap`].
pub struct LeaseTable {
    leases: DashMap<MessageId, Lease>,
    ttl: Duration,
}

impl LeaseTable {
    pub fn new(ttl: Duration) -> Self {
        LeaseTable {
            leases: DashMap::new(),
            ttl,
        }
    }

    /// Attempts to acquire the lease for `message_id`. Returns `true` if the
    /// caller now holds it — either it was free, or the previous holder's
    /// lease had expired.
    pub fn try_acquire(&self, message_id: MessageId, worker: u64) -> bool {
        let now = Instant::now();
        match self.leases.get(&message_id) {
            Some(existing) if existing.expires_at > now && existing.worker != worker => false,
            _ => {
                self.leases.insert(
                    message_id,
                    Lease {
                        worker,
                        expires_at: now + self.ttl,
                    },
                );
                true
            }
        }
    }

    pub fn release(&self, message_id: &MessageId) {
        self.leases.remove(message_id);
    }

    pub fn get(&self, message_id: &MessageId) -> Option<Lease> {
        let now = Instant::now();
        self.leases
            .get(message_id)
            .filter(|lease| lease.expires_at > now)
            .map(|lease| *lease)
    }

    /// Drops leases past their expiry, making those messages eligible for
    /// re-claim by another worker.
    pub fn sweep_expired(&self) {
        let now = Instant::now();
        self.leases.retain(|_, lease| lease.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid(n: u8) -> MessageId {
        MessageId([n; 32])
    }

    #[test]
    fn second_worker_cannot_acquire_a_live_lease() {
        let table = LeaseTable::new(Duration::from_secs(60));
        assert!(table.try_acquire(mid(1), 1));
        assert!(!table.try_acquire(mid(1), 2));
    }

    #[test]
    fn same_worker_can_reacquire_its_own_lease() {
        let table = LeaseTable::new(Duration::from_secs(60));
        assert!(table.try_acquire(mid(1), 1));
        assert!(table.try_acquire(mid(1), 1));
    }

    #[test]
    fn releasing_frees_the_lease_for_others() {
        let table = LeaseTable::new(Duration::from_secs(60));
        assert!(table.try_acquire(mid(1), 1));
        table.release(&mid(1));
        assert!(table.try_acquire(mid(1), 2));
    }
}
