//! Per-chain pause flag ("Resource exhaustion... pause Listener"). Shared
//! between every [`crate::listener::Listener`] and the control-plane API
//! surface that mutates it; checked at the top of each tick rather than
//! held across the whole loop, so a pause takes effect on the next tick
//! without tearing the actor down.

use std::sync::Arc;

use dashmap::DashMap;

use relayer_types::ChainId;

#[derive(Debug, Default)]
pub struct PauseRegistry {
    paused: DashMap<ChainId, ()>,
}

impl PauseRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(PauseRegistry::default())
    }

    pub fn pause(&self, chain: ChainId) {
        self.paused.insert(chain, ());
    }

    pub fn resume(&self, chain: &ChainId) {
        self.paused.remove(chain);
    }

    pub fn is_paused(&self, chain: &ChainId) -> bool {
        self.paused.contains_key(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_then_resume_round_trips() {
        let registry = PauseRegistry::new();
        let chain = ChainId::from("eip155:1");
        assert!(!registry.is_paused(&chain));
        registry.pause(chain.clone());
        assert!(registry.is_paused(&chain));
        registry.resume(&chain);
        assert!(!registry.is_paused(&chain));
    }
}
