use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use relayer_types::ChainId;

/// The `chains[]` entries from §6's configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub id: ChainId,
    pub kind: ChainKind,
    pub rpc_endpoints: Vec<Url>,
    pub confirmation_depth: u64,
    pub bridge_contract: String,
    #[serde(with = "humantime_serde_secs")]
    pub poll_interval: Duration,
    #[serde(default = "default_cooldown")]
    #[serde(with = "humantime_serde_secs")]
    pub endpoint_cooldown: Duration,
    #[serde(default = "default_batch_width")]
    pub batch_width: u64,
}

fn default_cooldown() -> Duration {
    Duration::from_secs(300)
}

fn default_batch_width() -> u64 {
    100
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainKind {
    Evm,
    Account,
}

/// Minimal `"123s"`/`"5m"`-free serde shim: configs carry plain integer
/// seconds as primitive fields rather than pulling in a duration-parsing
/// crate for it.
mod humantime_serde_secs {
    use super::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
