//! Deployment configuration: a single immutable [`Config`] built at startup
//! from a JSON file plus environment overrides, with a `CliArgs`/`Config`/
//! `LiteralOrEnv<T>` shape.

use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Deserializer, Serialize};

use relayer_chain::ChainConfig;
use relayer_types::{ChainId, SignatureScheme, ValidatorId};

/// CLI arguments: only the path to the JSON config file, env-overridable
/// via a single `--config`/`CONFIG` knob.
#[derive(Parser, Debug)]
#[command(name = "bridge-relayer")]
#[command(about = "Cross-chain bridge relayer")]
pub struct CliArgs {
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    pub config: PathBuf,
}

/// A literal value or an `$ENV_VAR`/`${ENV_VAR}` reference resolved at
/// deserialization time, for the fields that carry secrets: RPC URLs with
/// embedded API keys, dispatch and validator key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(pub T);

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = if let Some(name) = parse_env_var_syntax(&s) {
            std::env::var(&name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "environment variable '{name}' not found (referenced as '{s}')"
                ))
            })?
        } else {
            s
        };
        value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("failed to parse value: {e}")))
    }
}

impl<T: Serialize> Serialize for LiteralOrEnv<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

fn parse_env_var_syntax(s: &str) -> Option<String> {
    if let Some(inner) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        Some(inner.to_string())
    } else if let Some(name) = s.strip_prefix('$') {
        if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            Some(name.to_string())
        } else {
            None
        }
    } else {
        None
    }
}

/// The `validators: {threshold, members[...]}` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorsConfig {
    pub threshold: usize,
    pub members: Vec<ValidatorMember>,
}

/// One cohort member. In a single-process deployment the
/// relayer holds every member's key material directly, so `secret_key`
/// carries the hex-encoded private key behind a `LiteralOrEnv` reference
/// rather than a bare config literal.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorMember {
    pub id: ValidatorId,
    pub scheme: SignatureScheme,
    /// Required unless `endpoint` is set: this process's copy of the
    /// member's private key, for the single-process cohort ("a local set").
    #[serde(default)]
    pub secret_key: Option<LiteralOrEnv<HexKey>>,
    /// Required when `endpoint` is set: the member's public key, hex
    /// encoded, used to construct the [`relayer_signer::RemoteSigner`]
    /// stub's `public_key`.
    #[serde(default)]
    pub public_key: Option<LiteralOrEnv<String>>,
    /// Remote signing endpoint for a federated member; when
    /// present, `secret_key` is ignored and a [`relayer_signer::RemoteSigner`]
    /// stub is wired in instead.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// A 32-byte key parsed from a hex string, used for both validator and
/// dispatch secrets.
#[derive(Debug, Clone, Copy)]
pub struct HexKey(pub [u8; 32]);

impl FromStr for HexKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| e.to_string())?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| "expected 32 bytes".to_string())?;
        Ok(HexKey(array))
    }
}

/// The `limits: {...}` section, fed directly into
/// [`relayer_worker::PolicyLimits`].
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "defaults::max_transaction_amount")]
    pub max_transaction_amount: u128,
    #[serde(default = "defaults::daily_volume_per_sender")]
    pub daily_volume_per_sender: u128,
    #[serde(default = "defaults::hourly_rate_per_sender")]
    pub hourly_rate_per_sender: u64,
}

/// The `batching: {...}` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchingConfig {
    #[serde(default)]
    pub enabled_pairs: Vec<(ChainId, ChainId)>,
    #[serde(default = "defaults::max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "defaults::max_wait_secs")]
    pub max_wait_secs: u64,
    #[serde(default = "defaults::min_gas_saved")]
    pub min_gas_saved: u128,
    #[serde(default = "defaults::gas_saved_per_message")]
    pub gas_saved_per_message: u128,
    #[serde(default = "defaults::max_batchable_amount")]
    pub max_batchable_amount: u128,
    /// Dispatch keys used for batch-unlock submissions, per destination
    /// chain; shares the format of `relayer.dispatch_keys` but kept
    /// separate since a pair may batch-settle on a dedicated key.
    #[serde(default)]
    pub dispatch_keys: HashMap<ChainId, LiteralOrEnv<HexKey>>,
}

/// The `relayer: {...}` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayerSection {
    #[serde(default = "defaults::worker_count")]
    pub worker_count: usize,
    #[serde(default = "defaults::consumer_group")]
    pub consumer_group: String,
    #[serde(default = "defaults::processing_timeout_secs")]
    pub processing_timeout_secs: u64,
    #[serde(default = "defaults::confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "defaults::signature_collection_timeout_secs")]
    pub signature_collection_timeout_secs: u64,
    #[serde(default = "defaults::retry_backoff_base_secs")]
    pub retry_backoff_base_secs: u64,
    #[serde(default = "defaults::retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Dispatch keys used for individual unlock submissions, per
    /// destination chain.
    pub dispatch_keys: HashMap<ChainId, LiteralOrEnv<HexKey>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::host")]
    pub host: IpAddr,
    #[serde(default = "defaults::port")]
    pub port: u16,
    /// Postgres connection string for the Message Store and Delivery
    /// Queue; `sqlite::memory:` is accepted for local/dev runs, matching
    /// `relayer-store-migration`'s dual `sqlx-postgres`/`sqlx-sqlite`
    /// feature set.
    pub database_url: LiteralOrEnv<String>,
    pub chains: Vec<ChainConfig>,
    pub validators: ValidatorsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub batching: BatchingConfig,
    pub relayer: RelayerSection,
}

impl Config {
    pub fn load(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(path.clone(), e.to_string()))?;
        let config: Config = serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.validators.threshold == 0 || self.validators.threshold > self.validators.members.len() {
            return Err(ConfigError::Invalid(format!(
                "validators.threshold ({}) must be in 1..=members.len() ({})",
                self.validators.threshold,
                self.validators.members.len()
            )));
        }
        if self.chains.is_empty() {
            return Err(ConfigError::Invalid("at least one chain must be configured".to_string()));
        }
        Ok(())
    }

    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.relayer.processing_timeout_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.relayer.confirmation_timeout_secs)
    }

    pub fn signature_collection_timeout(&self) -> Duration {
        Duration::from_secs(self.relayer.signature_collection_timeout_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.batching.max_wait_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0:?}: {1}")]
    Read(PathBuf, String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

mod defaults {
    use super::*;

    pub fn host() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
    }

    pub fn port() -> u16 {
        8085
    }

    pub fn max_transaction_amount() -> u128 {
        u128::MAX
    }

    pub fn daily_volume_per_sender() -> u128 {
        u128::MAX
    }

    pub fn hourly_rate_per_sender() -> u64 {
        u64::MAX
    }

    pub fn max_batch_size() -> usize {
        50
    }

    pub fn max_wait_secs() -> u64 {
        30
    }

    pub fn min_gas_saved() -> u128 {
        u128::MAX
    }

    pub fn gas_saved_per_message() -> u128 {
        21_000
    }

    pub fn max_batchable_amount() -> u128 {
        u128::MAX
    }

    pub fn worker_count() -> usize {
        10
    }

    pub fn consumer_group() -> String {
        "relayer".to_string()
    }

    pub fn processing_timeout_secs() -> u64 {
        5 * 60
    }

    pub fn confirmation_timeout_secs() -> u64 {
        10 * 60
    }

    pub fn signature_collection_timeout_secs() -> u64 {
        3 * 60
    }

    pub fn retry_backoff_base_secs() -> u64 {
        2
    }

    pub fn retry_max_attempts() -> u32 {
        5
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_transaction_amount: defaults::max_transaction_amount(),
            daily_volume_per_sender: defaults::daily_volume_per_sender(),
            hourly_rate_per_sender: defaults::hourly_rate_per_sender(),
        }
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        BatchingConfig {
            enabled_pairs: Vec::new(),
            max_batch_size: defaults::max_batch_size(),
            max_wait_secs: defaults::max_wait_secs(),
            min_gas_saved: defaults::min_gas_saved(),
            gas_saved_per_message: defaults::gas_saved_per_message(),
            max_batchable_amount: defaults::max_batchable_amount(),
            dispatch_keys: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_or_env_resolves_braced_reference() {
        std::env::set_var("RELAYER_TEST_VALUE", "42");
        #[derive(Deserialize)]
        struct Wrapper {
            value: LiteralOrEnv<u32>,
        }
        let wrapper: Wrapper = serde_json::from_str(r#"{"value": "${RELAYER_TEST_VALUE}"}"#).unwrap();
        assert_eq!(*wrapper.value, 42);
    }

    #[test]
    fn literal_or_env_passes_through_literals() {
        #[derive(Deserialize)]
        struct Wrapper {
            value: LiteralOrEnv<u32>,
        }
        let wrapper: Wrapper = serde_json::from_str(r#"{"value": "7"}"#).unwrap();
        assert_eq!(*wrapper.value, 7);
    }

    #[test]
    fn hex_key_rejects_wrong_length() {
        assert!("deadbeef".parse::<HexKey>().is_err());
    }

    #[test]
    fn hex_key_accepts_0x_prefixed_32_bytes() {
        let hex_str = format!("0x{}", "ab".repeat(32));
        let key: HexKey = hex_str.parse().unwrap();
        assert_eq!(key.0.len(), 32);
    }
}
