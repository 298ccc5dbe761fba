//! Bridge relayer entrypoint: wires the Chain Client registry, Message
//! Store, Delivery Queue, Listener per chain, Batcher, validator cohort and
//! Relayer Worker Pool together, then serves the control-plane API surface
//! alongside them.
//!
//! `.env` loaded first, `Config::load` from a CLI/env-resolved path,
//! `tracing_subscriber` initialized before any component starts, an Axum
//! router served with graceful shutdown.

mod config;

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relayer_batcher::{BatcherManager, ConfiguredBatchEligibility};
use relayer_chain::ChainRegistry;
use relayer_listener::{Listener, ListenerConfig, PauseRegistry};
use relayer_queue::DeliveryQueue;
use relayer_signer::{Ed25519Signer, EcdsaSigner, KeyMaterial, LocalCohort, LocalKeystore, RemoteSigner, SignerKind, ValidatorCohort};
use relayer_store::{Janitor, Store};
use relayer_types::{ChainId, SignatureScheme};
use relayer_worker::{NeverBatch, PolicyLimits, RelayerConfig, RetryPolicy, WorkerPool};

use crate::config::{CliArgs, Config, ConfigError};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("chain registry construction failed: {0}")]
    Chain(#[from] relayer_chain::ChainError),
    #[error("failed to bind control API: {0}")]
    Bind(std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = CliArgs::parse();
    let config = Config::load(&cli.config)?;

    run(config).await.map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

async fn run(config: Config) -> Result<(), StartupError> {
    let db = connect_store(&config.database_url).await?;

    let store = Arc::new(Store::new(db.clone(), config.processing_timeout()));
    let queue = Arc::new(DeliveryQueue::new(db, config.processing_timeout()));
    let pause = PauseRegistry::new();

    let registry = Arc::new(ChainRegistry::from_configs(&config.chains)?);
    let cohort: Arc<dyn ValidatorCohort> = Arc::new(build_cohort(&config));

    let cancel = CancellationToken::new();

    let listener_handles = spawn_listeners(&config, registry.clone(), store.clone(), queue.clone(), pause.clone(), cancel.clone());

    let janitor = Janitor::new(store.clone(), config.processing_timeout() / 5, chrono::Duration::seconds(config.processing_timeout().as_secs() as i64));
    let janitor_cancel = cancel.clone();
    let janitor_handle = tokio::spawn(janitor.run(janitor_cancel));

    let worker_dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>> = Arc::new(
        config
            .relayer
            .dispatch_keys
            .iter()
            .map(|(chain, key)| (chain.clone(), key.0.0))
            .collect(),
    );
    let bridge_contracts: Arc<HashMap<ChainId, String>> = Arc::new(
        config
            .chains
            .iter()
            .map(|c| (c.id.clone(), c.bridge_contract.clone()))
            .collect(),
    );

    let (batcher_offer, batcher_manager) = if config.batching.enabled_pairs.is_empty() {
        (None, None)
    } else {
        let batcher_dispatch_keys: Arc<HashMap<ChainId, [u8; 32]>> = Arc::new(
            config
                .batching
                .dispatch_keys
                .iter()
                .map(|(chain, key)| (chain.clone(), key.0.0))
                .collect(),
        );
        let batcher_config = relayer_batcher::BatcherConfig {
            enabled_pairs: config.batching.enabled_pairs.iter().cloned().collect(),
            max_batch_size: config.batching.max_batch_size,
            max_wait: config.max_wait(),
            min_gas_saved: config.batching.min_gas_saved,
            gas_saved_per_message: config.batching.gas_saved_per_message,
            max_batchable_amount: config.batching.max_batchable_amount,
        };
        let manager = Arc::new(BatcherManager::new(
            batcher_config,
            registry.clone(),
            store.clone(),
            queue.clone(),
            config.relayer.consumer_group.clone(),
            cohort.clone(),
            batcher_dispatch_keys,
            config.validators.threshold,
        ));
        let offer: Arc<dyn relayer_worker::BatchOffer> = manager.clone();
        (Some(offer), Some(manager))
    };

    let batch_eligibility: Arc<dyn relayer_worker::BatchEligibility> = if config.batching.enabled_pairs.is_empty() {
        Arc::new(NeverBatch)
    } else {
        Arc::new(ConfiguredBatchEligibility::new(Arc::new(relayer_batcher::BatcherConfig {
            enabled_pairs: config.batching.enabled_pairs.iter().cloned().collect(),
            max_batch_size: config.batching.max_batch_size,
            max_wait: config.max_wait(),
            min_gas_saved: config.batching.min_gas_saved,
            gas_saved_per_message: config.batching.gas_saved_per_message,
            max_batchable_amount: config.batching.max_batchable_amount,
        })))
    };

    let relayer_config = RelayerConfig {
        worker_count: config.relayer.worker_count,
        consumer_group: config.relayer.consumer_group.clone(),
        processing_timeout: config.processing_timeout(),
        confirmation_timeout: config.confirmation_timeout(),
        signature_collection_timeout: config.signature_collection_timeout(),
        retry_policy: RetryPolicy::new(
            std::time::Duration::from_secs(config.relayer.retry_backoff_base_secs),
            config.relayer.retry_max_attempts,
        ),
        limits: PolicyLimits {
            max_transaction_amount: config.limits.max_transaction_amount,
            hourly_rate_per_sender: config.limits.hourly_rate_per_sender,
            daily_volume_per_sender: config.limits.daily_volume_per_sender,
        },
        signature_threshold: config.validators.threshold,
    };

    let pool = WorkerPool::spawn(
        registry.clone(),
        store.clone(),
        queue.clone(),
        cohort,
        worker_dispatch_keys,
        bridge_contracts,
        batcher_offer,
        batch_eligibility,
        relayer_config,
    );

    let api_state = relayer_api::ApiState::new(store.clone(), queue.clone(), pause.clone(), config.relayer.consumer_group.clone());
    let app = relayer_api::routes().with_state(api_state);
    let addr = std::net::SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(StartupError::Bind)?;
    info!(%addr, "control API listening");

    let serve_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {}
                _ = serve_cancel.cancelled() => {}
            }
        })
        .await
        .map_err(StartupError::Bind)?;

    cancel.cancel();
    for handle in listener_handles {
        let _ = handle.await;
    }
    let _ = janitor_handle.await;
    pool.shutdown().await;
    if let Some(manager) = batcher_manager {
        if let Ok(manager) = Arc::try_unwrap(manager) {
            manager.shutdown().await;
        }
    }

    Ok(())
}

async fn connect_store(database_url: &str) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let db = Database::connect(database_url).await?;
    // `relayer-store-migration`'s `[lib] name = "migration"` (sea-orm-cli's
    // scaffold convention), so the dependency is reached as `migration::`.
    migration::Migrator::up(&db, None).await?;
    relayer_queue::Migrator::up(&db, None).await?;
    let _ = db.ping().await;
    Ok(db)
}

/// Builds the single-process validator cohort: a
/// [`LocalCohort`] over every configured member, each either a
/// [`LocalKeystore`] holding live key material or a [`RemoteSigner`] stub
/// when the member names a federated signing endpoint.
fn build_cohort(config: &Config) -> LocalCohort {
    let members: Vec<Arc<dyn KeyMaterial>> = config
        .validators
        .members
        .iter()
        .map(|member| -> Arc<dyn KeyMaterial> {
            if member.endpoint.is_some() {
                let public_key_hex = member
                    .public_key
                    .as_ref()
                    .expect("remote validator member requires public_key")
                    .trim_start_matches("0x")
                    .to_string();
                let public_key = hex::decode(public_key_hex).expect("invalid validator public_key hex");
                return Arc::new(RemoteSigner::new(member.id.clone(), member.scheme, public_key));
            }
            let key_bytes = member
                .secret_key
                .as_ref()
                .expect("local validator member requires secret_key")
                .0
                .0;
            let signer = match member.scheme {
                SignatureScheme::EcdsaSecp256k1 => {
                    SignerKind::Ecdsa(EcdsaSigner::from_bytes(&key_bytes).expect("invalid validator secret key"))
                }
                SignatureScheme::Ed25519 => SignerKind::Ed25519(Ed25519Signer::from_bytes(&key_bytes)),
            };
            Arc::new(LocalKeystore::new(member.id.clone(), signer))
        })
        .collect();
    LocalCohort::new(members)
}

fn spawn_listeners(
    config: &Config,
    registry: Arc<ChainRegistry>,
    store: Arc<Store>,
    queue: Arc<DeliveryQueue>,
    pause: Arc<PauseRegistry>,
    cancel: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::with_capacity(config.chains.len());
    for chain in &config.chains {
        let listener_config = ListenerConfig {
            chain: chain.id.clone(),
            bridge_contract: chain.bridge_contract.clone(),
            batch_width: chain.batch_width,
            tick_interval: chain.poll_interval,
            configured_start: 0,
            consumer_group: config.relayer.consumer_group.clone(),
        };
        let registry = registry.clone();
        let store = store.clone();
        let queue = queue.clone();
        let pause = pause.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let listener = match Listener::new(registry, store, queue, pause, listener_config).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!(error = %e, "listener failed to initialize");
                    return;
                }
            };
            listener.run(cancel).await;
        }));
    }
    handles
}
