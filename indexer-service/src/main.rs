use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use indexer_service::api;
use indexer_service::cache::{spawn_refresh_loop, SnapshotCache};
use indexer_service::config::IndexerConfig;
use indexer_service::database::SnapshotStore;
use indexer_service::rpc::RpcClient;
use indexer_service::snapshot::SnapshotBuilder;
use indexer_service::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        "Starting program account indexer v{} (git {}, built {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("INDEXER_BUILD_GIT_HASH").unwrap_or("unknown"),
        option_env!("INDEXER_BUILD_TIME_UNIX").unwrap_or("unknown"),
    );

    let config = IndexerConfig::from_env().context("invalid configuration")?;
    info!(
        "RPC endpoint {}, project program {}",
        config.rpc_endpoint, config.programs.project.program_id
    );

    let rpc = RpcClient::new(config.rpc_endpoint.clone(), config.rpc_timeout)?;
    let builder = SnapshotBuilder::new(rpc, config.programs.clone(), config.policy);
    let mut cache = SnapshotCache::new(builder, config.freshness);

    if let Some(db_path) = &config.snapshot_db_path {
        match SnapshotStore::open(db_path, config.snapshot_ttl).await {
            Ok(store) => cache = cache.with_store(store),
            Err(e) => warn!("Snapshot store unavailable, continuing without it: {:#}", e),
        }
    }

    let cache = Arc::new(cache);
    if cache.restore().await {
        info!("Serving persisted snapshot until the first refresh completes");
    }
    let refresh_loop = spawn_refresh_loop(cache.clone(), config.refresh_interval);

    let state = AppState::new(cache).with_metrics_token(config.metrics_token.clone());
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    refresh_loop.abort();
    Ok(())
}
