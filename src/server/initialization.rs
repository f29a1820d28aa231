// src/server/initialization.rs

//! Handles the complete server initialization process: backend construction
//! and schema setup, shared state assembly, and socket binding.

use super::context::ServerContext;
use crate::config::Config;
use crate::connection::HttpSessionFactory;
use crate::core::pool::ResourcePool;
use crate::core::state::ServerState;
use crate::core::store::{MemoryConn, PooledStore, VisitLedger, VisitStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let store = build_store(&config).await?;
    store
        .initialize()
        .await
        .context("Failed to initialize the backend store")?;
    info!(
        "Backend store initialized (pool capacity: {}).",
        config.pool.capacity
    );

    let state = Arc::new(ServerState::new(config.clone(), store));

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind listener on {}:{}", config.host, config.port))?;
    info!("tallyd listening on {}:{}", config.host, config.port);

    let session_factory = Arc::new(HttpSessionFactory::new(state.clone()));

    Ok(ServerContext {
        state,
        listener,
        session_factory,
        shutdown_tx,
    })
}

/// Builds the pooled visit store over the in-process ledger backend. All
/// pool handles are created here, eagerly; a failure leaves nothing running.
async fn build_store(config: &Config) -> Result<Arc<dyn VisitStore>> {
    let ledger = Arc::new(VisitLedger::new());
    let pool = ResourcePool::new(config.pool.capacity, |_| {
        let ledger = ledger.clone();
        async move { Ok(MemoryConn::connect(ledger)) }
    })
    .await
    .context("Failed to create the backend handle pool")?;

    Ok(Arc::new(PooledStore::new(pool, config.pool.acquire_timeout)))
}

fn log_startup_info(config: &Config) {
    info!("Starting tallyd {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: bind {}:{}, pool capacity {}, acquire timeout {:?}.",
        config.host, config.port, config.pool.capacity, config.pool.acquire_timeout
    );
}
