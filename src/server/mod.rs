// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

// Sub-modules are public so the integration harness can set up and drive a
// real server on an ephemeral port.
pub mod connection_loop;
pub mod context;
pub mod initialization;

pub use context::ServerContext;

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Initialize the backend store, shared state, and listener.
    let server_context = initialization::setup(config).await?;

    // 2. Start the main connection acceptance loop. This runs until shutdown.
    connection_loop::run(server_context).await
}
