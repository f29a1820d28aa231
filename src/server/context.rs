// src/server/context.rs

use crate::connection::SessionFactory;
use crate::core::state::ServerState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Holds all the initialized state required to run the server's main loop.
pub struct ServerContext {
    pub state: Arc<ServerState>,
    pub listener: TcpListener,
    pub session_factory: Arc<dyn SessionFactory>,
    pub shutdown_tx: broadcast::Sender<()>,
}
