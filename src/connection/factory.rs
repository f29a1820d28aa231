// src/connection/factory.rs

//! The session seam: how the accept loop turns an accepted socket into a
//! running session. Tests substitute their own factory to observe or stub
//! session behavior.

use super::handler::ConnectionHandler;
use crate::core::TallyError;
use crate::core::state::ServerState;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;

/// One per-connection session, driven to completion by its own spawned task.
/// The task's future owns the session, which is what keeps it alive while
/// any read or write is outstanding.
#[async_trait]
pub trait Session: Send {
    /// Drives the session to its terminal state. Errors returned here are
    /// logged by the owning task and never reach the accept loop.
    async fn run(self: Box<Self>) -> Result<(), TallyError>;
}

/// Creates sessions for accepted connections.
pub trait SessionFactory: Send + Sync {
    fn create(
        &self,
        socket: TcpStream,
        addr: SocketAddr,
        session_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Box<dyn Session>;
}

/// The production factory: sessions that read one request head, perform one
/// backend operation, and answer with the visit count.
pub struct HttpSessionFactory {
    state: Arc<ServerState>,
}

impl HttpSessionFactory {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }
}

impl SessionFactory for HttpSessionFactory {
    fn create(
        &self,
        socket: TcpStream,
        addr: SocketAddr,
        session_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Box<dyn Session> {
        Box::new(ConnectionHandler::new(
            socket,
            addr,
            self.state.clone(),
            session_id,
            shutdown_rx,
        ))
    }
}
