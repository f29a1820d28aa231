// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// An RAII guard to ensure connection accounting is always cleaned up when a
/// connection task's scope is exited, including on task abort.
pub struct ConnectionGuard {
    /// A shared reference to the server state.
    pub(crate) state: Arc<ServerState>,
    /// The unique identifier for the client session.
    pub(crate) session_id: u64,
    /// The network address of the client.
    pub(crate) addr: SocketAddr,
}

impl ConnectionGuard {
    /// Creates a new `ConnectionGuard`.
    pub fn new(state: Arc<ServerState>, session_id: u64, addr: SocketAddr) -> Self {
        Self {
            state,
            session_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    /// Performs resource cleanup when the guard goes out of scope.
    fn drop(&mut self) {
        self.state.stats.decrement_active_sessions();
        debug!(
            "ConnectionGuard dropping, cleaning up session {} for connection {}",
            self.session_id, self.addr
        );
    }
}
