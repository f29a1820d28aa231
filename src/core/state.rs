// src/core/state.rs

//! Defines the shared server state and server-wide statistics.

use crate::config::Config;
use crate::core::store::VisitStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The per-process shared context handed to every connection task: the
/// resolved configuration, the backend service, and the statistics counters.
pub struct ServerState {
    /// The configuration resolved once at startup. There is no runtime
    /// mutation, so it is a plain field rather than a lock.
    pub config: Config,
    /// The backend service every session records against and reads from.
    pub store: Arc<dyn VisitStore>,
    pub stats: StatsState,
}

impl ServerState {
    /// Creates the shared state from the startup configuration and the
    /// constructed backend service.
    pub fn new(config: Config, store: Arc<dyn VisitStore>) -> Self {
        Self {
            config,
            store,
            stats: StatsState::new(),
        }
    }
}

/// Holds all state and logic related to server-wide statistics and monitoring.
#[derive(Debug)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The total number of responses fully written since startup.
    total_responses: AtomicU64,
    /// The number of connection tasks currently alive. Incremented at
    /// accept, decremented by the connection guard's `Drop`.
    active_sessions: AtomicU64,
}

impl Default for StatsState {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsState {
    /// Creates a new `StatsState` with initialized counters.
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            total_responses: AtomicU64::new(0),
            active_sessions: AtomicU64::new(0),
        }
    }

    /// Atomically increments the total number of connections received.
    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of connections received.
    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Atomically increments the total number of responses written.
    pub fn increment_total_responses(&self) {
        self.total_responses.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of responses written.
    pub fn get_total_responses(&self) -> u64 {
        self.total_responses.load(Ordering::Relaxed)
    }

    /// Atomically increments the active-session gauge.
    pub fn increment_active_sessions(&self) {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically decrements the active-session gauge.
    pub fn decrement_active_sessions(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    /// Gets the number of currently active sessions.
    pub fn get_active_sessions(&self) -> u64 {
        self.active_sessions.load(Ordering::Relaxed)
    }
}
