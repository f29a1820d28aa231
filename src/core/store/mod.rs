// src/core/store/mod.rs

//! The backend service: the capability traits consumed by the listener and
//! sessions, the pooled production implementation, and the in-process
//! memory backend it ships with.

// Declare the private sub-modules of the `store` module.
mod memory;
mod pooled;

// Publicly re-export the primary types from the sub-modules.
pub use memory::{MemoryConn, VisitLedger};
pub use pooled::PooledStore;

use crate::core::TallyError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The backend service as sessions and the listener see it. Every method is
/// safe to call concurrently from multiple sessions.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Idempotent schema setup, called once at startup before the listener
    /// starts accepting.
    async fn initialize(&self) -> Result<(), TallyError>;

    /// Records one visit.
    async fn record_visit(&self) -> Result<(), TallyError>;

    /// Returns the total number of visits recorded so far.
    async fn visit_count(&self) -> Result<u64, TallyError>;
}

/// One pooled backend handle. This is the seam where a SQL-backed handle
/// would sit; the shipped implementation is [`MemoryConn`].
#[async_trait]
pub trait BackendConn: Send {
    /// Applies the visit table schema. Applying it twice is a no-op.
    async fn apply_schema(&mut self) -> Result<(), TallyError>;

    /// Appends one visit event with its timestamp.
    async fn insert_visit(&mut self, recorded_at: DateTime<Utc>) -> Result<(), TallyError>;

    /// Counts all recorded visit events.
    async fn count_visits(&mut self) -> Result<u64, TallyError>;
}
