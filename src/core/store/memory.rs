// src/core/store/memory.rs

//! An in-process backend: an append-only ledger of timestamped visit events
//! shared by every handle connected to it.

use super::BackendConn;
use crate::core::TallyError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The storage shared by all [`MemoryConn`] handles: one append-only table
/// of visit timestamps plus the applied-schema flag gating access to it.
#[derive(Debug, Default)]
pub struct VisitLedger {
    visits: Mutex<Vec<DateTime<Utc>>>,
    initialized: AtomicBool,
}

impl VisitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_initialized(&self) -> Result<(), TallyError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(TallyError::Backend(
                "visit ledger schema has not been applied".to_string(),
            ));
        }
        Ok(())
    }
}

/// One pooled handle onto a shared [`VisitLedger`].
#[derive(Debug, Clone)]
pub struct MemoryConn {
    ledger: Arc<VisitLedger>,
}

impl MemoryConn {
    /// Opens a handle onto `ledger`.
    pub fn connect(ledger: Arc<VisitLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl BackendConn for MemoryConn {
    async fn apply_schema(&mut self) -> Result<(), TallyError> {
        // Applying twice is a no-op; readers gate on the Acquire load.
        self.ledger.initialized.store(true, Ordering::Release);
        Ok(())
    }

    async fn insert_visit(&mut self, recorded_at: DateTime<Utc>) -> Result<(), TallyError> {
        self.ledger.ensure_initialized()?;
        self.ledger.visits.lock().push(recorded_at);
        Ok(())
    }

    async fn count_visits(&mut self) -> Result<u64, TallyError> {
        self.ledger.ensure_initialized()?;
        Ok(self.ledger.visits.lock().len() as u64)
    }
}
