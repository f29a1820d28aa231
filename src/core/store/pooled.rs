// src/core/store/pooled.rs

//! The production [`VisitStore`]: every operation checks one handle out of
//! the pool, uses it, and returns it.

use super::{BackendConn, VisitStore};
use crate::core::TallyError;
use crate::core::pool::{Lease, ResourcePool};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// A visit store backed by a bounded pool of [`BackendConn`] handles.
///
/// Leases never outlive the single operation they serve: each method
/// acquires, performs exactly one backend call, and releases on every path
/// out, including the error path. A lease is therefore never held across
/// client socket I/O.
#[derive(Debug)]
pub struct PooledStore<C: BackendConn> {
    pool: ResourcePool<C>,
    /// Upper bound on how long one operation may wait for a free handle
    /// before it fails with `AcquireTimeout`.
    acquire_timeout: Duration,
}

impl<C: BackendConn> PooledStore<C> {
    pub fn new(pool: ResourcePool<C>, acquire_timeout: Duration) -> Self {
        Self {
            pool,
            acquire_timeout,
        }
    }

    /// The fixed number of handles behind this store.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    async fn checkout(&self) -> Result<Lease<'_, C>, TallyError> {
        self.pool.acquire_timeout(self.acquire_timeout).await
    }
}

#[async_trait]
impl<C: BackendConn + 'static> VisitStore for PooledStore<C> {
    async fn initialize(&self) -> Result<(), TallyError> {
        let mut conn = self.checkout().await?;
        conn.apply_schema().await
    }

    async fn record_visit(&self) -> Result<(), TallyError> {
        let mut conn = self.checkout().await?;
        conn.insert_visit(Utc::now()).await
    }

    async fn visit_count(&self) -> Result<u64, TallyError> {
        let mut conn = self.checkout().await?;
        conn.count_visits().await
    }
}
