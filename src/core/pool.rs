// src/core/pool.rs

//! A fixed-capacity pool of pre-created backend handles with asynchronous,
//! FIFO-fair checkout.
//!
//! The pool is the single synchronization point shared by all sessions. Every
//! handle is created eagerly at construction and lives until the pool itself
//! is dropped; `acquire` hands out exclusive access to one handle at a time
//! through a [`Lease`] guard that returns the handle on drop, on every exit
//! path, from any thread.

use crate::core::TallyError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// A bounded pool of `capacity` handles of type `T`.
///
/// Waiters suspend on an async semaphore whose wait queue is FIFO, so no
/// caller can be starved while handles are repeatedly released and
/// re-acquired by others. The idle set itself is guarded by a mutex; the
/// semaphore's permit count is the checkout accounting.
pub struct ResourcePool<T> {
    /// Handles not currently checked out. Returned handles are pushed to the
    /// back, so the pool cycles through all handles over time.
    idle: Mutex<VecDeque<T>>,
    /// One permit per idle handle. Holding a permit entitles the holder to
    /// pop exactly one handle from `idle`.
    permits: Semaphore,
    capacity: usize,
}

impl<T: Send> ResourcePool<T> {
    /// Eagerly constructs `capacity` handles using `factory` (called with the
    /// handle index) and returns the filled pool.
    ///
    /// Fails fast: the first factory error is propagated and the handles
    /// constructed so far are dropped, leaving no partial pool running.
    pub async fn new<F, Fut>(capacity: usize, mut factory: F) -> Result<Self, TallyError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, TallyError>>,
    {
        let mut idle = VecDeque::with_capacity(capacity);
        for index in 0..capacity {
            idle.push_back(factory(index).await?);
        }

        Ok(Self {
            idle: Mutex::new(idle),
            permits: Semaphore::new(capacity),
            capacity,
        })
    }

    /// Checks one handle out of the pool, suspending the calling task until
    /// a handle is available. The handle is returned when the lease drops.
    pub async fn acquire(&self) -> Lease<'_, T> {
        let permit = self
            .permits
            .acquire()
            .await
            .expect("pool semaphore is never closed");

        let handle = self
            .idle
            .lock()
            .pop_front()
            .expect("a permit guarantees an idle handle");

        Lease {
            pool: self,
            permit,
            handle: Some(handle),
        }
    }

    /// Like [`acquire`](Self::acquire), but gives up after `wait` and returns
    /// [`TallyError::AcquireTimeout`] instead of suspending indefinitely.
    pub async fn acquire_timeout(&self, wait: Duration) -> Result<Lease<'_, T>, TallyError> {
        tokio::time::timeout(wait, self.acquire())
            .await
            .map_err(|_| TallyError::AcquireTimeout)
    }

    /// The fixed number of handles owned by this pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of handles currently available for checkout.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl<T> std::fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("capacity", &self.capacity)
            .field("available", &self.permits.available_permits())
            .finish()
    }
}

/// Exclusive ownership of one checked-out handle.
///
/// Not clonable; the handle is reachable only through this guard while the
/// lease is live. Dropping the lease (scope exit, error unwinding, task
/// abort) pushes the handle back into the idle set and then releases the
/// permit, waking exactly one waiter if any are queued.
#[derive(Debug)]
pub struct Lease<'a, T: Send> {
    pool: &'a ResourcePool<T>,
    /// Held for the lifetime of the lease; its release is what wakes the
    /// next waiter, and it must outlive the push-back of the handle.
    permit: SemaphorePermit<'a>,
    /// `None` only during drop.
    handle: Option<T>,
}

impl<T: Send> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref().expect("lease handle taken before drop")
    }
}

impl<T: Send> DerefMut for Lease<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.handle.as_mut().expect("lease handle taken before drop")
    }
}

impl<T: Send> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.idle.lock().push_back(handle);
        }
        // The permit is released by its own drop handler, which runs after
        // this body, so the woken waiter always finds the handle in place.
        _ = self.permit;
    }
}
