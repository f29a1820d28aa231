// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all runtime failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Request header block too large ({0} bytes buffered without a terminator)")]
    RequestTooLarge(usize),

    #[error("Timed out waiting for a pooled backend handle")]
    AcquireTimeout,

    #[error("Backend error: {0}")]
    Backend(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for TallyError {
    fn clone(&self) -> Self {
        match self {
            TallyError::Io(e) => TallyError::Io(Arc::clone(e)),
            TallyError::RequestTooLarge(n) => TallyError::RequestTooLarge(*n),
            TallyError::AcquireTimeout => TallyError::AcquireTimeout,
            TallyError::Backend(s) => TallyError::Backend(s.clone()),
        }
    }
}

impl PartialEq for TallyError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TallyError::Io(e1), TallyError::Io(e2)) => e1.to_string() == e2.to_string(),
            (TallyError::RequestTooLarge(n1), TallyError::RequestTooLarge(n2)) => n1 == n2,
            (TallyError::Backend(s1), TallyError::Backend(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for TallyError {
    fn from(e: std::io::Error) -> Self {
        TallyError::Io(Arc::new(e))
    }
}
