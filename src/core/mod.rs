// src/core/mod.rs

//! The central module containing the core logic and data structures of tallyd.

pub mod errors;
pub mod pool;
pub mod protocol;
pub mod state;
pub mod store;

pub use errors::TallyError;
pub use pool::{Lease, ResourcePool};
pub use protocol::{HttpCodec, RequestHead, Response, Status};
