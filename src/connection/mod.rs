// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection: request framing,
//! the one backend operation per session, response writing, and session
//! state management.

// Declare the private sub-modules of the `connection` module.
mod factory;
mod guard;
mod handler;
mod session;

// Publicly re-export the primary types from the sub-modules.
// This creates a clean public API for the `connection` module, hiding the
// internal file structure from the rest of the crate.
pub use factory::{HttpSessionFactory, Session, SessionFactory};
pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
pub use session::{SessionPhase, SessionState};
