// src/connection/session.rs

//! Defines the state associated with a single client session.

use std::net::SocketAddr;

/// The session's position in its lifecycle. A session only ever moves
/// forward through these phases; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Accumulating inbound bytes until the request terminator is seen.
    ReadingRequest,
    /// Performing the backend operation and writing the response.
    WritingResponse,
    /// The connection is finished; no further operations are scheduled.
    Closed,
}

/// Holds the state specific to a single client session.
#[derive(Debug)]
pub struct SessionState {
    /// The unique identifier for the session, assigned at accept.
    pub session_id: u64,
    /// The network address of the peer.
    pub addr: SocketAddr,
    /// Where the session currently is in its lifecycle.
    pub phase: SessionPhase,
}

impl SessionState {
    /// Creates a new `SessionState`, starting in the reading phase.
    pub fn new(session_id: u64, addr: SocketAddr) -> Self {
        Self {
            session_id,
            addr,
            phase: SessionPhase::ReadingRequest,
        }
    }

    /// Marks the session terminal. Closing an already closed session is a
    /// no-op, not an error.
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Closed
    }
}
