// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::factory::Session;
use super::session::{SessionPhase, SessionState};
use crate::core::TallyError;
use crate::core::protocol::{HttpCodec, RequestHead, Response, Status};
use crate::core::state::ServerState;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// Manages the full lifecycle of a client connection: accumulate one request
/// head, perform exactly one backend operation, write one response, close.
///
/// The handler moves its session forward through the phases in
/// [`SessionPhase`] and never schedules another operation once the session
/// is closed.
pub struct ConnectionHandler {
    framed: Framed<TcpStream, HttpCodec>,
    state: Arc<ServerState>,
    session: SessionState,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler` around an accepted socket.
    pub fn new(
        socket: TcpStream,
        addr: SocketAddr,
        state: Arc<ServerState>,
        session_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            framed: Framed::new(socket, HttpCodec),
            state,
            session: SessionState::new(session_id, addr),
            shutdown_rx,
        }
    }

    /// The session's current phase, exposed for inspection.
    pub fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    /// Runs the session to its terminal state. The session is closed on
    /// every path out, including error paths.
    pub async fn serve(&mut self) -> Result<(), TallyError> {
        let result = self.exchange().await;
        self.session.close();
        result
    }

    /// One request/response exchange. Every contained outcome (disconnects,
    /// deadlines, backend failures) is logged here and returns `Ok`; only
    /// unexpected I/O errors propagate to the owning task.
    async fn exchange(&mut self) -> Result<(), TallyError> {
        let addr = self.session.addr;
        let read_timeout = self.state.config.read_timeout;

        let head = tokio::select! {
            // Prioritize the shutdown signal over client input.
            biased;
            _ = self.shutdown_rx.recv() => {
                debug!(
                    "Session {} for {} received shutdown signal, closing.",
                    self.session.session_id, addr
                );
                return Ok(());
            }
            result = tokio::time::timeout(read_timeout, self.framed.next()) => {
                match result {
                    Err(_) => {
                        debug!(
                            "Session {} for {} sent no complete request within {:?}, closing.",
                            self.session.session_id, addr, read_timeout
                        );
                        return Ok(());
                    }
                    Ok(None) => {
                        debug!("Connection from {} closed by peer.", addr);
                        return Ok(());
                    }
                    Ok(Some(Err(TallyError::RequestTooLarge(bytes)))) => {
                        warn!("Oversized request head from {} ({bytes} bytes), rejecting.", addr);
                        self.session.phase = SessionPhase::WritingResponse;
                        return self.write_response(Response::empty(Status::BadRequest)).await;
                    }
                    Ok(Some(Err(e))) => {
                        if is_normal_disconnect(&e) {
                            debug!("Connection from {} closed by peer: {}", addr, e);
                            return Ok(());
                        }
                        return Err(e);
                    }
                    Ok(Some(Ok(head))) => head,
                }
            }
        };

        self.log_request(&head);

        // Exactly one backend operation per session; the pooled handle is
        // acquired and released entirely inside this call.
        self.session.phase = SessionPhase::WritingResponse;
        let response = match self.state.store.visit_count().await {
            Ok(count) => Response::visits(count),
            Err(TallyError::AcquireTimeout) => {
                warn!(
                    "Session {} for {}: no backend handle within the acquire deadline.",
                    self.session.session_id, addr
                );
                Response::empty(Status::ServiceUnavailable)
            }
            Err(e) => {
                warn!(
                    "Session {} for {}: backend operation failed: {}",
                    self.session.session_id, addr, e
                );
                Response::empty(Status::InternalServerError)
            }
        };

        self.write_response(response).await
    }

    /// Writes the full response, bounded by the write deadline. A peer that
    /// vanished mid-write is routine; there is no retry either way.
    async fn write_response(&mut self, response: Response) -> Result<(), TallyError> {
        let write_timeout = self.state.config.write_timeout;
        match tokio::time::timeout(write_timeout, self.framed.send(response)).await {
            Ok(Ok(())) => {
                self.state.stats.increment_total_responses();
                Ok(())
            }
            Ok(Err(e)) if is_normal_disconnect(&e) => {
                debug!(
                    "Connection from {} closed by peer mid-response: {}",
                    self.session.addr, e
                );
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(
                    "Timed out writing response to {} after {:?}.",
                    self.session.addr, write_timeout
                );
                Ok(())
            }
        }
    }

    /// Header lines are logged and then discarded; nothing in them affects
    /// the response.
    fn log_request(&self, head: &RequestHead) {
        let text = head.to_text();
        for line in text.lines() {
            debug!("Session {} <- {}", self.session.session_id, line);
        }
    }
}

#[async_trait]
impl Session for ConnectionHandler {
    async fn run(mut self: Box<Self>) -> Result<(), TallyError> {
        self.serve().await
    }
}

/// Checks if an error corresponds to a client disconnecting, which is
/// routine and logged at debug level rather than as a failure.
fn is_normal_disconnect(e: &TallyError) -> bool {
    matches!(e, TallyError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
