// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use crate::connection::ConnectionGuard;
use anyhow::{Result, anyhow};
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How long in-flight sessions get to finish after a shutdown signal before
/// the remainder are aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The main server loop that accepts connections and handles graceful shutdown.
///
/// The loop never waits on a session: each accepted connection runs on its
/// own spawned task, and the loop immediately returns to accepting. Only a
/// failure of the listener socket itself ends the loop with an error.
pub async fn run(mut ctx: ServerContext) -> Result<()> {
    let mut session_id_counter: u64 = 0;
    let mut client_tasks = JoinSet::new();

    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    let result = loop {
        tokio::select! {
            // Prioritize shutdown signals over other events.
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break Ok(());
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break Ok(());
            }

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        info!("Accepted new connection from: {}", addr);
                        ctx.state.stats.increment_total_connections();
                        ctx.state.stats.increment_active_sessions();

                        session_id_counter = session_id_counter.wrapping_add(1);
                        let session_id = session_id_counter;
                        let state = ctx.state.clone();
                        let factory = ctx.session_factory.clone();
                        let shutdown_rx = ctx.shutdown_tx.subscribe();

                        client_tasks.spawn(async move {
                            let _guard = ConnectionGuard::new(state.clone(), session_id, addr);

                            // The visit is recorded before the session exists, so
                            // every accepted connection is counted exactly once
                            // even if the session subsequently fails.
                            if let Err(e) = state.store.record_visit().await {
                                warn!("Failed to record visit for {}: {}", addr, e);
                            }

                            let session = factory.create(socket, addr, session_id, shutdown_rx);
                            if let Err(e) = session.run().await {
                                warn!("Session for {} terminated unexpectedly: {}", addr, e);
                            }
                        });
                    }
                    Err(e) if is_transient_accept_error(&e) => {
                        warn!("Failed to accept connection: {}", e);
                    }
                    Err(e) => {
                        error!("Listener socket failed: {}. Shutting down.", e);
                        break Err(e.into());
                    }
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A session task panicked: {e:?}");
                }
            },
        }
    };

    info!("Shutting down. Sending signal to all sessions.");
    if ctx.shutdown_tx.send(()).is_err() {
        debug!("No active sessions to notify of shutdown.");
    }

    if tokio::time::timeout(SHUTDOWN_GRACE, async {
        while client_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for sessions to finish cleanly; aborting the remainder.");
        client_tasks.shutdown().await;
    }
    info!("All client connections closed.");
    info!("Server shutdown complete.");

    result
}

/// Accept errors that affect only the one incoming connection. The listener
/// itself is still healthy, so the loop keeps accepting.
fn is_transient_accept_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
    )
}
