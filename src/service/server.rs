//! # Server
//!
//! TCP accept loop for the keep service: bind, accept, spawn one
//! independent session task per connection, shut down gracefully on
//! signal. The listener is the boundary toward the transport; everything
//! protocol-shaped lives in [`session`](crate::service::session).

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{KeepConfig, LimitsConfig};
use crate::error::Result;
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::verifier::TrustCheck;
use crate::service::session;
use crate::utils::metrics::Metrics;

/// Shared, read-only state handed to every session task.
#[derive(Clone)]
pub struct ServerState {
    pub dispatcher: Arc<Dispatcher>,
    pub trust: Arc<dyn TrustCheck>,
    pub metrics: Arc<Metrics>,
    pub limits: LimitsConfig,
    pub max_connections: usize,
}

impl ServerState {
    pub fn new(
        config: &KeepConfig,
        dispatcher: Arc<Dispatcher>,
        trust: Arc<dyn TrustCheck>,
    ) -> Self {
        Self {
            dispatcher,
            trust,
            metrics: Arc::new(Metrics::new()),
            limits: config.limits.clone(),
            max_connections: config.server.max_connections,
        }
    }
}

/// Bind the configured address and serve until CTRL+C.
pub async fn run(
    config: &KeepConfig,
    dispatcher: Arc<Dispatcher>,
    trust: Arc<dyn TrustCheck>,
) -> Result<()> {
    // Internal shutdown channel, fed by the ctrl-c handler.
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received CTRL+C signal, shutting down");
            let _ = shutdown_tx.send(()).await;
        }
    });

    let listener = TcpListener::bind(&config.server.address).await?;
    info!(address = %config.server.address, "Listening");

    let state = ServerState::new(config, dispatcher, trust);
    serve_with_shutdown(listener, state, shutdown_rx, config.server.shutdown_timeout).await
}

/// Accept loop with an external shutdown channel. Taking the bound
/// listener (rather than an address) lets callers bind port 0 and learn
/// the real address first.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    state: ServerState,
    mut shutdown_rx: mpsc::Receiver<()>,
    shutdown_timeout: Duration,
) -> Result<()> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Shutting down server. Waiting for sessions to finish...");
                drain(&state.metrics, shutdown_timeout).await;
                state.metrics.log_summary();
                return Ok(());
            }

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, addr)) => {
                        let active = state.metrics.connections_active();
                        if active as usize >= state.max_connections {
                            // Connection-level backpressure: close without
                            // reading, same silence as any other drop.
                            warn!(peer = %addr, active, "connection limit reached, closing");
                            drop(stream);
                            continue;
                        }

                        let state = state.clone();
                        tokio::spawn(async move {
                            state.metrics.connection_established();
                            debug!(peer = %addr, "session started");
                            let outcome = session::run(
                                stream,
                                &state.limits,
                                &state.dispatcher,
                                state.trust.as_ref(),
                                &state.metrics,
                            )
                            .await;
                            debug!(peer = %addr, outcome = ?outcome, "session closed");
                            state.metrics.connection_closed();
                        });
                    }
                    Err(e) => {
                        // Accept failures are survivable; a bad connection
                        // never takes the server down.
                        error!(error = %e, "Error accepting connection");
                    }
                }
            }
        }
    }
}

/// Wait for in-flight sessions to close, up to `shutdown_timeout`.
async fn drain(metrics: &Metrics, shutdown_timeout: Duration) {
    let deadline = tokio::time::sleep(shutdown_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                warn!("Shutdown timeout reached, forcing exit");
                return;
            }
            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                let active = metrics.connections_active();
                if active == 0 {
                    info!("All sessions closed");
                    return;
                }
                debug!(active, "Waiting for sessions to close");
            }
        }
    }
}
