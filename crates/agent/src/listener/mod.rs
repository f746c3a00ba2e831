// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling endpoint I/O.
//!
//! The accept loop hands every connection to its own task in a `JoinSet`
//! and goes straight back to accepting, so a slow `runCommand` never holds
//! up other clients.

pub mod access;
#[cfg(windows)]
pub mod pipe_security;
mod transport;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use courier_adapters::SystemAdapter;
use courier_wire::{
    read_request, write_response, CommandRequest, CommandResponse, Endpoint, ProtocolError,
};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use access::AccessPolicy;
pub use transport::Transport;

/// How long cancelled handlers get to kill their process trees before
/// being aborted.
const KILL_GRACE: Duration = Duration::from_secs(1);

/// Errors binding the endpoint.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("failed to prepare {}: {}", .0.display(), .1)]
    Prepare(PathBuf, #[source] std::io::Error),

    #[error("{} is not private to this user; remove it and retry", .0.display())]
    Insecure(PathBuf),

    #[error("failed to bind {0}: {1}")]
    BindFailed(String, #[source] std::io::Error),

    #[error("cannot determine the session user: {0}")]
    SessionUser(#[source] std::io::Error),
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Timeouts applied by the listener.
#[derive(Debug, Clone, Copy)]
pub struct ListenerConfig {
    /// Bound on reading a request and on writing its response
    pub ipc_timeout: Duration,
    /// Grace period for in-flight handlers at shutdown
    pub drain_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { ipc_timeout: crate::env::ipc_timeout(), drain_timeout: crate::env::drain_timeout() }
    }
}

/// Shared context for every connection handler.
struct ListenCtx<S: SystemAdapter> {
    dispatcher: Dispatcher<S>,
    ipc_timeout: Duration,
}

/// Listener task for accepting endpoint connections.
pub struct Listener<S: SystemAdapter> {
    transport: Transport,
    ctx: Arc<ListenCtx<S>>,
    drain_timeout: Duration,
}

impl<S: SystemAdapter> Listener<S> {
    /// Bind `endpoint` under `policy`. Access control is in place before
    /// this returns.
    pub fn bind(
        endpoint: &Endpoint,
        policy: &dyn AccessPolicy,
        dispatcher: Dispatcher<S>,
        config: ListenerConfig,
    ) -> Result<Self, ListenError> {
        let transport = Transport::bind(endpoint, policy)?;
        Ok(Self {
            transport,
            ctx: Arc::new(ListenCtx { dispatcher, ipc_timeout: config.ipc_timeout }),
            drain_timeout: config.drain_timeout,
        })
    }

    /// Accept connections until `shutdown` fires, then drain in-flight
    /// handlers.
    pub async fn run(self, shutdown: CancellationToken) {
        let Self { mut transport, ctx, drain_timeout } = self;
        // Separate from `shutdown` so in-flight requests survive into the drain.
        let requests = CancellationToken::new();
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => reap(joined),
                accepted = transport.accept() => match accepted {
                    Ok(stream) => {
                        let ctx = Arc::clone(&ctx);
                        let cancel = requests.child_token();
                        tasks.spawn(async move {
                            if let Err(e) = handle_connection(stream, &ctx, cancel).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("accept error: {}", e);
                        // Avoid spinning when the error persists (e.g. EMFILE).
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                },
            }
        }

        transport.close();
        drain(tasks, &requests, drain_timeout).await;
        info!("listener stopped");
    }
}

/// Wait up to `timeout` for handlers, then cancel and abort the rest.
async fn drain(mut tasks: JoinSet<()>, requests: &CancellationToken, timeout: Duration) {
    if tasks.is_empty() {
        return;
    }
    info!(in_flight = tasks.len(), "draining connections");
    let finished = tokio::time::timeout(timeout, async {
        while let Some(joined) = tasks.join_next().await {
            reap(joined);
        }
    })
    .await;
    if finished.is_ok() {
        return;
    }

    warn!(remaining = tasks.len(), "drain timeout, cancelling in-flight requests");
    requests.cancel();
    let _ = tokio::time::timeout(KILL_GRACE, async {
        while let Some(joined) = tasks.join_next().await {
            reap(joined);
        }
    })
    .await;
    tasks.shutdown().await;
}

fn reap(joined: Result<(), JoinError>) {
    match joined {
        Ok(()) => {}
        Err(e) if e.is_panic() => error!("connection handler panicked: {}", e),
        Err(e) => debug!("connection handler aborted: {}", e),
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("connection timeout"),
        ConnectionError::Protocol(ref p) if p.is_violation() => {
            error!("protocol violation: {}", e)
        }
        _ => error!("connection error: {}", e),
    }
}

/// Handle a single client connection: one request, one response.
///
/// Dispatch runs in its own task so a panicking handler still produces a
/// failure response. While it runs the connection is watched; if the client
/// goes away first, `cancel` fires and the dispatcher kills any process tree
/// it started.
async fn handle_connection<T, S>(
    stream: T,
    ctx: &ListenCtx<S>,
    cancel: CancellationToken,
) -> Result<(), ConnectionError>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    S: SystemAdapter,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let Some(request) = read_request(&mut reader, ctx.ipc_timeout).await? else {
        debug!("client closed before sending a request");
        return Ok(());
    };

    // Pings are liveness polls; keep them out of the info log.
    if matches!(request, CommandRequest::Ping) {
        debug!(request = %request, "received request");
    } else {
        info!(request = %request, "received request");
    }

    let kind = request.kind().to_string();
    let dispatcher = ctx.dispatcher.clone();
    let token = cancel.clone();
    let mut work = tokio::spawn(async move { dispatcher.dispatch(request, &token).await });

    let joined = tokio::select! {
        joined = &mut work => Some(joined),
        _ = detect_client_disconnect(&mut reader) => None,
    };

    let response = match joined {
        Some(Ok(response)) => response,
        Some(Err(e)) => {
            error!(kind = %kind, "dispatcher failed: {}", e);
            CommandResponse::failure(format!("internal error while handling {}", kind))
        }
        None => {
            cancel.cancel();
            debug!(kind = %kind, "client disconnected, cancelling request");
            // Stay in the JoinSet until the process tree is gone.
            let _ = work.await;
            return Ok(());
        }
    };

    debug!(kind = %kind, success = response.success, "sending response");
    write_response(&mut writer, &response, ctx.ipc_timeout).await?;
    Ok(())
}

/// Resolve once the client hangs up.
///
/// The client sends one request and then only reads, so EOF (or an error)
/// on the read side means it has gone. Stray bytes are discarded.
async fn detect_client_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 64];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => continue,
        }
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
