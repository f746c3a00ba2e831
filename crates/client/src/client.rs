// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One connection per request. An absent agent is `Ok(None)`, not an error.

use std::time::Duration;

use courier_wire::{read_response, write_request, CommandRequest, CommandResponse, Endpoint, ProtocolError};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Added to a `runCommand` timeout so the agent can report the timeout
/// itself before the client gives up.
const RUN_COMMAND_SLACK: Duration = Duration::from_secs(5);

const MIN_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(200);

/// Errors that are not "the agent is absent".
#[derive(Debug, Error)]
pub enum ClientError {
    /// The agent answered with a malformed or oversized frame.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Client for the user-session agent.
///
/// Stateless: every call opens its own connection, so one client may be
/// shared by any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct AgentClient {
    endpoint: Endpoint,
    connect_timeout: Duration,
    exchange_timeout: Duration,
}

impl AgentClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            connect_timeout: crate::env::connect_timeout(),
            exchange_timeout: crate::env::exchange_timeout(),
        }
    }

    /// Client for the endpoint named by the environment.
    pub fn from_env() -> Self {
        Self::new(crate::env::endpoint())
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send one request and wait for its response.
    ///
    /// `Ok(None)` means the agent is not running, closed the connection
    /// without answering, or did not answer in time.
    pub async fn send(&self, request: &CommandRequest) -> Result<Option<CommandResponse>, ClientError> {
        self.send_cancellable(request, &CancellationToken::new()).await
    }

    /// Like [`send`](Self::send), but `cancel` drops the connection early.
    /// The agent sees the hang-up and kills anything the request started.
    pub async fn send_cancellable(
        &self,
        request: &CommandRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<CommandResponse>, ClientError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(kind = request.kind(), "request cancelled by caller");
                Ok(None)
            }
            result = self.exchange(request) => result,
        }
    }

    /// True iff the agent answers a ping with success.
    pub async fn is_reachable(&self) -> bool {
        matches!(self.send(&CommandRequest::Ping).await, Ok(Some(response)) if response.success)
    }

    async fn exchange(&self, request: &CommandRequest) -> Result<Option<CommandResponse>, ClientError> {
        let Some(stream) = connect(&self.endpoint, self.connect_timeout).await else {
            debug!(endpoint = %self.endpoint, "agent unreachable");
            return Ok(None);
        };
        let (mut reader, mut writer) = tokio::io::split(stream);

        let limit = self.exchange_limit(request);
        let exchange = async {
            write_request(&mut writer, request).await?;
            read_response(&mut reader).await
        };
        match tokio::time::timeout(limit, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) if e.is_violation() => Err(ClientError::Protocol(e)),
            Ok(Err(e)) => {
                debug!(kind = request.kind(), error = %e, "exchange failed");
                Ok(None)
            }
            Err(_) => {
                warn!(kind = request.kind(), ?limit, "agent did not answer in time");
                Ok(None)
            }
        }
    }

    fn exchange_limit(&self, request: &CommandRequest) -> Duration {
        match request {
            CommandRequest::RunCommand { timeout, .. } => *timeout + RUN_COMMAND_SLACK,
            _ => self.exchange_timeout,
        }
    }
}

#[cfg(unix)]
type Connection = tokio::net::UnixStream;

#[cfg(windows)]
type Connection = tokio::net::windows::named_pipe::NamedPipeClient;

/// Keep trying until `timeout`; the agent may still be starting.
async fn connect(endpoint: &Endpoint, timeout: Duration) -> Option<Connection> {
    let deadline = Instant::now() + timeout;
    let mut backoff = MIN_BACKOFF;
    loop {
        match tokio::time::timeout_at(deadline, try_connect(endpoint)).await {
            Ok(Ok(stream)) => return Some(stream),
            Ok(Err(e)) => debug!(endpoint = %endpoint, error = %e, "connect attempt failed"),
            Err(_) => return None,
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        tokio::time::sleep(backoff.min(deadline - now)).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

#[cfg(unix)]
async fn try_connect(endpoint: &Endpoint) -> std::io::Result<Connection> {
    tokio::net::UnixStream::connect(endpoint.socket_path()).await
}

#[cfg(windows)]
async fn try_connect(endpoint: &Endpoint) -> std::io::Result<Connection> {
    // All instances busy (ERROR_PIPE_BUSY) and not created yet (NotFound)
    // are both retried by the caller.
    tokio::net::windows::named_pipe::ClientOptions::new().open(endpoint.pipe_name())
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
