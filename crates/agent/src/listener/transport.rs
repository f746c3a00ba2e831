// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform endpoint: a Unix domain socket or a Windows named pipe.

use std::io;

use courier_wire::Endpoint;
use tracing::info;

use super::access::AccessPolicy;
use super::ListenError;

#[cfg(unix)]
pub type Connection = tokio::net::UnixStream;

#[cfg(windows)]
pub type Connection = tokio::net::windows::named_pipe::NamedPipeServer;

/// Bound endpoint accepting one connection at a time.
#[cfg(unix)]
pub struct Transport {
    listener: tokio::net::UnixListener,
    path: std::path::PathBuf,
}

#[cfg(unix)]
impl Transport {
    /// Apply `policy` and bind. The socket is secured before this returns,
    /// and nothing is accepted until [`Transport::accept`] is called.
    pub fn bind(endpoint: &Endpoint, policy: &dyn AccessPolicy) -> Result<Self, ListenError> {
        policy.prepare(endpoint)?;
        let path = endpoint.socket_path();
        let listener = tokio::net::UnixListener::bind(&path)
            .map_err(|e| ListenError::BindFailed(endpoint.to_string(), e))?;
        policy.secure(&path)?;
        info!(endpoint = %path.display(), policy = policy.describe(), "listening");
        Ok(Self { listener, path })
    }

    pub async fn accept(&mut self) -> io::Result<Connection> {
        let (stream, _) = self.listener.accept().await?;
        Ok(stream)
    }

    /// Remove the socket file.
    pub fn close(self) {
        drop(self.listener);
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "socket already removed");
        }
    }
}

/// Named pipe server. A fresh instance is created for every client so the
/// pipe name is never unbound while the agent runs.
#[cfg(windows)]
pub struct Transport {
    name: String,
    security: super::pipe_security::PipeSecurity,
    next: Connection,
}

#[cfg(windows)]
impl Transport {
    pub fn bind(endpoint: &Endpoint, policy: &dyn AccessPolicy) -> Result<Self, ListenError> {
        policy.prepare(endpoint)?;
        let name = endpoint.pipe_name();
        let security = policy.pipe_security();
        // The first instance fails if another process already owns the name.
        let next = security.create(&name, true).map_err(|e| ListenError::BindFailed(name.clone(), e))?;
        policy.secure(std::path::Path::new(&name))?;
        info!(endpoint = %name, policy = policy.describe(), "listening");
        Ok(Self { name, security, next })
    }

    /// Wait for a client on the pending instance and put a fresh one in its
    /// place. The instance is replaced even when connecting fails: one a
    /// client abandoned mid-connect never accepts again.
    pub async fn accept(&mut self) -> io::Result<Connection> {
        let connected = self.next.connect().await;
        let fresh = self.security.create(&self.name, false)?;
        let used = std::mem::replace(&mut self.next, fresh);
        connected.map(|()| used)
    }

    pub fn close(self) {}
}

#[cfg(all(test, windows))]
#[path = "transport_tests.rs"]
mod tests;
