// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known local endpoint shared by the agent and its clients.
//!
//! Renaming the endpoint breaks compatibility between agent and service
//! builds, so both sides take it as an explicit value.

use std::fmt;
use std::path::PathBuf;

/// Endpoint name used when none is configured.
pub const DEFAULT_ENDPOINT_NAME: &str = "courier-agent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    name: String,
    root: PathBuf,
}

impl Endpoint {
    /// Endpoint under the default runtime root.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), root: default_root() }
    }

    /// Endpoint under an explicit runtime root (Unix only; ignored for pipes).
    pub fn with_root(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), root: root.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the socket. Its permissions are the access boundary.
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    /// Unix domain socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.dir().join("agent.sock")
    }

    /// Windows named pipe path.
    pub fn pipe_name(&self) -> String {
        format!(r"\\.\pipe\{}", self.name)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT_NAME)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if cfg!(windows) {
            f.write_str(&self.pipe_name())
        } else {
            write!(f, "{}", self.socket_path().display())
        }
    }
}

/// Runtime root: `COURIER_RUNTIME_DIR` > `/tmp`.
///
/// Must resolve identically for root and for the session user, so `TMPDIR`
/// and `XDG_RUNTIME_DIR` are not consulted.
fn default_root() -> PathBuf {
    std::env::var_os("COURIER_RUNTIME_DIR")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
