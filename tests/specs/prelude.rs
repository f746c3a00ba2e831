// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(dead_code)]

pub use std::path::{Path, PathBuf};
pub use std::time::{Duration, Instant};

pub use courier_client::AgentClient;
pub use courier_wire::{CommandRequest, CommandResponse, Endpoint};
pub use tempfile::TempDir;
pub use tokio_util::sync::CancellationToken;

/// A live agent bound under a private runtime root.
#[cfg(unix)]
pub struct TestAgent {
    pub root: TempDir,
    pub endpoint: Endpoint,
    shutdown: CancellationToken,
}

#[cfg(unix)]
impl TestAgent {
    /// Must be called inside a tokio runtime.
    pub fn start() -> Self {
        use courier_adapters::NativeSystem;
        use courier_agent::listener::access::OwnerOnly;
        use courier_agent::{Dispatcher, Listener, ListenerConfig};

        let root = TempDir::new().unwrap();
        let endpoint = Endpoint::with_root("courier-specs", root.path());
        let config = ListenerConfig {
            ipc_timeout: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(2),
        };
        let listener =
            Listener::bind(&endpoint, &OwnerOnly, Dispatcher::new(NativeSystem::new()), config)
                .unwrap();
        let shutdown = CancellationToken::new();
        tokio::spawn(listener.run(shutdown.clone()));
        Self { root, endpoint, shutdown }
    }

    pub fn client(&self) -> AgentClient {
        AgentClient::new(self.endpoint.clone()).with_connect_timeout(Duration::from_secs(2))
    }
}

#[cfg(unix)]
impl Drop for TestAgent {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
