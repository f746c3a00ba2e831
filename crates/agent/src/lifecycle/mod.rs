// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent lifecycle management: single-instance lock, startup, shutdown.

use std::fs::File;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

use courier_adapters::SystemAdapter;
use courier_wire::Endpoint;
use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::listener::access::AccessPolicy;
use crate::listener::{ListenError, Listener, ListenerConfig};

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/courier)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to agent log file
    pub log_path: PathBuf,
    /// Endpoint the listener binds
    pub endpoint: Endpoint,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// One agent serves one interactive user.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_state_dir(crate::env::state_dir()?, crate::env::endpoint()))
    }

    pub fn for_state_dir(state_dir: PathBuf, endpoint: Endpoint) -> Self {
        Self {
            lock_path: state_dir.join("agent.pid"),
            log_path: state_dir.join("agent.log"),
            state_dir,
            endpoint,
        }
    }
}

/// Held for the agent's lifetime; a second agent for the same state
/// directory fails to start.
#[derive(Debug)]
pub struct InstanceLock {
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Take the lock and record our pid in it.
    pub fn acquire(config: &Config) -> Result<Self, LifecycleError> {
        std::fs::create_dir_all(&config.state_dir)?;

        // Don't truncate before holding the lock; that would wipe the
        // running agent's PID.
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.lock_path)?;
        file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()?;

        Ok(Self { file, path: config.lock_path.clone() })
    }

    /// Remove the PID file and release the lock.
    pub fn release(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove PID file: {}", e);
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release lock: {}", e);
        }
        info!("agent shutdown complete");
    }
}

/// Take the instance lock, then bind the endpoint.
///
/// The lock is only kept when the endpoint is bound and secured.
pub fn startup<S: SystemAdapter>(
    config: &Config,
    policy: &dyn AccessPolicy,
    dispatcher: Dispatcher<S>,
    listener_config: ListenerConfig,
) -> Result<(InstanceLock, Listener<S>), LifecycleError> {
    let lock = InstanceLock::acquire(config)?;
    match Listener::bind(&config.endpoint, policy, dispatcher, listener_config) {
        Ok(listener) => Ok((lock, listener)),
        Err(e) => {
            lock.release();
            Err(e.into())
        }
    }
}

/// Await a signal listener.
///
/// A listener that cannot be installed never resolves, so a failed
/// install is not mistaken for a shutdown request.
pub async fn signal_or_pending<F>(name: &str, listener: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = listener.await {
        warn!(signal = name, "cannot watch signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: agent already running?")]
    LockFailed(#[source] std::io::Error),

    #[error(transparent)]
    Listen(#[from] ListenError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
