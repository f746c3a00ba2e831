// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-bound operations for the privileged service.
//!
//! Process execution and launching fall back to running locally when no
//! agent answers. The remaining operations only make sense inside the
//! user's session and report [`BridgeError::AgentUnavailable`] instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use courier_adapters::{CommandOutput, NativeSystem, SubprocessError, SystemAdapter};
use courier_wire::{CommandRequest, CommandResponse};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{AgentClient, ClientError};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("user-session agent is not available")]
    AgentUnavailable,

    /// The agent answered with a business failure.
    #[error("{0}")]
    Failed(String),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("local execution failed: {0}")]
    Local(#[from] SubprocessError),
}

/// Agent-first access to session-bound operations, with local fallback.
#[derive(Clone)]
pub struct SessionBridge<S: SystemAdapter = NativeSystem> {
    client: AgentClient,
    local: S,
}

impl SessionBridge<NativeSystem> {
    pub fn native(client: AgentClient) -> Self {
        Self::new(client, NativeSystem::new())
    }
}

impl<S: SystemAdapter> SessionBridge<S> {
    pub fn new(client: AgentClient, local: S) -> Self {
        Self { client, local }
    }

    /// Run a program to completion. A nonzero exit is `Ok` with its code.
    pub async fn run_command(
        &self,
        executable: &Path,
        arguments: &[String],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, BridgeError> {
        let request = CommandRequest::RunCommand {
            executable: executable.to_path_buf(),
            arguments: arguments.to_vec(),
            timeout,
        };
        match self.client.send_cancellable(&request, cancel).await? {
            Some(response) => match response.exit_code {
                Some(exit_code) => Ok(CommandOutput {
                    exit_code,
                    stdout: response.standard_output.unwrap_or_default(),
                    stderr: response.standard_error.unwrap_or_default(),
                }),
                None => Err(BridgeError::Failed(response.message().to_string())),
            },
            None if cancel.is_cancelled() => Err(BridgeError::Cancelled),
            None => {
                debug!(executable = %executable.display(), "agent unreachable, running locally");
                Ok(self.local.run(executable, arguments, timeout, cancel).await?)
            }
        }
    }

    /// Start a program without waiting for it.
    pub async fn launch_process(
        &self,
        executable: &Path,
        arguments: Option<&str>,
    ) -> Result<(), BridgeError> {
        let request = CommandRequest::LaunchProcess {
            executable: executable.to_path_buf(),
            arguments: arguments.map(String::from),
        };
        match self.client.send(&request).await? {
            Some(response) => succeeded(response).map(drop),
            None => {
                debug!(executable = %executable.display(), "agent unreachable, launching locally");
                let pid = self.local.launch(executable, arguments).await?;
                debug!(pid, "launched locally");
                Ok(())
            }
        }
    }

    pub async fn identity_path(&self) -> Result<PathBuf, BridgeError> {
        self.query(&CommandRequest::GetPrimaryIdentityPath).await.map(PathBuf::from)
    }

    pub async fn active_workload_id(&self) -> Result<String, BridgeError> {
        self.query(&CommandRequest::GetActiveWorkloadId).await
    }

    pub async fn open_url(&self, url: &str) -> Result<(), BridgeError> {
        self.session_only(&CommandRequest::LaunchByUrl { url: url.to_string() }).await.map(drop)
    }

    /// Returns how many processes were terminated.
    pub async fn terminate_under(&self, directory: &Path) -> Result<usize, BridgeError> {
        let request = CommandRequest::TerminateUnderDirectory { directory: directory.to_path_buf() };
        let count = self.query(&request).await?;
        count.trim().parse().map_err(|_| BridgeError::Failed(format!("unexpected count {:?}", count)))
    }

    async fn query(&self, request: &CommandRequest) -> Result<String, BridgeError> {
        let response = self.session_only(request).await?;
        Ok(response.standard_output.unwrap_or_default())
    }

    async fn session_only(&self, request: &CommandRequest) -> Result<CommandResponse, BridgeError> {
        match self.client.send(request).await? {
            Some(response) => succeeded(response),
            None => Err(BridgeError::AgentUnavailable),
        }
    }
}

fn succeeded(response: CommandResponse) -> Result<CommandResponse, BridgeError> {
    if response.success {
        Ok(response)
    } else {
        Err(BridgeError::Failed(response.message().to_string()))
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
