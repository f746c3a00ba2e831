// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps each request kind to an OS action and a response.
//!
//! Every path ends in a [`CommandResponse`]; adapter errors become business
//! failures carrying the error's message.

use std::path::Path;
use std::time::Duration;

use courier_adapters::{SubprocessError, SystemAdapter};
use courier_wire::{CommandRequest, CommandResponse};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Dispatcher<S: SystemAdapter> {
    system: S,
}

impl<S: SystemAdapter> Dispatcher<S> {
    pub fn new(system: S) -> Self {
        Self { system }
    }

    /// Perform `request`. `cancel` aborts a running `runCommand` and kills
    /// its process tree.
    pub async fn dispatch(
        &self,
        request: CommandRequest,
        cancel: &CancellationToken,
    ) -> CommandResponse {
        match request {
            CommandRequest::Ping => CommandResponse::ok(),

            CommandRequest::RunCommand { executable, arguments, timeout } => {
                self.run_command(&executable, &arguments, timeout, cancel).await
            }

            CommandRequest::LaunchProcess { executable, arguments } => {
                match self.system.launch(&executable, arguments.as_deref()).await {
                    Ok(pid) => {
                        info!(pid, executable = %executable.display(), "launched process");
                        CommandResponse::ok()
                    }
                    Err(e) => CommandResponse::failure(e.to_string()),
                }
            }

            CommandRequest::GetPrimaryIdentityPath => {
                match self.system.primary_identity_path().await {
                    Ok(path) => CommandResponse::value(path.display().to_string()),
                    Err(e) => CommandResponse::failure(e.to_string()),
                }
            }

            CommandRequest::GetActiveWorkloadId => match self.system.active_workload_id().await {
                Ok(id) => CommandResponse::value(id),
                Err(e) => CommandResponse::failure(e.to_string()),
            },

            CommandRequest::LaunchByUrl { url } => match self.system.open_url(&url).await {
                Ok(()) => CommandResponse::ok(),
                Err(e) => CommandResponse::failure(e.to_string()),
            },

            CommandRequest::TerminateUnderDirectory { directory } => {
                match self.system.terminate_under(&directory).await {
                    Ok(report) => {
                        info!(
                            directory = %directory.display(),
                            terminated = report.terminated.len(),
                            skipped = report.skipped.len(),
                            "swept directory"
                        );
                        CommandResponse::value(report.terminated.len().to_string())
                    }
                    Err(e) => CommandResponse::failure(format!(
                        "cannot enumerate processes under {}: {}",
                        directory.display(),
                        e
                    )),
                }
            }

            CommandRequest::Unsupported { kind } => {
                warn!(kind = %kind, "unknown request kind");
                CommandResponse::failure(format!("unknown command kind: {}", kind))
            }

            CommandRequest::Invalid { kind, reason } => {
                debug!(kind = %kind, reason = %reason, "invalid request");
                CommandResponse::failure(reason)
            }
        }
    }

    async fn run_command(
        &self,
        executable: &Path,
        arguments: &[String],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> CommandResponse {
        match self.system.run(executable, arguments, timeout, cancel).await {
            Ok(output) => {
                debug!(executable = %executable.display(), exit_code = output.exit_code, "command finished");
                CommandResponse::completed(output.exit_code, output.stdout, output.stderr)
            }
            Err(e @ SubprocessError::TimedOut(_)) => {
                warn!(executable = %executable.display(), "command timed out");
                CommandResponse::failure(e.to_string())
            }
            Err(e) => CommandResponse::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
