// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use courier_client::AgentClient;
use courier_wire::{CommandRequest, CommandResponse, DEFAULT_TIMEOUT_MS};

use crate::exit_error::{ExitError, EXIT_FAILURE, EXIT_UNAVAILABLE};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the agent is running
    Ping,
    /// Run a program in the user's session and print its output
    ///
    /// Everything after EXECUTABLE is passed to the program, so options for
    /// this command go before it.
    Run {
        /// Kill the program and its children after this long
        #[arg(long, value_name = "MS", default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,
        executable: PathBuf,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Start a program in the user's session without waiting for it
    Launch {
        executable: PathBuf,
        /// Argument string handed to the program as-is
        #[arg(long, allow_hyphen_values = true)]
        args: Option<String>,
    },
    /// Hand a URI to the session's default handler
    Open { url: String },
    /// Terminate every process whose executable lives under a directory
    KillUnder { directory: PathBuf },
    /// Print the Steam installation directory
    IdentityPath,
    /// Print the app id of the running Steam title
    WorkloadId,
}

impl Command {
    fn into_request(self) -> CommandRequest {
        match self {
            Command::Ping => CommandRequest::Ping,
            Command::Run { timeout_ms, executable, args } => CommandRequest::RunCommand {
                executable,
                arguments: args,
                timeout: Duration::from_millis(timeout_ms),
            },
            Command::Launch { executable, args } => {
                CommandRequest::LaunchProcess { executable, arguments: args }
            }
            Command::Open { url } => CommandRequest::LaunchByUrl { url },
            Command::KillUnder { directory } => CommandRequest::TerminateUnderDirectory { directory },
            Command::IdentityPath => CommandRequest::GetPrimaryIdentityPath,
            Command::WorkloadId => CommandRequest::GetActiveWorkloadId,
        }
    }
}

/// What to print for a response, and how to exit afterwards.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub stdout: String,
    pub stderr: String,
    pub exit: Option<ExitError>,
}

pub async fn execute(client: &AgentClient, command: Command) -> Result<()> {
    let request = command.into_request();
    let Some(response) = client.send(&request).await? else {
        return Err(ExitError::new(
            EXIT_UNAVAILABLE,
            format!("agent is not running at {}", client.endpoint()),
        )
        .into());
    };

    let report = report(&request, response);
    print!("{}", report.stdout);
    eprint!("{}", report.stderr);
    std::io::stdout().flush()?;
    match report.exit {
        Some(exit) => Err(exit.into()),
        None => Ok(()),
    }
}

pub fn report(request: &CommandRequest, response: CommandResponse) -> Report {
    if let (CommandRequest::RunCommand { .. }, Some(code)) = (request, response.exit_code) {
        return Report {
            stdout: response.standard_output.unwrap_or_default(),
            stderr: response.standard_error.unwrap_or_default(),
            exit: (code != 0).then(|| ExitError::silent(code)),
        };
    }
    if !response.success {
        return Report {
            exit: Some(ExitError::new(EXIT_FAILURE, response.message())),
            ..Report::default()
        };
    }
    let stdout = match (request, response.standard_output) {
        (CommandRequest::Ping, _) => "agent is running\n".to_string(),
        (_, Some(value)) => format!("{}\n", value),
        (_, None) => String::new(),
    };
    Report { stdout, ..Report::default() }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
