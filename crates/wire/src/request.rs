// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default `runCommand` timeout when the sender omits `timeoutMillis`.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Request from the privileged service to the user-session agent.
///
/// Each variant carries only the fields its kind needs. On the wire this is
/// the flat record `{kind, executablePath, arguments, freeformArgument,
/// timeoutMillis}`; fields a kind does not use are ignored when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RequestFrame", from = "RequestFrame")]
pub enum CommandRequest {
    /// Liveness check
    Ping,

    /// Run a program to completion and capture its output
    RunCommand { executable: PathBuf, arguments: Vec<String>, timeout: Duration },

    /// Start a program and return without waiting for it
    LaunchProcess {
        executable: PathBuf,
        /// Command-line arguments as one string
        arguments: Option<String>,
    },

    /// Install location of the per-user storefront client
    GetPrimaryIdentityPath,

    /// Identifier of the title currently running in the user's session
    GetActiveWorkloadId,

    /// Open a URI with the desktop's default handler
    LaunchByUrl { url: String },

    /// Kill every process whose executable lives under `directory`
    TerminateUnderDirectory { directory: PathBuf },

    /// A kind this build does not recognise
    Unsupported { kind: String },

    /// A recognised kind that arrived without a field it requires
    Invalid { kind: String, reason: String },
}

impl CommandRequest {
    /// Build a `runCommand` request with the default timeout.
    pub fn run(executable: impl Into<PathBuf>, arguments: Vec<String>) -> Self {
        Self::RunCommand {
            executable: executable.into(),
            arguments,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Wire name of this request's kind.
    pub fn kind(&self) -> &str {
        match self {
            Self::Ping => kind::PING,
            Self::RunCommand { .. } => kind::RUN_COMMAND,
            Self::LaunchProcess { .. } => kind::LAUNCH_PROCESS,
            Self::GetPrimaryIdentityPath => kind::GET_PRIMARY_IDENTITY_PATH,
            Self::GetActiveWorkloadId => kind::GET_ACTIVE_WORKLOAD_ID,
            Self::LaunchByUrl { .. } => kind::LAUNCH_BY_URL,
            Self::TerminateUnderDirectory { .. } => kind::TERMINATE_UNDER_DIRECTORY,
            Self::Unsupported { kind } | Self::Invalid { kind, .. } => kind,
        }
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunCommand { executable, .. } | Self::LaunchProcess { executable, .. } => {
                write!(f, "{} {}", self.kind(), executable.display())
            }
            Self::LaunchByUrl { url } => write!(f, "{} {}", self.kind(), url),
            Self::TerminateUnderDirectory { directory } => {
                write!(f, "{} {}", self.kind(), directory.display())
            }
            _ => f.write_str(self.kind()),
        }
    }
}

mod kind {
    pub const PING: &str = "ping";
    pub const RUN_COMMAND: &str = "runCommand";
    pub const LAUNCH_PROCESS: &str = "launchProcess";
    pub const GET_PRIMARY_IDENTITY_PATH: &str = "getPrimaryIdentityPath";
    pub const GET_ACTIVE_WORKLOAD_ID: &str = "getActiveWorkloadId";
    pub const LAUNCH_BY_URL: &str = "launchByUrl";
    pub const TERMINATE_UNDER_DIRECTORY: &str = "terminateUnderDirectory";
}

/// Flat wire shape shared with older peers.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestFrame {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    executable_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    arguments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    freeform_argument: Option<String>,
    #[serde(default = "default_timeout_ms")]
    timeout_millis: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl From<CommandRequest> for RequestFrame {
    fn from(request: CommandRequest) -> Self {
        let mut frame = RequestFrame {
            kind: request.kind().to_string(),
            timeout_millis: DEFAULT_TIMEOUT_MS,
            ..Default::default()
        };
        match request {
            CommandRequest::RunCommand { executable, arguments, timeout } => {
                frame.executable_path = Some(executable);
                frame.arguments = Some(arguments);
                frame.timeout_millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            }
            CommandRequest::LaunchProcess { executable, arguments } => {
                frame.executable_path = Some(executable);
                frame.freeform_argument = arguments;
            }
            CommandRequest::LaunchByUrl { url } => frame.freeform_argument = Some(url),
            CommandRequest::TerminateUnderDirectory { directory } => {
                frame.freeform_argument = Some(directory.to_string_lossy().into_owned());
            }
            CommandRequest::Ping
            | CommandRequest::GetPrimaryIdentityPath
            | CommandRequest::GetActiveWorkloadId
            | CommandRequest::Unsupported { .. }
            | CommandRequest::Invalid { .. } => {}
        }
        frame
    }
}

impl From<RequestFrame> for CommandRequest {
    fn from(frame: RequestFrame) -> Self {
        let RequestFrame { kind, executable_path, arguments, freeform_argument, timeout_millis } =
            frame;
        let missing = |field: &str| CommandRequest::Invalid {
            reason: format!("{} requires {}", kind, field),
            kind: kind.clone(),
        };

        match kind.as_str() {
            kind::PING => CommandRequest::Ping,
            kind::RUN_COMMAND => match executable_path {
                Some(executable) => CommandRequest::RunCommand {
                    executable,
                    arguments: arguments.unwrap_or_default(),
                    timeout: Duration::from_millis(timeout_millis),
                },
                None => missing("executablePath"),
            },
            kind::LAUNCH_PROCESS => match executable_path {
                Some(executable) => CommandRequest::LaunchProcess {
                    executable,
                    arguments: freeform_argument,
                },
                None => missing("executablePath"),
            },
            kind::GET_PRIMARY_IDENTITY_PATH => CommandRequest::GetPrimaryIdentityPath,
            kind::GET_ACTIVE_WORKLOAD_ID => CommandRequest::GetActiveWorkloadId,
            kind::LAUNCH_BY_URL => match freeform_argument {
                Some(url) if !url.is_empty() => CommandRequest::LaunchByUrl { url },
                _ => missing("a URL in freeformArgument"),
            },
            kind::TERMINATE_UNDER_DIRECTORY => match freeform_argument {
                Some(dir) if !dir.is_empty() => {
                    CommandRequest::TerminateUnderDirectory { directory: PathBuf::from(dir) }
                }
                _ => missing("a directory in freeformArgument"),
            },
            _ => CommandRequest::Unsupported { kind },
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
