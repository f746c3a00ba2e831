// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability interface over the OS facilities the dispatcher needs.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::opener::{self, OpenError};
use crate::process_table::{self, SweepReport};
use crate::session::{SessionError, SteamLocator};
use crate::subprocess::{self, CommandOutput, SubprocessError};

/// Adapter for privileged-but-session-bound OS actions
#[async_trait]
pub trait SystemAdapter: Clone + Send + Sync + 'static {
    /// Run a program to completion, killing its tree on timeout or cancel
    async fn run(
        &self,
        executable: &Path,
        arguments: &[String],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, SubprocessError>;

    /// Start a program without waiting; returns its pid
    async fn launch(&self, executable: &Path, arguments: Option<&str>)
        -> Result<u32, SubprocessError>;

    /// Install location of the user's Steam client
    async fn primary_identity_path(&self) -> Result<PathBuf, SessionError>;

    /// App id of the title running in the user's session
    async fn active_workload_id(&self) -> Result<String, SessionError>;

    /// Hand a URI to the default handler
    async fn open_url(&self, url: &str) -> Result<(), OpenError>;

    /// Kill every process whose executable lives under `directory`
    async fn terminate_under(&self, directory: &Path) -> io::Result<SweepReport>;
}

/// The real OS.
#[derive(Clone, Debug, Default)]
pub struct NativeSystem {
    steam: SteamLocator,
}

impl NativeSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SystemAdapter for NativeSystem {
    async fn run(
        &self,
        executable: &Path,
        arguments: &[String],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, SubprocessError> {
        subprocess::run_with_timeout(executable, arguments, timeout, cancel).await
    }

    async fn launch(
        &self,
        executable: &Path,
        arguments: Option<&str>,
    ) -> Result<u32, SubprocessError> {
        subprocess::spawn_detached(executable, arguments)
    }

    async fn primary_identity_path(&self) -> Result<PathBuf, SessionError> {
        let steam = self.steam.clone();
        tokio::task::spawn_blocking(move || steam.install_root())
            .await
            .map_err(|e| SessionError::Read(e.to_string()))?
    }

    async fn active_workload_id(&self) -> Result<String, SessionError> {
        let steam = self.steam.clone();
        tokio::task::spawn_blocking(move || steam.running_app_id())
            .await
            .map_err(|e| SessionError::Read(e.to_string()))?
            .map(|id| id.to_string())
    }

    async fn open_url(&self, url: &str) -> Result<(), OpenError> {
        opener::open_url(url).await
    }

    async fn terminate_under(&self, directory: &Path) -> io::Result<SweepReport> {
        let directory = directory.to_path_buf();
        tokio::task::spawn_blocking(move || process_table::terminate_under(&directory))
            .await
            .map_err(io::Error::other)?
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded adapter call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SystemCall {
        Run { executable: PathBuf, arguments: Vec<String>, timeout: Duration },
        Launch { executable: PathBuf, arguments: Option<String> },
        PrimaryIdentityPath,
        ActiveWorkloadId,
        OpenUrl { url: String },
        TerminateUnder { directory: PathBuf },
    }

    #[derive(Default)]
    struct FakeSystemState {
        calls: Vec<SystemCall>,
        output: CommandOutput,
        identity_path: Option<PathBuf>,
        workload_id: Option<String>,
        open_error: Option<String>,
        sweep: SweepReport,
    }

    /// Fake system adapter for testing
    #[derive(Clone, Default)]
    pub struct FakeSystem {
        inner: Arc<Mutex<FakeSystemState>>,
    }

    impl FakeSystem {
        pub fn new() -> Self {
            Self::default()
        }

        /// Output returned by `run`
        pub fn with_output(self, output: CommandOutput) -> Self {
            self.inner.lock().output = output;
            self
        }

        pub fn with_identity_path(self, path: impl Into<PathBuf>) -> Self {
            self.inner.lock().identity_path = Some(path.into());
            self
        }

        pub fn with_workload_id(self, id: impl Into<String>) -> Self {
            self.inner.lock().workload_id = Some(id.into());
            self
        }

        /// Make `open_url` fail with `message`
        pub fn failing_open(self, message: impl Into<String>) -> Self {
            self.inner.lock().open_error = Some(message.into());
            self
        }

        pub fn with_sweep(self, report: SweepReport) -> Self {
            self.inner.lock().sweep = report;
            self
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<SystemCall> {
            self.inner.lock().calls.clone()
        }

        fn record(&self, call: SystemCall) {
            self.inner.lock().calls.push(call);
        }
    }

    #[async_trait]
    impl SystemAdapter for FakeSystem {
        async fn run(
            &self,
            executable: &Path,
            arguments: &[String],
            timeout: Duration,
            _cancel: &CancellationToken,
        ) -> Result<CommandOutput, SubprocessError> {
            self.record(SystemCall::Run {
                executable: executable.to_path_buf(),
                arguments: arguments.to_vec(),
                timeout,
            });
            Ok(self.inner.lock().output.clone())
        }

        async fn launch(
            &self,
            executable: &Path,
            arguments: Option<&str>,
        ) -> Result<u32, SubprocessError> {
            self.record(SystemCall::Launch {
                executable: executable.to_path_buf(),
                arguments: arguments.map(String::from),
            });
            Ok(4242)
        }

        async fn primary_identity_path(&self) -> Result<PathBuf, SessionError> {
            self.record(SystemCall::PrimaryIdentityPath);
            self.inner.lock().identity_path.clone().ok_or(SessionError::NotInstalled)
        }

        async fn active_workload_id(&self) -> Result<String, SessionError> {
            self.record(SystemCall::ActiveWorkloadId);
            self.inner.lock().workload_id.clone().ok_or(SessionError::NoActiveWorkload)
        }

        async fn open_url(&self, url: &str) -> Result<(), OpenError> {
            self.record(SystemCall::OpenUrl { url: url.to_string() });
            match self.inner.lock().open_error.clone() {
                Some(message) => Err(OpenError::Opener(SubprocessError::Io(io::Error::other(message)))),
                None => Ok(()),
            }
        }

        async fn terminate_under(&self, directory: &Path) -> io::Result<SweepReport> {
            self.record(SystemCall::TerminateUnder { directory: directory.to_path_buf() });
            Ok(self.inner.lock().sweep.clone())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSystem, SystemCall};
