// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(dead_code)]

pub use std::path::{Path, PathBuf};
pub use std::time::{Duration, Instant};

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
        let endpoint = Endpoint::with_root("courier-cli", root.path());
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
}

#[cfg(unix)]
impl Drop for TestAgent {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Builder for one `courier` invocation.
pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

pub fn cli() -> CliBuilder {
    let mut cmd = assert_cmd::Command::cargo_bin("courier").unwrap();
    cmd.env_remove("COURIER_ENDPOINT").timeout(Duration::from_secs(30));
    CliBuilder { cmd }
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Point the CLI at a runtime root and endpoint name.
    pub fn at(self, root: &Path, name: &str) -> Self {
        self.env("COURIER_RUNTIME_DIR", root).args(&["--endpoint", name])
    }

    pub fn passes(self) -> CliOutput {
        self.exits_with(0)
    }

    pub fn exits_with(mut self, code: i32) -> CliOutput {
        let output = self.cmd.output().unwrap();
        let result = CliOutput { output };
        assert_eq!(
            result.output.status.code(),
            Some(code),
            "unexpected exit status\nstdout: {}\nstderr: {}",
            result.stdout(),
            result.stderr()
        );
        result
    }
}

pub struct CliOutput {
    output: std::process::Output,
}

impl CliOutput {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(needle), "stdout missing {:?}:\n{}", needle, stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(needle), "stderr missing {:?}:\n{}", needle, stderr);
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        assert_eq!(self.stdout(), expected);
        self
    }
}
