// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output and exit codes without an agent.

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("ping")
        .stdout_has("run")
        .stdout_has("kill-under")
        .stdout_has("workload-id");
}

#[test]
fn run_help_shows_timeout_option() {
    cli().args(&["run", "--help"]).passes().stdout_has("--timeout-ms");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has(env!("CARGO_PKG_VERSION"));
}

#[test]
fn absent_agent_exits_two() {
    let root = TempDir::new().unwrap();
    cli()
        .at(root.path(), "nobody")
        .args(&["ping", "--connect-timeout-ms", "50"])
        .exits_with(2)
        .stderr_has("agent is not running");
}
