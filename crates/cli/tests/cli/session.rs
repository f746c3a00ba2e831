// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI against a live agent.

use crate::prelude::*;

/// Run `courier` off the runtime threads so the agent keeps serving.
async fn courier(agent: &TestAgent, args: &[&str], code: i32) -> CliOutput {
    let root = agent.root.path().to_path_buf();
    let name = agent.endpoint.name().to_string();
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        cli().at(&root, &name).args(&args).exits_with(code)
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn ping_reports_running_agent() {
    let agent = TestAgent::start();
    courier(&agent, &["ping"], 0).await.stdout_eq("agent is running\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn run_mirrors_child_output_and_exit_code() {
    let agent = TestAgent::start();
    courier(&agent, &["run", "/bin/sh", "-c", "echo out; echo boom >&2; exit 3"], 3)
        .await
        .stdout_eq("out\n")
        .stderr_has("boom");
}

#[tokio::test(flavor = "multi_thread")]
async fn run_of_missing_program_exits_one() {
    let agent = TestAgent::start();
    courier(&agent, &["run", "/definitely/not/here"], 1).await.stderr_has("courier:");
}

#[tokio::test(flavor = "multi_thread")]
async fn kill_under_empty_directory_prints_zero() {
    let agent = TestAgent::start();
    let empty = TempDir::new().unwrap();
    let dir = empty.path().display().to_string();
    courier(&agent, &["kill-under", &dir], 0).await.stdout_eq("0\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn open_rejects_option_like_targets() {
    let agent = TestAgent::start();
    courier(&agent, &["open", "--", "--help"], 1).await;
}
