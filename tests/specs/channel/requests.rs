// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request kinds answered by a live agent over the real socket.

use crate::prelude::*;

#[tokio::test]
async fn ping_succeeds() {
    let agent = TestAgent::start();
    assert!(agent.client().is_reachable().await);
}

#[tokio::test]
async fn run_command_reports_exit_code_and_output() {
    let agent = TestAgent::start();
    let request = CommandRequest::RunCommand {
        executable: "/bin/sh".into(),
        arguments: vec!["-c".into(), "echo out; echo boom >&2; exit 3".into()],
        timeout: Duration::from_secs(5),
    };

    let response = agent.client().send(&request).await.unwrap().unwrap();

    assert!(!response.success);
    assert_eq!(response.exit_code, Some(3));
    assert_eq!(response.standard_output.as_deref(), Some("out\n"));
    assert_eq!(response.standard_error.as_deref(), Some("boom\n"));
    assert_eq!(response.message(), "process exited with code 3");
}

#[tokio::test]
async fn run_command_timeout_is_a_failure_without_exit_code() {
    let agent = TestAgent::start();
    let request = CommandRequest::RunCommand {
        executable: "/bin/sleep".into(),
        arguments: vec!["10".into()],
        timeout: Duration::from_millis(200),
    };

    let started = Instant::now();
    let response = agent.client().send(&request).await.unwrap().unwrap();

    assert!(!response.success);
    assert_eq!(response.exit_code, None);
    assert!(response.message().contains("timed out"), "{}", response.message());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn missing_executable_is_a_failure() {
    let agent = TestAgent::start();
    let request = CommandRequest::run("/definitely/not/here", vec![]);

    let response = agent.client().send(&request).await.unwrap().unwrap();

    assert!(!response.success);
    assert_eq!(response.exit_code, None);
}

#[tokio::test]
async fn unknown_kind_is_answered_not_dropped() {
    use courier_wire::{read_response, write_message};

    let agent = TestAgent::start();
    let mut stream = tokio::net::UnixStream::connect(agent.endpoint.socket_path()).await.unwrap();
    write_message(&mut stream, br#"{"kind":"reticulateSplines"}"#).await.unwrap();

    let response = read_response(&mut stream).await.unwrap().unwrap();

    assert!(!response.success);
    assert!(response.message().contains("reticulateSplines"), "{}", response.message());
    assert!(agent.client().is_reachable().await);
}

#[tokio::test]
async fn sweep_of_an_empty_directory_terminates_nothing() {
    let agent = TestAgent::start();
    let empty = TempDir::new().unwrap();
    let request = CommandRequest::TerminateUnderDirectory { directory: empty.path().to_path_buf() };

    let response = agent.client().send(&request).await.unwrap().unwrap();

    assert_eq!(response, CommandResponse::value("0"));
}

#[tokio::test]
async fn sweep_terminates_processes_running_from_the_directory() {
    let agent = TestAgent::start();
    let games = TempDir::new().unwrap();
    let sleeper = games.path().join("game-sleep");
    std::fs::copy("/bin/sleep", &sleeper).unwrap();

    let launch = CommandRequest::LaunchProcess { executable: sleeper.clone(), arguments: Some("30".into()) };
    let launched = agent.client().send(&launch).await.unwrap().unwrap();
    assert!(launched.success, "{}", launched.message());

    // The process table may lag the spawn briefly.
    let sweep = CommandRequest::TerminateUnderDirectory { directory: games.path().to_path_buf() };
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let response = agent.client().send(&sweep).await.unwrap().unwrap();
        if response.standard_output.as_deref() == Some("1") {
            break;
        }
        assert!(Instant::now() < deadline, "sleeper was never swept: {:?}", response);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
