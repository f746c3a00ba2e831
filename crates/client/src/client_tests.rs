// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Instant;
use tempfile::TempDir;

fn missing_endpoint(root: &TempDir) -> Endpoint {
    Endpoint::with_root("nobody-home", root.path())
}

#[tokio::test]
async fn unreachable_agent_is_none_after_connect_timeout() {
    let root = TempDir::new().unwrap();
    let client = AgentClient::new(missing_endpoint(&root)).with_connect_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let response = client.send(&CommandRequest::Ping).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response, None);
    assert!(elapsed >= Duration::from_millis(250), "returned too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "returned too late: {:?}", elapsed);
}

#[tokio::test]
async fn unreachable_agent_is_not_reachable() {
    let root = TempDir::new().unwrap();
    let client = AgentClient::new(missing_endpoint(&root)).with_connect_timeout(Duration::from_millis(50));
    assert!(!client.is_reachable().await);
}

#[tokio::test]
async fn cancelled_send_returns_none_promptly() {
    let root = TempDir::new().unwrap();
    let client = AgentClient::new(missing_endpoint(&root)).with_connect_timeout(Duration::from_secs(30));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let started = Instant::now();
    let response = client.send_cancellable(&CommandRequest::Ping, &cancel).await.unwrap();

    assert_eq!(response, None);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[yare::parameterized(
    ping        = { CommandRequest::Ping, 30_000 },
    short_run   = { CommandRequest::RunCommand { executable: "/bin/true".into(), arguments: vec![], timeout: Duration::from_secs(1) }, 6_000 },
    long_run    = { CommandRequest::RunCommand { executable: "/bin/true".into(), arguments: vec![], timeout: Duration::from_secs(120) }, 125_000 },
    workload    = { CommandRequest::GetActiveWorkloadId, 30_000 },
)]
fn exchange_limit_follows_kind(request: CommandRequest, expected_ms: u64) {
    let client = AgentClient::new(Endpoint::new("x")).with_exchange_timeout(Duration::from_secs(30));
    assert_eq!(client.exchange_limit(&request), Duration::from_millis(expected_ms));
}

#[cfg(unix)]
mod unix {
    use super::*;
    use courier_wire::{read_request, write_message};
    use tokio::net::UnixListener;

    /// A one-shot fake agent that answers with `reply` bytes.
    fn fake_agent(reply: Vec<u8>) -> (TempDir, Endpoint) {
        let root = TempDir::new().unwrap();
        let endpoint = Endpoint::with_root("fake", root.path());
        std::fs::create_dir_all(endpoint.dir()).unwrap();
        let listener = UnixListener::bind(endpoint.socket_path()).unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream, Duration::from_secs(5)).await;
            if !reply.is_empty() {
                let _ = write_message(&mut stream, &reply).await;
            }
        });
        (root, endpoint)
    }

    #[tokio::test]
    async fn response_is_returned() {
        let (_root, endpoint) = fake_agent(br#"{"success":true,"standardOutput":"620"}"#.to_vec());
        let client = AgentClient::new(endpoint);

        let response = client.send(&CommandRequest::GetActiveWorkloadId).await.unwrap();

        assert_eq!(response, Some(CommandResponse::value("620")));
    }

    #[tokio::test]
    async fn close_without_response_is_none() {
        let (_root, endpoint) = fake_agent(Vec::new());
        let client = AgentClient::new(endpoint);
        assert_eq!(client.send(&CommandRequest::Ping).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_response_is_protocol_violation() {
        let (_root, endpoint) = fake_agent(b"not json".to_vec());
        let client = AgentClient::new(endpoint);
        let err = client.send(&CommandRequest::Ping).await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn agent_that_starts_late_is_reached() {
        let root = TempDir::new().unwrap();
        let endpoint = Endpoint::with_root("late", root.path());
        let client = AgentClient::new(endpoint.clone()).with_connect_timeout(Duration::from_secs(3));

        let late = endpoint.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            std::fs::create_dir_all(late.dir()).unwrap();
            let listener = UnixListener::bind(late.socket_path()).unwrap();
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream, Duration::from_secs(5)).await;
            let _ = courier_wire::write_response(&mut stream, &CommandResponse::ok(), Duration::from_secs(5)).await;
        });

        assert!(client.is_reachable().await);
    }
}
