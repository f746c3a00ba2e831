// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Independent connections do not wait on each other.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pings_are_not_blocked_by_a_slow_command() {
    let agent = TestAgent::start();
    let client = agent.client();

    let slow = {
        let client = client.clone();
        tokio::spawn(async move {
            let request = CommandRequest::RunCommand {
                executable: "/bin/sleep".into(),
                arguments: vec!["2".into()],
                timeout: Duration::from_secs(10),
            };
            client.send(&request).await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let pings: Vec<_> = (0..32)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.is_reachable().await })
        })
        .collect();
    for ping in pings {
        assert!(ping.await.unwrap());
    }
    assert!(started.elapsed() < Duration::from_secs(1), "pings took {:?}", started.elapsed());

    let response = slow.await.unwrap().unwrap().unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn absent_agent_is_none_within_connect_timeout() {
    let root = TempDir::new().unwrap();
    let client = AgentClient::new(Endpoint::with_root("nobody", root.path()))
        .with_connect_timeout(Duration::from_millis(400));

    let started = Instant::now();
    let response = client.send(&CommandRequest::Ping).await.unwrap();

    assert_eq!(response, None);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(350) && elapsed < Duration::from_secs(3), "{:?}", elapsed);
}
