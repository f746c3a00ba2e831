// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the client crate.

use std::time::Duration;

use courier_wire::{Endpoint, DEFAULT_ENDPOINT_NAME};

/// Endpoint name override (`COURIER_ENDPOINT`)
pub fn endpoint() -> Endpoint {
    let name = std::env::var("COURIER_ENDPOINT")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT_NAME.to_string());
    Endpoint::new(name)
}

/// How long to keep trying to reach the agent (default 3s).
pub fn connect_timeout() -> Duration {
    duration_ms("COURIER_CONNECT_TIMEOUT_MS").unwrap_or(Duration::from_millis(3000))
}

/// Bound on one exchange for kinds other than `runCommand` (default 30s).
pub fn exchange_timeout() -> Duration {
    duration_ms("COURIER_EXCHANGE_TIMEOUT_MS").unwrap_or(Duration::from_secs(30))
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}
