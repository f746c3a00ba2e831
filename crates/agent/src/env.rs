// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the agent crate.

use std::path::PathBuf;
use std::time::Duration;

use courier_wire::{Endpoint, DEFAULT_ENDPOINT_NAME};

use crate::lifecycle::LifecycleError;

/// Resolve state directory: COURIER_STATE_DIR > XDG_STATE_HOME/courier > ~/.local/state/courier
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("COURIER_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("courier"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/courier"))
}

/// Endpoint name override (`COURIER_ENDPOINT`)
pub fn endpoint() -> Endpoint {
    let name = std::env::var("COURIER_ENDPOINT")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT_NAME.to_string());
    Endpoint::new(name)
}

/// Bound on reading a request and writing its response
pub fn ipc_timeout() -> Duration {
    duration_ms("COURIER_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Shutdown drain timeout (default 5s, configurable via `COURIER_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    duration_ms("COURIER_DRAIN_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Account the privileged service runs as, as a SID or SDDL alias
/// (`COURIER_SERVICE_SID`, default `SY` for LocalSystem).
pub fn service_sid() -> String {
    std::env::var("COURIER_SERVICE_SID")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "SY".to_string())
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}
