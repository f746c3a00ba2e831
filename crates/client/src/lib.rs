// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the agent channel, used by the privileged service.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod bridge;
mod client;
pub mod env;

pub use bridge::{BridgeError, SessionBridge};
pub use client::{AgentClient, ClientError};
