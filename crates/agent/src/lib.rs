// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-session agent: owns the local endpoint and performs session-bound
//! actions on behalf of the privileged service.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod dispatcher;
pub mod env;
pub mod lifecycle;
pub mod listener;

pub use dispatcher::Dispatcher;
pub use lifecycle::{startup, Config, InstanceLock, LifecycleError};
pub use listener::access::{platform_policy, AccessPolicy};
pub use listener::{ListenError, Listener, ListenerConfig};
