// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS adapters for the courier agent: subprocess supervision, the process
//! table, per-user session state, and the default URL handler.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod opener;
pub mod process_table;
pub mod session;
pub mod subprocess;
mod system;

pub use opener::OpenError;
pub use process_table::{ProcessTable, SweepReport, TerminateError};
pub use session::{SessionError, SteamLocator};
pub use subprocess::{CommandOutput, SubprocessError};
pub use system::{NativeSystem, SystemAdapter};

#[cfg(any(test, feature = "test-support"))]
pub use system::{FakeSystem, SystemCall};
