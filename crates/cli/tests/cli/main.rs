// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specs for the `courier` binary.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

mod prelude;

mod help;
#[cfg(unix)]
mod session;
