// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! so that `main()` owns process termination.

use std::fmt;

/// Agent answered with a business failure.
pub const EXIT_FAILURE: i32 = 1;
/// No agent answered at the endpoint.
pub const EXIT_UNAVAILABLE: i32 = 2;

#[derive(Debug, PartialEq, Eq)]
pub struct ExitError {
    pub code: i32,
    /// Printed to stderr by `main()` unless empty.
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Exit with `code` without printing anything further.
    pub fn silent(code: i32) -> Self {
        Self::new(code, String::new())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "exit code {}", self.code)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ExitError {}
