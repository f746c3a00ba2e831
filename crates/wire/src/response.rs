// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Terminal result for exactly one [`CommandRequest`](crate::CommandRequest).
///
/// Absent fields are omitted from the JSON rather than defaulted, so a
/// missing `errorMessage` is distinguishable from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl CommandResponse {
    /// Success with no payload.
    pub fn ok() -> Self {
        Self { success: true, ..Default::default() }
    }

    /// Business failure carrying only a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, error_message: Some(message.into()), ..Default::default() }
    }

    /// Success carrying a single string payload in `standardOutput`.
    pub fn value(value: impl Into<String>) -> Self {
        Self { success: true, standard_output: Some(value.into()), ..Default::default() }
    }

    /// Result of a completed `runCommand`; nonzero exit codes are failures
    /// that still carry the captured streams.
    pub fn completed(exit_code: i32, stdout: String, stderr: String) -> Self {
        let success = exit_code == 0;
        Self {
            success,
            error_message: (!success).then(|| format!("process exited with code {}", exit_code)),
            standard_output: Some(stdout),
            standard_error: Some(stderr),
            exit_code: Some(exit_code),
        }
    }

    /// The error message, or a placeholder for failures that lack one.
    pub fn message(&self) -> &str {
        self.error_message.as_deref().unwrap_or("unknown error")
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
