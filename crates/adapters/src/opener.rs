// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hand a URI to the desktop's default handler.

use thiserror::Error;

use crate::subprocess::{spawn_handoff, SubprocessError};

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("not a URI: {0:?}")]
    InvalidUrl(String),

    #[error("opener failed: {0}")]
    Opener(#[from] SubprocessError),
}

/// Require an RFC 3986 scheme so the string cannot be read as an option.
pub fn validate_url(url: &str) -> Result<(), OpenError> {
    let invalid = || OpenError::InvalidUrl(url.to_string());
    let (scheme, rest) = url.split_once(':').ok_or_else(invalid)?;
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_scheme =
        starts_alpha && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    // A single letter is a Windows drive, not a scheme.
    if !valid_scheme || scheme.len() < 2 || rest.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

/// Open `url`. Success means the OS accepted it, not that a handler started.
pub async fn open_url(url: &str) -> Result<(), OpenError> {
    validate_url(url)?;
    let (program, args) = opener_command(url);
    spawn_handoff(program, &args).await?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> (&'static str, Vec<&str>) {
    ("open", vec![url])
}

#[cfg(windows)]
fn opener_command(url: &str) -> (&'static str, Vec<&str>) {
    ("rundll32", vec!["url.dll,FileProtocolHandler", url])
}

#[cfg(not(any(target_os = "macos", windows)))]
fn opener_command(url: &str) -> (&'static str, Vec<&str>) {
    ("xdg-open", vec![url])
}

#[cfg(test)]
#[path = "opener_tests.rs"]
mod tests;
