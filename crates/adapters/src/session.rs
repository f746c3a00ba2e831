// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user Steam state that is only visible inside the interactive session.
//!
//! Windows keeps it in `HKCU\Software\Valve\Steam`; Linux and macOS keep the
//! same keys in a `registry.vdf` text file under the user's home.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors reading session state
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Steam is not installed for this user")]
    NotInstalled,

    #[error("no Steam title is currently running")]
    NoActiveWorkload,

    #[error("cannot locate the user's home directory")]
    NoHome,

    #[error("failed to read session state: {0}")]
    Read(String),
}

/// Locates the Steam client for one user.
#[derive(Debug, Clone)]
pub struct SteamLocator {
    home: Option<PathBuf>,
}

impl Default for SteamLocator {
    fn default() -> Self {
        Self { home: dirs::home_dir() }
    }
}

impl SteamLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locator rooted at an explicit home directory.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: Some(home.into()) }
    }

    /// Steam install root.
    pub fn install_root(&self) -> Result<PathBuf, SessionError> {
        if cfg!(windows) {
            let value = query_registry("SteamPath")?.ok_or(SessionError::NotInstalled)?;
            return Ok(PathBuf::from(value));
        }
        let home = self.home.as_deref().ok_or(SessionError::NoHome)?;
        install_candidates(home)
            .into_iter()
            .find(|dir| dir.is_dir())
            .map(|dir| dir.canonicalize().unwrap_or(dir))
            .ok_or(SessionError::NotInstalled)
    }

    /// App id of the running title. Steam reports `0` when nothing runs.
    pub fn running_app_id(&self) -> Result<u32, SessionError> {
        let raw = if cfg!(windows) {
            query_registry("RunningAppID")?
        } else {
            let home = self.home.as_deref().ok_or(SessionError::NoHome)?;
            let registry = registry_candidates(home)
                .into_iter()
                .find(|file| file.is_file())
                .ok_or(SessionError::NotInstalled)?;
            let text = std::fs::read_to_string(&registry)
                .map_err(|e| SessionError::Read(format!("{}: {}", registry.display(), e)))?;
            vdf_value(&text, "RunningAppID")
        };

        match raw.as_deref().map(parse_app_id) {
            Some(Some(0)) | None => Err(SessionError::NoActiveWorkload),
            Some(Some(id)) => Ok(id),
            Some(None) => Err(SessionError::Read(format!("unparseable RunningAppID {:?}", raw))),
        }
    }
}

fn install_candidates(home: &Path) -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        return vec![home.join("Library/Application Support/Steam")];
    }
    vec![
        home.join(".steam/steam"),
        home.join(".steam/root"),
        home.join(".local/share/Steam"),
        home.join(".var/app/com.valvesoftware.Steam/.local/share/Steam"),
    ]
}

fn registry_candidates(home: &Path) -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        return vec![home.join("Library/Application Support/Steam/registry.vdf")];
    }
    vec![
        home.join(".steam/registry.vdf"),
        home.join(".var/app/com.valvesoftware.Steam/.steam/registry.vdf"),
    ]
}

/// First `"key" "value"` pair in a VDF text file (keys are case-insensitive).
pub fn vdf_value(text: &str, key: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let mut quoted = line.split('"').skip(1).step_by(2);
        let name = quoted.next()?;
        let value = quoted.next()?;
        name.eq_ignore_ascii_case(key).then(|| value.to_string())
    })
}

/// Decimal (`"620"`) or registry hex (`0x26c`) app id.
fn parse_app_id(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Value of `name` in `reg query` output.
///
/// Lines look like `    SteamPath    REG_SZ    c:/program files (x86)/steam`.
pub fn reg_value(output: &str, name: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix(name)?;
        let rest = rest.trim_start();
        let (kind, value) = rest.split_once(char::is_whitespace)?;
        kind.starts_with("REG_").then(|| value.trim().to_string())
    })
}

fn query_registry(name: &str) -> Result<Option<String>, SessionError> {
    let output = std::process::Command::new("reg")
        .args(["query", r"HKCU\Software\Valve\Steam", "/v", name])
        .output()
        .map_err(|e| SessionError::Read(e.to_string()))?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(reg_value(&String::from_utf8_lossy(&output.stdout), name))
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
