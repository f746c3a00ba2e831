// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Who may connect to the agent's endpoint.
//!
//! The policy is applied around bind so no connection is accepted before
//! the endpoint is restricted.

use std::path::Path;

use courier_wire::Endpoint;

use super::ListenError;

/// Platform access-control policy for the local endpoint
pub trait AccessPolicy: Send + Sync {
    /// Runs before bind.
    fn prepare(&self, endpoint: &Endpoint) -> Result<(), ListenError>;

    /// Runs after bind and before the first accept.
    fn secure(&self, path: &Path) -> Result<(), ListenError>;

    /// Short description for the startup log.
    fn describe(&self) -> &'static str;

    /// Security applied to every pipe instance, including the first.
    #[cfg(windows)]
    fn pipe_security(&self) -> super::pipe_security::PipeSecurity;
}

/// Policy for the current platform.
pub fn platform_policy() -> Result<Box<dyn AccessPolicy>, ListenError> {
    #[cfg(unix)]
    {
        Ok(Box::new(OwnerOnly))
    }
    #[cfg(windows)]
    {
        let user = current_user_sid().map_err(ListenError::SessionUser)?;
        Ok(Box::new(SessionPipe::new(&crate::env::service_sid(), &user)))
    }
}

/// Socket inside a 0700 directory, socket itself 0600.
///
/// Only the owning user and root (which bypasses file modes) can connect.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

#[cfg(unix)]
impl AccessPolicy for OwnerOnly {
    fn prepare(&self, endpoint: &Endpoint) -> Result<(), ListenError> {
        use std::os::unix::fs::{DirBuilderExt, MetadataExt};

        let dir = endpoint.dir();
        if let Some(root) = dir.parent() {
            std::fs::create_dir_all(root).map_err(|e| ListenError::Prepare(dir.clone(), e))?;
        }
        match std::fs::DirBuilder::new().mode(0o700).create(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(ListenError::Prepare(dir, e)),
        }

        // A directory left by another user could be swapped or watched.
        let meta = std::fs::symlink_metadata(&dir).map_err(|e| ListenError::Prepare(dir.clone(), e))?;
        let uid = nix::unistd::getuid().as_raw();
        if !meta.is_dir() || meta.uid() != uid || meta.mode() & 0o077 != 0 {
            return Err(ListenError::Insecure(dir));
        }

        let socket = endpoint.socket_path();
        match std::fs::remove_file(&socket) {
            Ok(()) => tracing::debug!(path = %socket.display(), "removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ListenError::Prepare(socket, e)),
        }
        Ok(())
    }

    fn secure(&self, path: &Path) -> Result<(), ListenError> {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| ListenError::Prepare(path.to_path_buf(), e))
    }

    fn describe(&self) -> &'static str {
        "owner-only unix socket (0700 dir, 0600 socket; root bypasses)"
    }
}

/// DACL granting full access to the service account and the session user,
/// with inherited entries blocked. Nobody else is listed, so nobody else
/// can open the pipe.
pub fn session_pipe_sddl(service_sid: &str, user_sid: &str) -> String {
    format!("D:P(A;;GA;;;{})(A;;GA;;;{})", service_sid, user_sid)
}

/// SID column of `whoami /user /fo csv /nh` output.
pub fn parse_whoami_sid(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let sid = line.rsplit(',').next()?.trim().trim_matches('"');
        sid.starts_with("S-1-").then(|| sid.to_string())
    })
}

#[cfg(windows)]
fn current_user_sid() -> std::io::Result<String> {
    let output = std::process::Command::new("whoami").args(["/user", "/fo", "csv", "/nh"]).output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_whoami_sid(&stdout)
        .ok_or_else(|| std::io::Error::other(format!("unexpected whoami output: {:?}", stdout.trim())))
}

/// First-instance pipe, remote clients rejected, and a DACL naming only the
/// service account and the session user.
#[cfg(windows)]
#[derive(Debug, Clone)]
pub struct SessionPipe {
    security: super::pipe_security::PipeSecurity,
}

#[cfg(windows)]
impl SessionPipe {
    pub fn new(service_sid: &str, user_sid: &str) -> Self {
        let sddl = session_pipe_sddl(service_sid, user_sid);
        tracing::debug!(%sddl, "pipe security descriptor");
        Self { security: super::pipe_security::PipeSecurity::new(&sddl) }
    }
}

#[cfg(windows)]
impl AccessPolicy for SessionPipe {
    fn prepare(&self, _endpoint: &Endpoint) -> Result<(), ListenError> {
        Ok(())
    }

    fn secure(&self, _path: &Path) -> Result<(), ListenError> {
        // The descriptor is applied when each instance is created.
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "first-instance named pipe, remote clients rejected, service account and session user only"
    }

    fn pipe_security(&self) -> super::pipe_security::PipeSecurity {
        self.security.clone()
    }
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
