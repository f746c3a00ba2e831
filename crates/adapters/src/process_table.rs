// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time view of the OS process table.
//!
//! Used to find a child's descendants when killing a tree, and to sweep
//! every process whose executable lives under a directory.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Why a single process could not be terminated.
#[derive(Debug, Error)]
pub enum TerminateError {
    #[error("access denied")]
    AccessDenied,
    #[error("already exited")]
    AlreadyExited,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent: Option<u32>,
    /// Absent when the process belongs to another user or is a kernel thread.
    pub executable: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    entries: Vec<ProcessEntry>,
}

/// Outcome of a directory sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub terminated: Vec<u32>,
    pub skipped: Vec<(u32, String)>,
}

impl ProcessTable {
    pub fn from_entries(entries: Vec<ProcessEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ProcessEntry] {
        &self.entries
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.entries.iter().any(|e| e.pid == pid)
    }

    /// All transitive children of `root` (excluding `root`), parents first.
    pub fn descendants(&self, root: u32) -> Vec<u32> {
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for entry in &self.entries {
            if let Some(parent) = entry.parent {
                children.entry(parent).or_default().push(entry.pid);
            }
        }

        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        let mut found = Vec::new();
        while let Some(pid) = queue.pop_front() {
            for &child in children.get(&pid).into_iter().flatten() {
                if seen.insert(child) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }
        found
    }

    /// Processes whose executable lies under `dir`.
    pub fn under_directory<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = &'a ProcessEntry> {
        self.entries
            .iter()
            .filter(move |e| e.executable.as_deref().is_some_and(|exe| is_under(exe, dir)))
    }

    /// Kill every process under `dir` except `exclude`, using `kill` for the
    /// actual termination. Per-process failures are recorded, never fatal.
    pub fn sweep<F>(&self, dir: &Path, exclude: u32, mut kill: F) -> SweepReport
    where
        F: FnMut(u32) -> Result<(), TerminateError>,
    {
        let mut report = SweepReport::default();
        for entry in self.under_directory(dir).filter(|e| e.pid != exclude) {
            match kill(entry.pid) {
                Ok(()) => report.terminated.push(entry.pid),
                Err(e) => {
                    debug!(pid = entry.pid, error = %e, "skipping process");
                    report.skipped.push((entry.pid, e.to_string()));
                }
            }
        }
        report
    }
}

/// Component-wise prefix test; case-insensitive on Windows.
pub fn is_under(path: &Path, dir: &Path) -> bool {
    if cfg!(windows) {
        let path = path.to_string_lossy().to_lowercase().replace('/', "\\");
        let dir = dir.to_string_lossy().to_lowercase().replace('/', "\\");
        Path::new(&path).starts_with(Path::new(&dir))
    } else {
        path.starts_with(dir)
    }
}

/// Kill every process whose executable lives under `dir`.
///
/// A missing directory, or one matching nothing, is an empty sweep.
pub fn terminate_under(dir: &Path) -> io::Result<SweepReport> {
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let table = ProcessTable::snapshot()?;
    Ok(table.sweep(&dir, std::process::id(), terminate))
}

#[cfg(unix)]
mod platform {
    use super::*;
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    /// SIGKILL a single process.
    pub fn terminate(pid: u32) -> Result<(), TerminateError> {
        let raw = i32::try_from(pid).map_err(|_| TerminateError::Other("pid out of range".into()))?;
        match kill(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(TerminateError::AlreadyExited),
            Err(Errno::EPERM) => Err(TerminateError::AccessDenied),
            Err(e) => Err(TerminateError::Other(e.to_string())),
        }
    }

    /// True if `pid` exists and is not a zombie.
    #[cfg(target_os = "linux")]
    pub fn is_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => parse_stat(&stat).is_some_and(|(state, _)| !matches!(state, 'Z' | 'X')),
            Err(_) => false,
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub fn is_running(pid: u32) -> bool {
        i32::try_from(pid).is_ok_and(|raw| kill(Pid::from_raw(raw), None).is_ok())
    }

    #[cfg(target_os = "linux")]
    impl ProcessTable {
        /// Read `/proc`. Entries that vanish mid-scan are skipped.
        pub fn snapshot() -> io::Result<Self> {
            let mut entries = Vec::new();
            for dirent in std::fs::read_dir("/proc")? {
                let Ok(dirent) = dirent else { continue };
                let Some(pid) = dirent.file_name().to_str().and_then(|n| n.parse::<u32>().ok())
                else {
                    continue;
                };
                let Ok(stat) = std::fs::read_to_string(dirent.path().join("stat")) else {
                    continue;
                };
                let parent = parse_stat(&stat).map(|(_, ppid)| ppid).filter(|&ppid| ppid != 0);
                let executable = std::fs::read_link(dirent.path().join("exe"))
                    .ok()
                    .map(strip_deleted);
                entries.push(ProcessEntry { pid, parent, executable });
            }
            Ok(Self { entries })
        }
    }

    #[cfg(not(target_os = "linux"))]
    impl ProcessTable {
        /// Ask `ps` for pid, parent and full command path.
        pub fn snapshot() -> io::Result<Self> {
            let output =
                std::process::Command::new("ps").args(["-axo", "pid=,ppid=,comm="]).output()?;
            if !output.status.success() {
                return Err(io::Error::other("ps failed"));
            }
            Ok(Self::from_entries(parse_ps(&String::from_utf8_lossy(&output.stdout))))
        }
    }

    /// `(state, ppid)` from a `/proc/<pid>/stat` line. The command name may
    /// contain spaces and parentheses, so fields are read after the last `)`.
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    pub fn parse_stat(stat: &str) -> Option<(char, u32)> {
        let rest = &stat[stat.rfind(')')? + 1..];
        let mut fields = rest.split_whitespace();
        let state = fields.next()?.chars().next()?;
        let ppid = fields.next()?.parse().ok()?;
        Some((state, ppid))
    }

    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    fn strip_deleted(exe: PathBuf) -> PathBuf {
        match exe.to_str().and_then(|s| s.strip_suffix(" (deleted)")) {
            Some(stripped) => PathBuf::from(stripped),
            None => exe,
        }
    }
}

#[cfg(windows)]
mod platform {
    use super::*;

    const PROCESS_QUERY: &str = "Get-CimInstance Win32_Process | ForEach-Object { \
        \"$($_.ProcessId) $($_.ParentProcessId) $($_.ExecutablePath)\" }";

    pub fn terminate(pid: u32) -> Result<(), TerminateError> {
        let output = std::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/F"])
            .output()
            .map_err(|e| TerminateError::Other(e.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        if stderr.contains("access is denied") {
            Err(TerminateError::AccessDenied)
        } else if stderr.contains("not found") {
            Err(TerminateError::AlreadyExited)
        } else {
            Err(TerminateError::Other(stderr.trim().to_string()))
        }
    }

    pub fn is_running(pid: u32) -> bool {
        ProcessTable::snapshot().is_ok_and(|table| table.contains(pid))
    }

    impl ProcessTable {
        pub fn snapshot() -> io::Result<Self> {
            let output = std::process::Command::new("powershell")
                .args(["-NoProfile", "-NonInteractive", "-Command", PROCESS_QUERY])
                .output()?;
            if !output.status.success() {
                return Err(io::Error::other("process query failed"));
            }
            Ok(Self::from_entries(parse_ps(&String::from_utf8_lossy(&output.stdout))))
        }
    }
}

pub use platform::{is_running, terminate};

/// Parse `pid ppid [path]` lines as produced by `ps -o pid=,ppid=,comm=`.
pub fn parse_ps(output: &str) -> Vec<ProcessEntry> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (pid, rest) = line.split_once(char::is_whitespace)?;
            let rest = rest.trim_start();
            let (ppid, path) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let path = path.trim();
            Some(ProcessEntry {
                pid: pid.parse().ok()?,
                parent: ppid.parse().ok().filter(|&p| p != 0),
                executable: (!path.is_empty() && Path::new(path).is_absolute())
                    .then(|| PathBuf::from(path)),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "process_table_tests.rs"]
mod tests;
