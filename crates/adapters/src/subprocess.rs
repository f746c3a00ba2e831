// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised subprocess execution.
//!
//! Children run without a shell, in their own process group (Unix) or
//! without a console window (Windows). A timeout or cancellation kills the
//! whole process tree before returning.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long an opener or launcher may take to hand off before we stop waiting.
pub const HANDOFF_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors from subprocess operations
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("executable not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to start {}: {source}", .path.display())]
    Spawn { path: PathBuf, source: io::Error },

    #[error("process timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("cancelled before the process finished")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Resolve `path` to an existing executable file.
///
/// A bare program name (single component) is looked up on `PATH`.
pub fn resolve_executable(path: &Path) -> Result<PathBuf, SubprocessError> {
    let bare = !path.is_absolute() && path.components().count() == 1;
    if bare {
        return which::which(path).map_err(|_| SubprocessError::NotFound(path.to_path_buf()));
    }
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(SubprocessError::NotFound(path.to_path_buf()))
    }
}

/// Run a program to completion, capturing stdout and stderr.
///
/// Waiting for exit and draining both pipes share one deadline. If the
/// deadline passes or `cancel` fires first, the process tree is killed and
/// any partial output is discarded.
pub async fn run_with_timeout(
    executable: &Path,
    arguments: &[String],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<CommandOutput, SubprocessError> {
    let program = resolve_executable(executable)?;

    let mut cmd = Command::new(&program);
    cmd.args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    isolate(&mut cmd);

    let mut child =
        cmd.spawn().map_err(|source| SubprocessError::Spawn { path: program.clone(), source })?;
    // The child leads its own group; captured now because id() is gone once
    // the child is reaped, while the group can outlive it.
    let group = child.id();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let outcome = {
        let completion = collect(&mut child, stdout, stderr);
        tokio::select! {
            biased;
            result = completion => Outcome::Completed(result),
            _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
            _ = cancel.cancelled() => Outcome::Cancelled,
        }
    };

    match outcome {
        Outcome::Completed(result) => {
            let (status, stdout, stderr) = result?;
            Ok(CommandOutput { exit_code: exit_code(status), stdout, stderr })
        }
        Outcome::TimedOut => {
            warn!(program = %program.display(), ?timeout, "process timed out, killing tree");
            kill_tree(&mut child, group).await;
            Err(SubprocessError::TimedOut(timeout))
        }
        Outcome::Cancelled => {
            debug!(program = %program.display(), "request cancelled, killing tree");
            kill_tree(&mut child, group).await;
            Err(SubprocessError::Cancelled)
        }
    }
}

enum Outcome {
    Completed(io::Result<(ExitStatus, String, String)>),
    TimedOut,
    Cancelled,
}

async fn collect(
    child: &mut Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
) -> io::Result<(ExitStatus, String, String)> {
    // Drained concurrently: a child blocked on a full stderr pipe never
    // closes stdout.
    let (status, out, err) = tokio::join!(child.wait(), drain(stdout), drain(stderr));
    Ok((status?, out?, err?))
}

async fn drain<R: AsyncRead + Unpin>(stream: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Exit code, mapping signal deaths to `128 + signal` on Unix.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(-1)
}

/// Kill `child` and every process it spawned, then reap it.
///
/// `group` is the pid captured at spawn. The kernel does not hand that id
/// to a new process while any member of the group is alive, so it is safe
/// to signal even after the child itself has exited.
async fn kill_tree(child: &mut Child, group: Option<u32>) {
    let reaped = child.id().is_none();
    if let Some(pid) = group {
        kill_descendants(pid, reaped).await;
    }
    if let Err(e) = child.kill().await {
        debug!(error = %e, "child already gone");
    }
}

#[cfg(unix)]
async fn kill_descendants(pid: u32, reaped: bool) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    use crate::process_table::{terminate, ProcessTable};

    // A reaped child's pid may belong to an unrelated process by now, and
    // its orphans were reparented anyway; only the group kill applies.
    let descendants = if reaped {
        Vec::new()
    } else {
        tokio::task::spawn_blocking(move || {
            ProcessTable::snapshot().map(|table| table.descendants(pid)).unwrap_or_default()
        })
        .await
        .unwrap_or_default()
    };

    if let Ok(raw) = i32::try_from(pid) {
        if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            debug!(pid, error = %e, "killpg failed");
        }
    }
    // Descendants that left the process group.
    for descendant in descendants {
        if let Err(e) = terminate(descendant) {
            debug!(pid = descendant, error = %e, "descendant not killed");
        }
    }
}

#[cfg(windows)]
async fn kill_descendants(pid: u32, reaped: bool) {
    // taskkill /T walks the tree from a live parent only.
    if reaped {
        return;
    }
    let status = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = status {
        debug!(pid, error = %e, "taskkill failed");
    }
}

#[cfg(unix)]
fn isolate(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(windows)]
fn isolate(cmd: &mut Command) {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

/// Start a program without waiting for it or capturing its output.
///
/// Returns the pid. The child is reaped in the background; it runs in its
/// own process group so signals aimed at the agent do not reach it.
pub fn spawn_detached(executable: &Path, arguments: Option<&str>) -> Result<u32, SubprocessError> {
    let program = resolve_executable(executable)?;

    let mut cmd = Command::new(&program);
    if let Some(arguments) = arguments {
        apply_arguments(&mut cmd, arguments);
    }
    if let Some(dir) = program.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child =
        cmd.spawn().map_err(|source| SubprocessError::Spawn { path: program.clone(), source })?;
    let pid = child.id().unwrap_or_default();
    tokio::spawn(async move {
        let _ = child.wait().await;
    });
    Ok(pid)
}

/// Spawn an opener-style helper and wait briefly for its verdict.
///
/// A helper that exits nonzero within [`HANDOFF_TIMEOUT`] is a failure; one
/// that exits zero or is still running has handed off successfully.
pub async fn spawn_handoff(program: &str, args: &[&str]) -> Result<(), SubprocessError> {
    let path = resolve_executable(Path::new(program))?;
    let mut child = Command::new(&path)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| SubprocessError::Spawn { path: path.clone(), source })?;

    match tokio::time::timeout(HANDOFF_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(SubprocessError::Io(io::Error::other(format!(
            "{} exited with code {}",
            program,
            exit_code(status)
        )))),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => {
            tokio::spawn(async move {
                let _ = child.wait().await;
            });
            Ok(())
        }
    }
}

#[cfg(unix)]
fn apply_arguments(cmd: &mut Command, arguments: &str) {
    cmd.args(split_arguments(arguments));
}

#[cfg(windows)]
fn apply_arguments(cmd: &mut Command, arguments: &str) {
    cmd.raw_arg(arguments);
}

/// Split a command-line string into arguments.
///
/// Whitespace separates words; single and double quotes group. Inside double
/// quotes `\"` and `\\` are escapes; backslashes are otherwise literal so
/// Windows-style paths survive.
pub fn split_arguments(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => match chars.peek() {
                Some(&next @ ('"' | '\\')) => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push(c),
            },
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        args.push(current);
    }
    args
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
