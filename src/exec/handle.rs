// src/exec/handle.rs

use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::process::{Child, ChildStderr, ChildStdout};
use tracing::debug;

use crate::exec::command::ProcessCommand;
use crate::exec::platform::{ProcessLauncher, no_such_process};

/// Handle to a spawned child process.
///
/// Handles are created by [`ProcessGuard`](crate::exec::ProcessGuard), which
/// keeps ownership for the whole lifetime of the child; everything else works
/// on a borrowed `&ProcessHandle` / `&mut ProcessHandle`.
pub struct ProcessHandle {
    child: Child,
    pid: u32,
    command: ProcessCommand,
    launcher: Arc<dyn ProcessLauncher>,
    status: Option<ExitStatus>,
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("command", &self.command)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    pub(crate) fn new(
        child: Child,
        pid: u32,
        command: ProcessCommand,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            child,
            pid,
            command,
            launcher,
            status: None,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn command(&self) -> &ProcessCommand {
        &self.command
    }

    /// Take the readable end of the child's stdout, if it was piped and has
    /// not been taken yet.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the readable end of the child's stderr, if it was piped and has
    /// not been taken yet.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    pub fn has_stdout(&self) -> bool {
        self.child.stdout.is_some()
    }

    pub fn has_stderr(&self) -> bool {
        self.child.stderr.is_some()
    }

    /// Exit status, if the child has already been reaped through this handle.
    pub fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Non-blocking exit check.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        if self.status.is_none() {
            self.status = self.child.try_wait()?;
        }
        Ok(self.status)
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }

    /// Wait for the child to exit. The status is cached, so calling this
    /// again after exit returns immediately.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        let status = self.child.wait().await?;
        debug!(pid = self.pid, %status, "child process exited");
        self.status = Some(status);
        Ok(status)
    }

    /// Send the platform's graceful termination signal.
    ///
    /// Fails with [`io::ErrorKind::NotFound`] once the child has exited; the
    /// pid is never signalled after it has been reaped.
    pub fn terminate(&mut self) -> io::Result<()> {
        if self.try_wait()?.is_some() {
            return Err(no_such_process(self.pid));
        }
        self.launcher.terminate(self.pid)
    }

    /// Force the child to stop, through the same launcher path as interrupt
    /// escalation (on Windows this takes down the whole `cmd /C` tree).
    pub fn kill(&mut self) -> io::Result<()> {
        if self.try_wait()?.is_some() {
            return Err(no_such_process(self.pid));
        }
        self.launcher.kill(self.pid)
    }

    /// Release the pipe ends still held by this handle.
    pub fn close_pipes(&mut self) {
        let had_pipes = self.child.stdin.is_some()
            || self.child.stdout.is_some()
            || self.child.stderr.is_some();

        drop(self.child.stdin.take());
        drop(self.child.stdout.take());
        drop(self.child.stderr.take());

        if had_pipes {
            debug!(pid = self.pid, "closed child pipes");
        }
    }
}
