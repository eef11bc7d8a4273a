// src/exec/guard.rs

//! Scoped ownership of a child process.
//!
//! A [`ProcessGuard`] is the only owner of a [`ProcessHandle`]. However the
//! scope holding it ends, the same release path runs:
//!
//! 1. graceful termination of the child, unless it has already exited
//!    ("no such process" is not an error here);
//! 2. closing the pipes and reaping the child, force-killing it if it is
//!    still alive after the grace period.
//!
//! Step 2 always runs on its own Tokio task. Awaiting [`ProcessGuard::release`]
//! only observes that task, so cancelling the caller mid-release cannot leave
//! the child half cleaned up. Dropping the guard without calling `release`
//! (early `?` return, panic, the owning future being dropped) performs step 1
//! inline and hands step 2 to a detached task.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{ProcguardError, Result};
use crate::exec::command::{CommandSpec, ProcessCommand};
use crate::exec::handle::ProcessHandle;
use crate::exec::options::SpawnOptions;
use crate::exec::platform::{ProcessLauncher, native_launcher};

#[cfg(windows)]
use crate::exec::console::ConsoleCtrlRegistration;

/// Everything that has to be released together.
struct Held {
    handle: ProcessHandle,
    #[cfg(windows)]
    _console: ConsoleCtrlRegistration,
}

/// Owns a spawned child and guarantees its termination and cleanup.
pub struct ProcessGuard {
    /// `Some` from `acquire` until `release` or `drop`.
    held: Option<Held>,
    grace_period: Duration,
}

impl std::fmt::Debug for ProcessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessGuard")
            .field("handle", &self.held.as_ref().map(|h| &h.handle))
            .field("grace_period", &self.grace_period)
            .finish()
    }
}

impl ProcessGuard {
    /// Validate `command` and spawn it with the platform's native launcher.
    ///
    /// Fails with [`ProcguardError::InvalidArgument`] before anything is
    /// spawned if `command` is not a non-empty token list.
    pub fn acquire(command: impl Into<CommandSpec>, options: &SpawnOptions) -> Result<Self> {
        Self::acquire_with(native_launcher(), command, options)
    }

    /// Like [`acquire`](Self::acquire), with an explicit launcher.
    pub fn acquire_with(
        launcher: Arc<dyn ProcessLauncher>,
        command: impl Into<CommandSpec>,
        options: &SpawnOptions,
    ) -> Result<Self> {
        let command = ProcessCommand::try_from(command.into())?;

        let mut cmd = launcher.command(&command);
        cmd.stdin(options.stdin.to_stdio())
            .stdout(options.stdout.to_stdio())
            .stderr(options.stderr.to_stdio())
            .envs(&options.env);
        if let Some(dir) = &options.cwd {
            cmd.current_dir(dir);
        }

        info!(cmd = %command, "starting child process");

        let spawn_failed = |source: io::Error| ProcguardError::SpawnFailed {
            program: command.program().to_string(),
            source,
        };

        let child = cmd.spawn().map_err(spawn_failed)?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_failed(io::Error::other("child exited before its pid was read")))?;

        debug!(pid, cmd = %command, "child process spawned");

        let held = Held {
            #[cfg(windows)]
            _console: ConsoleCtrlRegistration::register(pid),
            handle: ProcessHandle::new(child, pid, command, launcher),
        };

        Ok(Self {
            held: Some(held),
            grace_period: options.grace_period,
        })
    }

    pub fn handle(&self) -> &ProcessHandle {
        &self.held().handle
    }

    pub fn handle_mut(&mut self) -> &mut ProcessHandle {
        &mut self.held_mut().handle
    }

    pub fn pid(&self) -> u32 {
        self.handle().pid()
    }

    /// Terminate the child if needed and release its resources.
    ///
    /// Returns the exit status if the child could be reaped. Failures along
    /// the way are logged, never returned: release must not mask whatever
    /// error the caller is already propagating.
    pub async fn release(mut self) -> Option<ExitStatus> {
        let mut held = self.held.take()?;
        let grace = self.grace_period;

        begin_release(&mut held.handle);

        match tokio::spawn(finish_release(held, grace)).await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "child release task did not complete");
                None
            }
        }
    }

    fn held(&self) -> &Held {
        self.held
            .as_ref()
            .expect("process guard holds its handle until released or dropped")
    }

    fn held_mut(&mut self) -> &mut Held {
        self.held
            .as_mut()
            .expect("process guard holds its handle until released or dropped")
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        let Some(mut held) = self.held.take() else {
            return;
        };
        let pid = held.handle.pid();

        begin_release(&mut held.handle);

        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                debug!(pid, "process guard dropped without release; releasing in background");
                rt.spawn(finish_release(held, self.grace_period));
            }
            Err(_) => {
                warn!(pid, "process guard dropped outside a Tokio runtime; killing child");
                if let Err(err) = held.handle.kill() {
                    if err.kind() != io::ErrorKind::NotFound {
                        warn!(pid, error = %err, "failed to kill child process");
                    }
                }
            }
        }
    }
}

/// Step 1: graceful termination + closing the pipes. Never blocks.
fn begin_release(handle: &mut ProcessHandle) {
    let pid = handle.pid();

    match handle.terminate() {
        Ok(()) => debug!(pid, "sent graceful termination to child"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(pid, "child already exited; nothing to terminate");
        }
        Err(err) => warn!(pid, error = %err, "failed to terminate child process"),
    }

    handle.close_pipes();
}

/// Step 2: reap the child, escalating to a kill after `grace`.
async fn finish_release(mut held: Held, grace: Duration) -> Option<ExitStatus> {
    let handle = &mut held.handle;
    let pid = handle.pid();

    let status = match tokio::time::timeout(grace, handle.wait()).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(err)) => {
            warn!(pid, error = %err, "waiting for child during release failed");
            None
        }
        Err(_) => {
            warn!(pid, ?grace, "child still running after grace period; killing");
            if let Err(err) = handle.kill() {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(pid, error = %err, "failed to kill child process");
                }
            }
            match handle.wait().await {
                Ok(status) => Some(status),
                Err(err) => {
                    warn!(pid, error = %err, "waiting for killed child failed");
                    None
                }
            }
        }
    };

    debug!(pid, ?status, "child process released");
    status
}
