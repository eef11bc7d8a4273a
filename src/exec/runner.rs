// src/exec/runner.rs

//! Running a command to completion under a [`ProcessGuard`].

use std::fmt;
use std::process::ExitStatus;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{ProcguardError, Result};
use crate::exec::command::{CommandSpec, ProcessCommand};
use crate::exec::guard::ProcessGuard;
use crate::exec::handle::ProcessHandle;
use crate::exec::options::SpawnOptions;
use crate::output::{Sink, consume_process_output};
use crate::types::StdioMode;

/// Whether and where to relay the child's output.
///
/// Any value other than `Disabled` pipes *both* channels; a `None` sink in
/// `Sinks` means that channel is read and discarded.
#[derive(Debug, Default)]
pub enum StreamOutput {
    /// stdout/stderr go to the null device; nothing is relayed.
    #[default]
    Disabled,
    /// Relay to the parent's own stdout/stderr.
    Parent,
    /// Relay to explicit sinks.
    Sinks {
        stdout: Option<Sink>,
        stderr: Option<Sink>,
    },
}

impl StreamOutput {
    pub fn to(stdout: Option<Sink>, stderr: Option<Sink>) -> Self {
        StreamOutput::Sinks { stdout, stderr }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, StreamOutput::Disabled)
    }

    fn into_sinks(self) -> Option<(Option<Sink>, Option<Sink>)> {
        match self {
            StreamOutput::Disabled => None,
            StreamOutput::Parent => Some((Some(Sink::stdout()), Some(Sink::stderr()))),
            StreamOutput::Sinks { stdout, stderr } => Some((stdout, stderr)),
        }
    }
}

impl From<bool> for StreamOutput {
    fn from(enabled: bool) -> Self {
        if enabled {
            StreamOutput::Parent
        } else {
            StreamOutput::Disabled
        }
    }
}

impl From<(Option<Sink>, Option<Sink>)> for StreamOutput {
    fn from((stdout, stderr): (Option<Sink>, Option<Sink>)) -> Self {
        StreamOutput::Sinks { stdout, stderr }
    }
}

/// Single-shot "the child has started" report.
///
/// Fired exactly once, right after the child is spawned and before any of
/// its output is relayed. The value sent is computed from the handle (the
/// pid unless a handler says otherwise). A dropped receiver is not an error.
pub struct TaskStatus {
    report: Box<dyn FnOnce(&ProcessHandle) + Send>,
}

impl fmt::Debug for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStatus").finish_non_exhaustive()
    }
}

impl TaskStatus {
    /// Report the child's pid on `tx`.
    pub fn new(tx: oneshot::Sender<u32>) -> Self {
        Self::with_handler(tx, ProcessHandle::pid)
    }

    /// Report `handler(process)` on `tx`.
    pub fn with_handler<T, F>(tx: oneshot::Sender<T>, handler: F) -> Self
    where
        T: Send + 'static,
        F: FnOnce(&ProcessHandle) -> T + Send + 'static,
    {
        Self {
            report: Box::new(move |process: &ProcessHandle| {
                let value = handler(process);
                if tx.send(value).is_err() {
                    debug!(pid = process.pid(), "task status receiver gone; start not observed");
                }
            }),
        }
    }

    /// A pid reporter together with its receiving end.
    pub fn channel() -> (Self, oneshot::Receiver<u32>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(tx), rx)
    }

    fn started(self, process: &ProcessHandle) {
        (self.report)(process);
    }
}

/// Outcome of [`run_process`].
///
/// Success or failure of the child is the caller's call; this only carries
/// what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    pub pid: u32,
    pub command: ProcessCommand,
    pub status: ExitStatus,
}

impl ProcessExit {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Signal that terminated the child, if any.
    #[cfg(unix)]
    pub fn signal(&self) -> Option<i32> {
        use std::os::unix::process::ExitStatusExt;
        self.status.signal()
    }

    /// Exit code in shell convention: the child's code, `128 + signal` if it
    /// was killed by a signal, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if let Some(code) = self.status.code() {
            return code;
        }
        #[cfg(unix)]
        if let Some(sig) = self.signal() {
            return 128 + sig;
        }
        1
    }
}

/// Run `command` to completion.
///
/// - `stream_output`: `true`/[`StreamOutput::Parent`] relays to our own
///   stdout/stderr, [`StreamOutput::Sinks`] to the given sinks,
///   `false`/[`StreamOutput::Disabled`] sends output to the null device.
/// - `task_status`: reported once the child exists, before any output.
///
/// The child is terminated and released however this future ends, including
/// when it is dropped before completion.
pub async fn run_process(
    command: impl Into<CommandSpec>,
    stream_output: impl Into<StreamOutput>,
    task_status: Option<TaskStatus>,
    options: &SpawnOptions,
) -> Result<ProcessExit> {
    let stream_output = stream_output.into();
    let mode = if stream_output.is_enabled() {
        StdioMode::Piped
    } else {
        StdioMode::Null
    };
    let options = options.clone().stdout(mode).stderr(mode);

    let mut guard = ProcessGuard::acquire(command, &options)?;
    let pid = guard.pid();
    let command = guard.handle().command().clone();

    let outcome = supervise(guard.handle_mut(), stream_output, task_status).await;
    guard.release().await;

    let status = outcome?;
    info!(pid, cmd = %command, %status, "process finished");

    Ok(ProcessExit {
        pid,
        command,
        status,
    })
}

async fn supervise(
    process: &mut ProcessHandle,
    stream_output: StreamOutput,
    task_status: Option<TaskStatus>,
) -> Result<ExitStatus> {
    if let Some(status) = task_status {
        status.started(process);
    }

    if let Some((stdout, stderr)) = stream_output.into_sinks() {
        consume_process_output(process, stdout, stderr).await?;
    }

    Ok(process.wait().await?)
}

/// Start `command` on its own Tokio task and return once the child exists.
///
/// Returns the child's pid and the task running it. If the run fails before
/// the child is spawned (invalid command, spawn failure), that error is
/// returned instead.
pub async fn start_process(
    command: impl Into<CommandSpec>,
    stream_output: impl Into<StreamOutput>,
    options: SpawnOptions,
) -> Result<(u32, JoinHandle<Result<ProcessExit>>)> {
    let command = command.into();
    let stream_output = stream_output.into();
    let (status, started) = TaskStatus::channel();

    let task = tokio::spawn(async move {
        run_process(command, stream_output, Some(status), &options).await
    });

    match started.await {
        Ok(pid) => Ok((pid, task)),
        Err(_) => match task.await {
            Ok(Err(err)) => Err(err),
            Ok(Ok(exit)) => Err(ProcguardError::Other(anyhow::anyhow!(
                "process {} finished without reporting its start",
                exit.pid
            ))),
            Err(join) => Err(ProcguardError::Other(join.into())),
        },
    }
}

/// Cancel a run started with [`start_process`] and wait for its task to end.
///
/// Dropping the run terminates the child through its guard's release path.
pub async fn cancel_process(task: JoinHandle<Result<ProcessExit>>) {
    task.abort();
    match task.await {
        Ok(Ok(exit)) => debug!(pid = exit.pid, "process finished before cancellation"),
        Ok(Err(err)) => debug!(error = %err, "process run failed before cancellation"),
        Err(join) if join.is_cancelled() => debug!("process run cancelled"),
        Err(join) => warn!(error = %join, "process run panicked"),
    }
}
