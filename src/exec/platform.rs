// src/exec/platform.rs

//! Platform-specific process launching and signalling.
//!
//! Everything that differs between operating systems sits behind
//! [`ProcessLauncher`]:
//!
//! - how a [`ProcessCommand`] becomes a native `tokio::process::Command`
//!   (argument vector on unix, one joined command line in a new process
//!   group on Windows)
//! - what "graceful" and "forceful" termination mean for a pid
//!
//! The rest of the crate only talks to the trait, so tests can substitute a
//! recording launcher the same way they substitute any other backend.

use std::fmt::Debug;
use std::io;
use std::sync::Arc;

use tokio::process::Command;

use crate::exec::command::ProcessCommand;

/// Abstraction over how processes are created and signalled.
pub trait ProcessLauncher: Send + Sync + Debug {
    /// Build the native command for the given tokens. Stdio and environment
    /// are wired by the caller.
    fn command(&self, cmd: &ProcessCommand) -> Command;

    /// Ask the process to stop (SIGTERM, CTRL_BREAK).
    ///
    /// Returns an error of kind [`io::ErrorKind::NotFound`] if there is no
    /// such process.
    fn terminate(&self, pid: u32) -> io::Result<()>;

    /// Stop the process without giving it a chance to clean up.
    ///
    /// Same `NotFound` convention as [`terminate`](Self::terminate).
    fn kill(&self, pid: u32) -> io::Result<()>;

    /// Whether `terminate` and `kill` are distinguishable tiers.
    ///
    /// On platforms without a real graceful signal the interrupt handler
    /// never escalates past `terminate`.
    fn has_graceful_tier(&self) -> bool;
}

/// The launcher for the platform this crate was built for.
pub fn native_launcher() -> Arc<dyn ProcessLauncher> {
    #[cfg(unix)]
    {
        Arc::new(UnixLauncher)
    }
    #[cfg(windows)]
    {
        Arc::new(WindowsLauncher)
    }
}

pub(crate) fn no_such_process(pid: u32) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such process: {pid}"))
}

#[cfg(unix)]
pub use unix::UnixLauncher;

#[cfg(windows)]
pub use windows::WindowsLauncher;

#[cfg(unix)]
mod unix {
    use std::io;

    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    use tokio::process::Command;

    use super::{ProcessLauncher, no_such_process};
    use crate::exec::command::ProcessCommand;

    /// POSIX launcher: argv-style exec, SIGTERM then SIGKILL.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UnixLauncher;

    impl UnixLauncher {
        fn send(&self, pid: u32, sig: Signal) -> io::Result<()> {
            // pid 0 (or anything that wraps negative) would address a whole
            // process group.
            let raw = i32::try_from(pid)
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("invalid pid {pid}"))
                })?;

            match signal::kill(Pid::from_raw(raw), sig) {
                Ok(()) => Ok(()),
                Err(Errno::ESRCH) => Err(no_such_process(pid)),
                Err(errno) => Err(io::Error::from(errno)),
            }
        }
    }

    impl ProcessLauncher for UnixLauncher {
        fn command(&self, cmd: &ProcessCommand) -> Command {
            let mut c = Command::new(cmd.program());
            c.args(cmd.args());
            c
        }

        fn terminate(&self, pid: u32) -> io::Result<()> {
            self.send(pid, Signal::SIGTERM)
        }

        fn kill(&self, pid: u32) -> io::Result<()> {
            self.send(pid, Signal::SIGKILL)
        }

        fn has_graceful_tier(&self) -> bool {
            true
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::io;
    use std::process::Stdio;

    use tokio::process::Command;
    use windows_sys::Win32::System::Console::{CTRL_BREAK_EVENT, GenerateConsoleCtrlEvent};
    use windows_sys::Win32::System::Threading::CREATE_NEW_PROCESS_GROUP;

    use super::{ProcessLauncher, no_such_process};
    use crate::exec::command::ProcessCommand;

    const ERROR_INVALID_PARAMETER: i32 = 87;
    const TASKKILL_NOT_FOUND: i32 = 128;

    /// Windows launcher.
    ///
    /// Process creation takes one command line, so tokens are joined with
    /// spaces and run through `cmd /C`. Each child gets its own process
    /// group so that CTRL_BREAK can be addressed to it alone.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WindowsLauncher;

    impl ProcessLauncher for WindowsLauncher {
        fn command(&self, cmd: &ProcessCommand) -> Command {
            let mut c = Command::new("cmd");
            c.raw_arg("/C").raw_arg(cmd.joined());
            c.creation_flags(CREATE_NEW_PROCESS_GROUP);
            c
        }

        fn terminate(&self, pid: u32) -> io::Result<()> {
            // SAFETY: plain FFI call with integer arguments.
            let ok = unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid) };
            if ok != 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(ERROR_INVALID_PARAMETER) {
                Err(no_such_process(pid))
            } else {
                Err(err)
            }
        }

        fn kill(&self, pid: u32) -> io::Result<()> {
            let status = std::process::Command::new("taskkill")
                .args(["/F", "/T", "/PID", &pid.to_string()])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()?;

            match status.code() {
                Some(0) => Ok(()),
                Some(TASKKILL_NOT_FOUND) => Err(no_such_process(pid)),
                _ => Err(io::Error::other(format!(
                    "taskkill for pid {pid} exited with {status}"
                ))),
            }
        }

        fn has_graceful_tier(&self) -> bool {
            false
        }
    }
}
