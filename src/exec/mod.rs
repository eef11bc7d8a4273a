// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for starting child processes with
//! `tokio::process::Command` and making sure they never outlive their owner.
//!
//! - [`command`] validates caller-supplied command token lists.
//! - [`options`] holds spawn-time settings (stdio wiring, cwd, env, grace).
//! - [`platform`] provides the `ProcessLauncher` trait and the native
//!   launcher for the current OS.
//! - [`handle`] is the borrowed view of a live child.
//! - [`guard`] owns a child and runs the release path on every exit.
//! - [`runner`] is the public "run this command" entry point.

pub mod command;
#[cfg(windows)]
mod console;
pub mod guard;
pub mod handle;
pub mod options;
pub mod platform;
pub mod runner;

pub use command::{CommandSpec, ProcessCommand};
pub use guard::ProcessGuard;
pub use handle::ProcessHandle;
pub use options::{DEFAULT_GRACE_PERIOD, SpawnOptions};
pub use platform::{ProcessLauncher, native_launcher};
pub use runner::{
    ProcessExit, StreamOutput, TaskStatus, cancel_process, run_process, start_process,
};
