// src/exec/console.rs

//! Windows console control handling for held children.
//!
//! Children are started in their own process group, so a Ctrl-C typed into
//! the console no longer reaches them. While a child is held by a
//! [`ProcessGuard`](crate::exec::ProcessGuard), a console control handler
//! forwards CTRL_BREAK to its group. The handler is installed when the first
//! child is registered and removed with the last one.

use std::sync::Mutex;

use tracing::{debug, warn};
use windows_sys::Win32::Foundation::{BOOL, FALSE, TRUE};
use windows_sys::Win32::System::Console::{
    CTRL_BREAK_EVENT, GenerateConsoleCtrlEvent, SetConsoleCtrlHandler,
};

/// Process groups (= child pids) currently held by a guard.
static HELD_GROUPS: Mutex<Vec<u32>> = Mutex::new(Vec::new());

unsafe extern "system" fn forward_ctrl_break(_ctrl_type: u32) -> BOOL {
    let groups = HELD_GROUPS.lock().unwrap_or_else(|p| p.into_inner());
    for pid in groups.iter() {
        // SAFETY: plain FFI call with integer arguments.
        unsafe {
            GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, *pid);
        }
    }
    // Let the next handler (ours or the default) run as well.
    FALSE
}

/// RAII registration of one child with the console control handler.
#[derive(Debug)]
pub(crate) struct ConsoleCtrlRegistration {
    pid: u32,
}

impl ConsoleCtrlRegistration {
    pub(crate) fn register(pid: u32) -> Self {
        let mut groups = HELD_GROUPS.lock().unwrap_or_else(|p| p.into_inner());
        if groups.is_empty() {
            // SAFETY: `forward_ctrl_break` has the PHANDLER_ROUTINE signature
            // and lives for the whole program.
            let ok = unsafe { SetConsoleCtrlHandler(Some(forward_ctrl_break), TRUE) };
            if ok == 0 {
                warn!(
                    pid,
                    error = %std::io::Error::last_os_error(),
                    "failed to install console control handler"
                );
            }
        }
        groups.push(pid);
        debug!(pid, "registered child with console control handler");
        Self { pid }
    }
}

impl Drop for ConsoleCtrlRegistration {
    fn drop(&mut self) {
        let mut groups = HELD_GROUPS.lock().unwrap_or_else(|p| p.into_inner());
        groups.retain(|pid| *pid != self.pid);
        if groups.is_empty() {
            // SAFETY: removes the handler added in `register`.
            unsafe {
                SetConsoleCtrlHandler(Some(forward_ctrl_break), FALSE);
            }
        }
        debug!(pid = self.pid, "removed child from console control handler");
    }
}
