// src/interrupt/registry.rs

//! Process-wide interrupt disposition.
//!
//! Interrupt handling is global state: there is at most one installed
//! escalation handler per process. Installing a new one replaces (and stops)
//! the previous one. Each install returns an [`InterruptGuard`]; dropping it
//! uninstalls its handler, unless that handler has already been replaced.
//!
//! While a handler is installed, SIGINT no longer terminates this process.
//! When the last handler is uninstalled, the SIGINT disposition found before
//! the first install is put back (on Windows, the default console handler
//! runs again once no listener is left).
//!
//! Install once per top-level supervised run, not per nested call.

use std::io;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::interrupt::escalation::InterruptEscalation;

struct ActiveHandler {
    id: u64,
    pid: u32,
    process_name: String,
    task: JoinHandle<()>,
}

static ACTIVE: Mutex<Option<ActiveHandler>> = Mutex::new(None);
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn active() -> MutexGuard<'static, Option<ActiveHandler>> {
    ACTIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps an installed interrupt handler alive.
#[must_use = "dropping the guard uninstalls the interrupt handler"]
#[derive(Debug)]
pub struct InterruptGuard {
    id: u64,
    pid: u32,
}

impl InterruptGuard {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether this guard's handler is still the installed one.
    pub fn is_active(&self) -> bool {
        active().as_ref().is_some_and(|a| a.id == self.id)
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        let mut slot = active();
        if slot.as_ref().is_some_and(|a| a.id == self.id) {
            if let Some(handler) = slot.take() {
                handler.task.abort();
                if let Err(err) = Interrupts::restore() {
                    warn!(error = %err, "failed to restore interrupt disposition");
                }
                debug!(pid = handler.pid, "interrupt handler uninstalled");
            }
        } else {
            debug!(pid = self.pid, "interrupt handler was already replaced");
        }
    }
}

/// On interrupt, stop `pid`; on a further interrupt, kill it.
///
/// `notify` receives "Stopping <name>..." / "Killing <name>..." messages.
/// Must be called from within a Tokio runtime. Interrupts are captured until
/// the returned guard (or the handler replacing it) is dropped.
pub fn kill_on_interrupt(
    pid: u32,
    process_name: impl Into<String>,
    notify: impl Fn(&str) + Send + Sync + 'static,
) -> Result<InterruptGuard> {
    install(InterruptEscalation::new(pid, process_name, notify))
}

/// Install `escalation` as the process-wide interrupt handler, replacing any
/// handler installed before.
///
/// The interrupt listener is registered before this returns, so an interrupt
/// arriving right after is not lost.
pub fn install(escalation: InterruptEscalation) -> Result<InterruptGuard> {
    let mut slot = active();
    let mut interrupts = Interrupts::listen(slot.is_none())?;

    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let pid = escalation.pid();
    let process_name = escalation.process_name().to_string();

    let task = tokio::spawn(async move {
        let mut escalation = escalation;
        while interrupts.recv().await {
            debug!(pid = escalation.pid(), state = ?escalation.state(), "interrupt received");
            if let Err(err) = escalation.handle_interrupt() {
                warn!(error = %err, "failed to forward interrupt");
            }
        }
    });

    let previous = slot.replace(ActiveHandler {
        id,
        pid,
        process_name: process_name.clone(),
        task,
    });

    if let Some(prev) = previous {
        info!(
            previous_pid = prev.pid,
            previous_name = %prev.process_name,
            pid,
            "replacing installed interrupt handler"
        );
        prev.task.abort();
    }

    debug!(pid, name = %process_name, "interrupt handler installed");
    Ok(InterruptGuard { id, pid })
}

/// The (pid, process name) the installed handler is guarding, if any.
pub fn active_target() -> Option<(u32, String)> {
    active()
        .as_ref()
        .map(|a| (a.pid, a.process_name.clone()))
}

/// Stream of interrupt notifications from the OS.
#[cfg(unix)]
struct Interrupts(tokio::signal::unix::Signal);

#[cfg(unix)]
impl Interrupts {
    /// `fresh`: no handler is currently installed.
    fn listen(fresh: bool) -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        if fresh {
            disposition::save_prior()?;
        }
        let stream = signal(SignalKind::interrupt())?;
        disposition::claim()?;
        Ok(Self(stream))
    }

    fn restore() -> io::Result<()> {
        disposition::restore_prior()
    }

    async fn recv(&mut self) -> bool {
        self.0.recv().await.is_some()
    }
}

#[cfg(windows)]
struct Interrupts(tokio::signal::windows::CtrlC);

#[cfg(windows)]
impl Interrupts {
    fn listen(_fresh: bool) -> io::Result<Self> {
        Ok(Self(tokio::signal::windows::ctrl_c()?))
    }

    // tokio's console handler passes events on once no listener is left.
    fn restore() -> io::Result<()> {
        Ok(())
    }

    async fn recv(&mut self) -> bool {
        self.0.recv().await.is_some()
    }
}

/// SIGINT disposition bookkeeping.
///
/// tokio registers its SIGINT handler once per process and never removes it.
/// The disposition in effect before the first install is saved and put back
/// on the last uninstall; tokio's handler is put back on the next install.
#[cfg(unix)]
mod disposition {
    use std::io;
    use std::mem::MaybeUninit;
    use std::ptr;
    use std::sync::{Mutex, MutexGuard};

    use nix::libc;

    #[derive(Clone, Copy)]
    struct Disposition(libc::sigaction);

    impl Disposition {
        fn current() -> io::Result<Self> {
            let mut old = MaybeUninit::<libc::sigaction>::zeroed();
            // SAFETY: a null new action only reads the current one into `old`.
            let rc = unsafe { libc::sigaction(libc::SIGINT, ptr::null(), old.as_mut_ptr()) };
            if rc != 0 {
                return Err(io::Error::last_os_error());
            }
            // SAFETY: filled in by the successful call above.
            Ok(Self(unsafe { old.assume_init() }))
        }

        fn apply(self) -> io::Result<()> {
            // SAFETY: `self.0` was read back from the kernel by `current`.
            let rc = unsafe { libc::sigaction(libc::SIGINT, &self.0, ptr::null_mut()) };
            if rc != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }

    struct Saved {
        /// In effect before the first active handler.
        prior: Option<Disposition>,
        /// tokio's handler, once seen.
        listener: Option<Disposition>,
    }

    static SAVED: Mutex<Saved> = Mutex::new(Saved {
        prior: None,
        listener: None,
    });

    fn saved() -> MutexGuard<'static, Saved> {
        SAVED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(super) fn save_prior() -> io::Result<()> {
        saved().prior = Some(Disposition::current()?);
        Ok(())
    }

    /// Make tokio's handler the one in effect.
    pub(super) fn claim() -> io::Result<()> {
        let mut saved = saved();
        match saved.listener {
            Some(listener) => listener.apply(),
            None => {
                saved.listener = Some(Disposition::current()?);
                Ok(())
            }
        }
    }

    pub(super) fn restore_prior() -> io::Result<()> {
        match saved().prior.take() {
            Some(prior) => prior.apply(),
            None => Ok(()),
        }
    }
}
