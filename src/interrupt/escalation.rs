// src/interrupt/escalation.rs

//! Interrupt escalation state machine.
//!
//! [`EscalationState::on_interrupt`] is the pure transition function; it has
//! no signals, no Tokio and no processes, so it can be tested exhaustively.
//! [`InterruptEscalation`] applies the transitions to a real pid through a
//! [`ProcessLauncher`].

use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{ProcguardError, Result};
use crate::exec::platform::{ProcessLauncher, native_launcher};

/// Where the handler is in its escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscalationState {
    /// No interrupt seen yet.
    #[default]
    Normal,
    /// The graceful signal has been sent.
    Terminating,
}

/// What to do in response to one interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationAction {
    /// Send the graceful termination signal.
    Stop,
    /// Send the forceful termination signal.
    Kill,
}

impl EscalationState {
    /// Transition on one interrupt.
    ///
    /// With `two_tier = false` (no distinguishable graceful signal) every
    /// interrupt maps to `Stop`; there is nothing stronger to escalate to.
    pub fn on_interrupt(self, two_tier: bool) -> (EscalationState, EscalationAction) {
        match (self, two_tier) {
            (EscalationState::Normal, _) => (EscalationState::Terminating, EscalationAction::Stop),
            (EscalationState::Terminating, true) => {
                (EscalationState::Terminating, EscalationAction::Kill)
            }
            (EscalationState::Terminating, false) => {
                (EscalationState::Terminating, EscalationAction::Stop)
            }
        }
    }
}

/// Callback receiving human-readable progress ("Stopping worker...").
pub type Notifier = Arc<dyn Fn(&str) + Send + Sync>;

/// Escalating interrupt handler for one (pid, process name) pair.
pub struct InterruptEscalation {
    pid: u32,
    process_name: String,
    state: EscalationState,
    launcher: Arc<dyn ProcessLauncher>,
    notify: Notifier,
}

impl fmt::Debug for InterruptEscalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptEscalation")
            .field("pid", &self.pid)
            .field("process_name", &self.process_name)
            .field("state", &self.state)
            .field("launcher", &self.launcher)
            .finish_non_exhaustive()
    }
}

impl InterruptEscalation {
    pub fn new(
        pid: u32,
        process_name: impl Into<String>,
        notify: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        Self {
            pid,
            process_name: process_name.into(),
            state: EscalationState::Normal,
            launcher: native_launcher(),
            notify: Arc::new(notify),
        }
    }

    /// Signal through `launcher` instead of the native one.
    pub fn with_launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn state(&self) -> EscalationState {
        self.state
    }

    /// React to one interrupt: notify, signal the process, advance state.
    ///
    /// A process that no longer exists is not an error.
    pub fn handle_interrupt(&mut self) -> Result<EscalationAction> {
        let (next, action) = self
            .state
            .on_interrupt(self.launcher.has_graceful_tier());
        self.state = next;

        let sent = match action {
            EscalationAction::Stop => {
                (self.notify)(&format!("Stopping {}...", self.process_name));
                self.launcher.terminate(self.pid)
            }
            EscalationAction::Kill => {
                (self.notify)(&format!("Killing {}...", self.process_name));
                self.launcher.kill(self.pid)
            }
        };

        match sent {
            Ok(()) => {
                info!(pid = self.pid, name = %self.process_name, ?action, "interrupt forwarded to process");
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(pid = self.pid, ?action, "process already gone; nothing to signal");
            }
            Err(err) => {
                return Err(ProcguardError::SignalError(format!(
                    "{action:?} for '{}' (pid {}): {err}",
                    self.process_name, self.pid
                )));
            }
        }

        Ok(action)
    }
}
