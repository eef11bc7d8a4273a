// src/interrupt/mod.rs

//! Interrupt escalation for a supervised child.
//!
//! The first user interrupt (Ctrl-C / SIGINT) asks the child to stop; a
//! second one kills it. The pure state machine lives in [`escalation`]; the
//! global install/uninstall of the handler is in [`registry`].

pub mod escalation;
pub mod registry;

pub use escalation::{EscalationAction, EscalationState, InterruptEscalation, Notifier};
pub use registry::{InterruptGuard, active_target, install, kill_on_interrupt};
