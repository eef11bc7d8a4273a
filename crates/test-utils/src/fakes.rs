use std::io;
use std::sync::{Arc, Mutex};

use procguard::exec::{ProcessCommand, ProcessLauncher, native_launcher};
use tokio::process::Command;

/// What a [`RecordingLauncher`] was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivered {
    Terminate(u32),
    Kill(u32),
}

/// A launcher that records signals instead of sending them.
///
/// Spawning still goes through a real `Command`, so it can be used with a
/// `ProcessGuard` as well.
#[derive(Debug, Clone)]
pub struct RecordingLauncher {
    two_tier: bool,
    fail_with: Option<io::ErrorKind>,
    forward_kill: bool,
    delivered: Arc<Mutex<Vec<Delivered>>>,
}

impl RecordingLauncher {
    pub fn two_tier() -> Self {
        Self {
            two_tier: true,
            fail_with: None,
            forward_kill: false,
            delivered: Arc::default(),
        }
    }

    pub fn single_tier() -> Self {
        Self {
            two_tier: false,
            ..Self::two_tier()
        }
    }

    /// Make every signal delivery fail with `kind`.
    pub fn failing(mut self, kind: io::ErrorKind) -> Self {
        self.fail_with = Some(kind);
        self
    }

    /// Also deliver kills for real, through the native launcher.
    /// Terminations stay recorded only.
    pub fn forwarding_kill(mut self) -> Self {
        self.forward_kill = true;
        self
    }

    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().unwrap().clone()
    }

    fn record(&self, what: Delivered) -> io::Result<()> {
        self.delivered.lock().unwrap().push(what);
        match self.fail_with {
            Some(kind) => Err(io::Error::new(kind, "recording launcher told to fail")),
            None => Ok(()),
        }
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn command(&self, cmd: &ProcessCommand) -> Command {
        let mut c = Command::new(cmd.program());
        c.args(cmd.args());
        c
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        self.record(Delivered::Terminate(pid))
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        self.record(Delivered::Kill(pid))?;
        if self.forward_kill {
            native_launcher().kill(pid)?;
        }
        Ok(())
    }

    fn has_graceful_tier(&self) -> bool {
        self.two_tier
    }
}

/// Collects notifier messages.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    inner: Arc<Mutex<Vec<String>>>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier closure that appends to this collection.
    pub fn notifier(&self) -> impl Fn(&str) + Send + Sync + 'static {
        let inner = self.inner.clone();
        move |msg: &str| inner.lock().unwrap().push(msg.to_string())
    }

    pub fn all(&self) -> Vec<String> {
        self.inner.lock().unwrap().clone()
    }
}
