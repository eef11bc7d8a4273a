#![cfg(unix)]

mod common;
use crate::common::fakes::{Delivered, RecordingLauncher};
use crate::common::{init_tracing, with_timeout};

use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{Signal, raise};
use tokio::process::Command;
use tokio::sync::mpsc;

use procguard::interrupt::{InterruptEscalation, active_target, install, kill_on_interrupt};

fn channel_notifier() -> (
    impl Fn(&str) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<String>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let notify = move |msg: &str| {
        let _ = tx.send(msg.to_string());
    };
    (notify, rx)
}

// The registry is process-wide, so the whole in-process lifecycle is one test.
#[tokio::test]
async fn registry_lifecycle() {
    init_tracing();

    assert_eq!(active_target(), None);

    let first_launcher = RecordingLauncher::two_tier();
    let (first_notify, mut first_rx) = channel_notifier();
    let first = install(
        InterruptEscalation::new(4001, "first", first_notify)
            .with_launcher(Arc::new(first_launcher.clone())),
    )
    .unwrap();

    assert!(first.is_active());
    assert_eq!(first.pid(), 4001);
    assert_eq!(active_target(), Some((4001, "first".to_string())));

    // Installing again replaces the previous handler.
    let second_launcher = RecordingLauncher::two_tier();
    let (second_notify, mut second_rx) = channel_notifier();
    let second = install(
        InterruptEscalation::new(4002, "second", second_notify)
            .with_launcher(Arc::new(second_launcher.clone())),
    )
    .unwrap();

    assert!(!first.is_active());
    assert!(second.is_active());
    assert_eq!(active_target(), Some((4002, "second".to_string())));

    // A stale guard must not uninstall its replacement.
    drop(first);
    assert!(second.is_active());

    raise(Signal::SIGINT).unwrap();
    let msg = with_timeout(second_rx.recv()).await;
    assert_eq!(msg.as_deref(), Some("Stopping second..."));

    // Signals are coalesced, so only raise again once the first was handled.
    raise(Signal::SIGINT).unwrap();
    let msg = with_timeout(second_rx.recv()).await;
    assert_eq!(msg.as_deref(), Some("Killing second..."));

    assert_eq!(
        second_launcher.delivered(),
        [Delivered::Terminate(4002), Delivered::Kill(4002)]
    );
    assert!(first_launcher.delivered().is_empty());
    // The replaced handler's task is gone and its notifier with it.
    assert_eq!(with_timeout(first_rx.recv()).await, None);

    drop(second);
    assert_eq!(active_target(), None);

    // A later install captures interrupts again.
    let third_launcher = RecordingLauncher::two_tier();
    let (third_notify, mut third_rx) = channel_notifier();
    let third = install(
        InterruptEscalation::new(4003, "third", third_notify)
            .with_launcher(Arc::new(third_launcher.clone())),
    )
    .unwrap();

    raise(Signal::SIGINT).unwrap();
    let msg = with_timeout(third_rx.recv()).await;
    assert_eq!(msg.as_deref(), Some("Stopping third..."));
    assert_eq!(third_launcher.delivered(), [Delivered::Terminate(4003)]);

    drop(third);
    assert_eq!(active_target(), None);
}

const CHILD_MODE: &str = "PROCGUARD_INTERRUPT_CHILD_MODE";

// Runs only when re-executed by `interrupt_disposition_follows_the_guard`.
// "held": keeps the guard while SIGINT is raised. "released": drops it first.
#[tokio::test]
async fn interrupt_disposition_child() {
    let Some(mode) = std::env::var_os(CHILD_MODE) else {
        return;
    };

    let guard = kill_on_interrupt(999_999, "nobody", |_: &str| {}).unwrap();
    if mode == "released" {
        drop(guard);
        raise(Signal::SIGINT).unwrap();
    } else {
        raise(Signal::SIGINT).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(guard);
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    std::process::exit(0);
}

async fn run_child(mode: &str) -> std::process::ExitStatus {
    let exe = std::env::current_exe().unwrap();
    let status = Command::new(exe)
        .args(["interrupt_disposition_child", "--exact", "--nocapture"])
        .env(CHILD_MODE, mode)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    with_timeout(status).await.unwrap()
}

#[tokio::test]
async fn interrupt_disposition_follows_the_guard() {
    init_tracing();

    // Captured while installed.
    let status = run_child("held").await;
    assert_eq!(status.code(), Some(0), "{status:?}");

    // Default again once uninstalled: SIGINT terminates the process.
    let status = run_child("released").await;
    assert_eq!(status.signal(), Some(Signal::SIGINT as i32), "{status:?}");
}
