#![cfg(unix)]

mod common;
use crate::common::buffer::{BrokenWriter, SharedBuffer};
use crate::common::builders::sh;
use crate::common::{init_tracing, with_timeout};

use procguard::errors::ProcguardError;
use procguard::exec::{ProcessGuard, SpawnOptions};
use procguard::output::{Sink, consume_process_output};
use procguard::types::{OutputChannel, StdioMode};

fn piped() -> SpawnOptions {
    SpawnOptions::new()
        .stdout(StdioMode::Piped)
        .stderr(StdioMode::Piped)
}

#[tokio::test]
async fn both_streams_are_drained_concurrently() {
    init_tracing();

    let mut guard = ProcessGuard::acquire(
        // Fills the stderr pipe before writing stdout; sequential draining
        // would deadlock.
        sh("head -c 200000 /dev/zero | tr '\\0' e >&2; echo done"),
        &piped(),
    )
    .unwrap();

    let out = SharedBuffer::new();
    let err = SharedBuffer::new();
    with_timeout(consume_process_output(
        guard.handle_mut(),
        Some(out.sink()),
        Some(err.async_sink()),
    ))
    .await
    .unwrap();

    assert_eq!(out.contents(), "done\n");
    assert_eq!(err.contents().len(), 200_000);

    let status = with_timeout(guard.release()).await.expect("child reaped");
    assert!(status.success());
}

#[tokio::test]
async fn missing_sink_discards_and_missing_pipe_is_skipped() {
    init_tracing();

    let options = SpawnOptions::new()
        .stdout(StdioMode::Piped)
        .stderr(StdioMode::Null);
    let mut guard = ProcessGuard::acquire(sh("echo kept"), &options).unwrap();
    assert!(guard.handle().has_stdout());
    assert!(!guard.handle().has_stderr());

    let out = SharedBuffer::new();
    with_timeout(consume_process_output(guard.handle_mut(), Some(out.sink()), None))
        .await
        .unwrap();
    assert_eq!(out.contents(), "kept\n");

    let mut guard = ProcessGuard::acquire(sh("echo dropped; echo dropped >&2"), &piped()).unwrap();
    with_timeout(consume_process_output(guard.handle_mut(), None, None))
        .await
        .unwrap();
    assert!(!guard.handle().has_stdout());
}

#[tokio::test]
async fn first_failing_stream_fails_the_fanout() {
    init_tracing();

    let mut guard = ProcessGuard::acquire(sh("echo fine; echo broken >&2; exec sleep 30"), &piped()).unwrap();
    let pid = guard.pid();

    let err = with_timeout(consume_process_output(
        guard.handle_mut(),
        Some(Sink::Discard),
        Some(Sink::blocking(BrokenWriter)),
    ))
    .await
    .unwrap_err();

    assert!(
        matches!(err, ProcguardError::RelayFailed { channel: OutputChannel::Stderr, .. }),
        "{err:?}"
    );

    let status = with_timeout(guard.release()).await.expect("child reaped");
    assert!(!status.success());
    assert!(!crate::common::probes::pid_is_alive(pid));
}
