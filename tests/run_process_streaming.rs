#![cfg(unix)]

mod common;
use crate::common::buffer::SharedBuffer;
use crate::common::builders::sh;
use crate::common::{init_tracing, with_timeout};

use tokio::sync::mpsc;

use procguard::errors::ProcguardError;
use procguard::exec::{SpawnOptions, StreamOutput, run_process};
use procguard::output::{Sink, SinkSpec};

async fn collect(mut rx: mpsc::Receiver<String>) -> String {
    let mut out = String::new();
    while let Some(chunk) = rx.recv().await {
        out.push_str(&chunk);
    }
    out
}

#[tokio::test]
async fn echo_is_relayed_to_channel_sinks() {
    init_tracing();

    let (out_tx, out_rx) = mpsc::channel(16);
    let (err_tx, err_rx) = mpsc::channel(16);

    let exit = with_timeout(run_process(
        ["echo", "hello"],
        StreamOutput::to(Some(Sink::channel(out_tx)), Some(Sink::channel(err_tx))),
        None,
        &SpawnOptions::default(),
    ))
    .await
    .unwrap();

    assert!(exit.success());
    assert_eq!(exit.code(), Some(0));
    assert_eq!(exit.exit_code(), 0);
    assert_eq!(collect(out_rx).await, "hello\n");
    assert_eq!(collect(err_rx).await, "");
}

#[tokio::test]
async fn interleaved_lines_arrive_once_and_in_order() {
    init_tracing();

    let out = SharedBuffer::new();
    let err = SharedBuffer::new();

    let script = "i=1; while [ $i -le 200 ]; do echo out$i; echo err$i >&2; i=$((i+1)); done";
    let exit = with_timeout(run_process(
        sh(script),
        StreamOutput::to(Some(out.sink()), Some(err.async_sink())),
        None,
        &SpawnOptions::default(),
    ))
    .await
    .unwrap();

    assert!(exit.success());

    let expected = |prefix: &str| -> String {
        (1..=200).map(|i| format!("{prefix}{i}\n")).collect()
    };
    assert_eq!(out.contents(), expected("out"));
    assert_eq!(err.contents(), expected("err"));
}

#[tokio::test]
async fn large_output_is_relayed_completely() {
    init_tracing();

    let out = SharedBuffer::new();

    // ~300 KiB, more than one read buffer.
    let script = "i=0; while [ $i -lt 10000 ]; do echo 'abcdefghijklmnopqrstuvwxyz0123'; i=$((i+1)); done";
    let exit = with_timeout(run_process(
        sh(script),
        StreamOutput::to(Some(out.sink()), None),
        None,
        &SpawnOptions::default(),
    ))
    .await
    .unwrap();

    assert!(exit.success());
    let contents = out.contents();
    assert_eq!(contents.len(), 10000 * 31);
    assert!(contents.lines().all(|l| l == "abcdefghijklmnopqrstuvwxyz0123"));
}

#[tokio::test]
async fn file_sinks_append_across_runs() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let spec = SinkSpec::File(dir.path().join("logs").join("out.log"));

    for word in ["first", "second"] {
        let sink = spec.open().await.unwrap();
        let exit = with_timeout(run_process(
            ["echo", word],
            StreamOutput::to(Some(sink), Some(Sink::Discard)),
            None,
            &SpawnOptions::default(),
        ))
        .await
        .unwrap();
        assert!(exit.success());
    }

    let written = std::fs::read_to_string(dir.path().join("logs/out.log")).unwrap();
    assert_eq!(written, "first\nsecond\n");
}

#[tokio::test]
async fn invalid_utf8_is_replaced_and_multibyte_text_survives() {
    init_tracing();

    let out = SharedBuffer::new();
    let exit = with_timeout(run_process(
        sh(r"printf '\377ok h\303\251llo'"),
        StreamOutput::to(Some(out.sink()), None),
        None,
        &SpawnOptions::default(),
    ))
    .await
    .unwrap();

    assert!(exit.success());
    assert_eq!(out.contents(), "\u{FFFD}ok héllo");
}

#[tokio::test]
async fn disabled_streaming_still_reports_exit_code() {
    init_tracing();

    let exit = with_timeout(run_process(
        sh("echo hidden; echo hidden >&2; exit 3"),
        false,
        None,
        &SpawnOptions::default(),
    ))
    .await
    .unwrap();

    assert!(!exit.success());
    assert_eq!(exit.code(), Some(3));
    assert_eq!(exit.exit_code(), 3);
}

#[tokio::test]
async fn parent_streaming_runs_to_completion() {
    init_tracing();

    let exit = with_timeout(run_process(["true"], true, None, &SpawnOptions::default()))
        .await
        .unwrap();
    assert!(exit.success());
}

#[tokio::test]
async fn signal_death_maps_to_shell_exit_code() {
    init_tracing();

    let exit = with_timeout(run_process(
        sh("kill -9 $$"),
        false,
        None,
        &SpawnOptions::default(),
    ))
    .await
    .unwrap();

    assert_eq!(exit.code(), None);
    assert_eq!(exit.signal(), Some(9));
    assert_eq!(exit.exit_code(), 137);
}

#[tokio::test]
async fn env_and_cwd_are_applied() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let out = SharedBuffer::new();

    let options = SpawnOptions::new()
        .env("PROCGUARD_TEST_VALUE", "from-options")
        .cwd(dir.path());

    let exit = with_timeout(run_process(
        sh("echo $PROCGUARD_TEST_VALUE; pwd -P"),
        StreamOutput::to(Some(out.sink()), None),
        None,
        &options,
    ))
    .await
    .unwrap();
    assert!(exit.success());

    let contents = out.contents();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("from-options"));
    assert_eq!(
        lines.next().map(std::path::PathBuf::from),
        Some(dir.path().canonicalize().unwrap())
    );
}

#[tokio::test]
async fn missing_program_is_a_spawn_failure() {
    init_tracing();

    let err = run_process(
        ["procguard-no-such-program-4a1f"],
        true,
        None,
        &SpawnOptions::default(),
    )
    .await
    .unwrap_err();

    match err {
        ProcguardError::SpawnFailed { program, source } => {
            assert_eq!(program, "procguard-no-such-program-4a1f");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
