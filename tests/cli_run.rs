#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use clap::Parser;

use procguard::cli::CliArgs;
use procguard::run;

fn args(list: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("procguard").chain(list.iter().copied())).unwrap()
}

#[tokio::test]
async fn run_returns_the_child_exit_code() {
    init_tracing();

    let code = with_timeout(run(args(&["--quiet", "sh", "-c", "exit 7"])))
        .await
        .unwrap();
    assert_eq!(code, 7);
}

#[tokio::test]
async fn run_writes_output_to_file_sinks() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.log");
    let err = dir.path().join("err.log");
    let out_sink = format!("file:{}", out.display());
    let err_sink = format!("file:{}", err.display());

    let code = with_timeout(run(args(&[
        "--stdout",
        &out_sink,
        "--stderr",
        &err_sink,
        "sh",
        "-c",
        "echo to-out; echo to-err >&2",
    ])))
    .await
    .unwrap();

    assert_eq!(code, 0);
    assert_eq!(std::fs::read_to_string(out).unwrap(), "to-out\n");
    assert_eq!(std::fs::read_to_string(err).unwrap(), "to-err\n");
}

#[tokio::test]
async fn dry_run_starts_nothing() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let script = format!("touch {}", marker.display());

    let code = with_timeout(run(args(&["--dry-run", "sh", "-c", &script])))
        .await
        .unwrap();

    assert_eq!(code, 0);
    assert!(!marker.exists());
}

#[tokio::test]
async fn signal_death_becomes_128_plus_signal() {
    init_tracing();

    let code = with_timeout(run(args(&["--quiet", "sh", "-c", "kill -TERM $$"])))
        .await
        .unwrap();
    assert_eq!(code, 143);
}

#[tokio::test]
async fn missing_program_is_an_error() {
    init_tracing();

    let err = run(args(&["--quiet", "procguard-no-such-program-9d3e"]))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("procguard-no-such-program-9d3e"));
}
