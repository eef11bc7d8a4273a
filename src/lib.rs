// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod interrupt;
pub mod logging;
pub mod output;
pub mod types;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{RunSettings, load_optional};
use crate::exec::{cancel_process, start_process};
use crate::interrupt::kill_on_interrupt;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - output sinks
/// - the supervised child process
/// - interrupt escalation for that child
///
/// Returns the exit code `procguard` should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_optional(args.config.as_deref())?;
    let settings = RunSettings::resolve(&cfg, &args)?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(0);
    }

    let stream_output = settings.open_stream_output().await?;

    let (pid, task) = start_process(
        settings.command.clone(),
        stream_output,
        settings.options.clone(),
    )
    .await?;

    info!(pid, name = %settings.name, "supervising process");

    // Installed once the pid is known; lives until the run is over.
    let _interrupts =
        match kill_on_interrupt(pid, settings.name.clone(), |msg| eprintln!("\n{msg}")) {
            Ok(guard) => guard,
            Err(err) => {
                cancel_process(task).await;
                return Err(err).context("installing interrupt handler");
            }
        };

    let exit = task.await.context("supervisor task panicked")??;

    if !exit.success() {
        warn!(pid, status = %exit.status, "process exited unsuccessfully");
    }

    Ok(exit.exit_code())
}

/// Simple dry-run output: print the effective settings.
fn print_dry_run(settings: &RunSettings) {
    println!("procguard dry-run");
    println!("  name: {}", settings.name);
    println!("  command: {:?}", settings.command.tokens());
    println!("  stream_output: {}", settings.stream_output);
    if settings.stream_output {
        println!("  stdout: {}", settings.stdout);
        println!("  stderr: {}", settings.stderr);
    }
    println!("  stdin: {:?}", settings.options.stdin);
    if let Some(ref cwd) = settings.options.cwd {
        println!("  cwd: {}", cwd.display());
    }
    if !settings.options.env.is_empty() {
        println!("  env:");
        for (key, value) in settings.options.env.iter() {
            println!("    {key}={value}");
        }
    }
    println!("  grace_period: {:?}", settings.options.grace_period);

    debug!("dry-run complete (no process started)");
}
