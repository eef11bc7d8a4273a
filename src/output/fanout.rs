// src/output/fanout.rs

use tokio::io::AsyncRead;
use tracing::debug;

use crate::errors::Result;
use crate::exec::ProcessHandle;
use crate::output::decode::TextChunks;
use crate::output::relay::{RelayStats, relay};
use crate::output::sink::Sink;
use crate::types::OutputChannel;

/// Relay a process's stdout and stderr concurrently until both are
/// exhausted.
///
/// Both relays run inside this one future. If either fails, the error is
/// returned and the other relay is dropped where it stands; chunks it already
/// delivered stay delivered. A `None` sink discards that channel's output,
/// and a channel that was not piped relays nothing.
pub async fn consume_process_output(
    process: &mut ProcessHandle,
    stdout_sink: Option<Sink>,
    stderr_sink: Option<Sink>,
) -> Result<()> {
    let pid = process.pid();
    let stdout = process.take_stdout();
    let stderr = process.take_stderr();

    let (out, err) = tokio::try_join!(
        relay_channel(stdout, stdout_sink, OutputChannel::Stdout),
        relay_channel(stderr, stderr_sink, OutputChannel::Stderr),
    )?;

    debug!(
        pid,
        stdout_chunks = out.chunks,
        stderr_chunks = err.chunks,
        "process output consumed"
    );
    Ok(())
}

async fn relay_channel<R>(
    source: Option<R>,
    sink: Option<Sink>,
    channel: OutputChannel,
) -> Result<RelayStats>
where
    R: AsyncRead + Unpin,
{
    match source {
        Some(reader) => relay(TextChunks::new(reader), sink.unwrap_or(Sink::Discard), channel).await,
        None => {
            debug!(%channel, "channel not piped; nothing to relay");
            Ok(RelayStats::default())
        }
    }
}
