// src/output/relay.rs

//! Forward the text chunks of one output channel to a [`Sink`].

use std::io::Write;

use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, trace};

use crate::errors::{ProcguardError, Result};
use crate::output::decode::TextChunks;
use crate::output::sink::Sink;
use crate::types::OutputChannel;

/// What a finished relay moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub chunks: usize,
    pub bytes: usize,
}

/// Relay every chunk from `source` into `sink` until the source is
/// exhausted.
///
/// Each chunk reaches the sink before the next one is read: writers are
/// flushed per chunk, channel sends are awaited per chunk.
pub async fn relay<R>(
    mut source: TextChunks<R>,
    sink: Sink,
    channel: OutputChannel,
) -> Result<RelayStats>
where
    R: AsyncRead + Unpin,
{
    let mut sink = sink;
    let mut stats = RelayStats::default();

    while let Some(chunk) = source
        .next_chunk()
        .await
        .map_err(|source| ProcguardError::RelayFailed { channel, source })?
    {
        trace!(%channel, len = chunk.len(), "relaying chunk");
        stats.chunks += 1;
        stats.bytes += chunk.len();
        sink = deliver(sink, chunk, channel).await?;
    }

    debug!(
        %channel,
        sink = sink.kind(),
        chunks = stats.chunks,
        bytes = stats.bytes,
        "output stream exhausted"
    );
    Ok(stats)
}

/// Hand one chunk to the sink. The sink is moved through so a blocking
/// writer can visit the blocking pool and come back.
async fn deliver(sink: Sink, chunk: String, channel: OutputChannel) -> Result<Sink> {
    let write_failed = |source| ProcguardError::RelayFailed { channel, source };

    match sink {
        Sink::Discard => Ok(Sink::Discard),
        Sink::Channel(tx) => {
            tx.send(chunk)
                .await
                .map_err(|_| ProcguardError::SinkClosed(channel))?;
            Ok(Sink::Channel(tx))
        }
        Sink::Writer(mut w) => {
            w.write_all(chunk.as_bytes()).await.map_err(write_failed)?;
            w.flush().await.map_err(write_failed)?;
            Ok(Sink::Writer(w))
        }
        Sink::Blocking(mut w) => {
            let w = tokio::task::spawn_blocking(move || -> std::io::Result<_> {
                w.write_all(chunk.as_bytes())?;
                w.flush()?;
                Ok(w)
            })
            .await
            .map_err(anyhow::Error::from)?
            .map_err(write_failed)?;
            Ok(Sink::Blocking(w))
        }
    }
}
