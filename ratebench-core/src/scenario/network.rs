use std::net::TcpStream;
use std::time::{Duration, Instant};

use tokio::task::{self, JoinHandle};
use tracing::warn;

use super::{ScenarioReport, pump};
use crate::config::ScenarioSettings;
use crate::error::Result;
use crate::reader::ReaderKind;
use crate::workload::{Emission, LocalLink, SpikePlan};

pub(super) async fn flat_rate(
    reader: ReaderKind,
    settings: &ScenarioSettings,
) -> Result<ScenarioReport> {
    let payload = settings.payload_bytes;
    let emission = Emission::Constant { payload };

    let limit = settings.flat_rate_limit();

    let (bytes, elapsed, sent) = transfer(reader, settings, limit, emission).await?;
    Ok(ScenarioReport {
        sent,
        ..ScenarioReport::bounded(bytes, payload, elapsed)
    })
}

pub(super) async fn spike_recovery(
    reader: ReaderKind,
    settings: &ScenarioSettings,
) -> Result<ScenarioReport> {
    let plan = SpikePlan::from_settings(settings);
    let payload = plan.payload;
    let largest_chunk = plan.chunk.saturating_mul(plan.multiplier);
    let limit = settings.spike.limit(settings.buffer_size);

    let (bytes, elapsed, sent) = transfer(reader, settings, limit, Emission::Spike(plan)).await?;
    Ok(ScenarioReport {
        tolerance: largest_chunk,
        sent,
        ..ScenarioReport::bounded(bytes, payload, elapsed)
    })
}

/// Reads one loopback transfer through `reader` until the peer hangs up.
async fn transfer(
    reader: ReaderKind,
    settings: &ScenarioSettings,
    limit: u64,
    emission: Emission,
) -> Result<(u64, Duration, Option<u64>)> {
    let buffer_size = settings.buffer_size;
    let link = LocalLink::bind(settings.listen_addr).await?;
    let (stream, peer) = link.connect(settings.dial_delay, emission).await?;

    let read = task::spawn_blocking(move || read_limited(reader, stream, buffer_size, limit))
        .await
        .map_err(Into::into)
        .and_then(|r| r);
    if read.is_err() {
        peer.abort();
    }
    let sent = join_peer(peer).await;

    let (bytes, elapsed) = read?;
    Ok((bytes, elapsed, sent))
}

fn read_limited(
    reader: ReaderKind,
    stream: TcpStream,
    buffer_size: usize,
    limit: u64,
) -> Result<(u64, Duration)> {
    let mut limited = reader.wrap(Box::new(stream), buffer_size, limit);
    let started = Instant::now();
    let bytes = pump(&mut limited, buffer_size, None)?;
    Ok((bytes, started.elapsed()))
}

async fn join_peer(peer: JoinHandle<Result<u64>>) -> Option<u64> {
    match peer.await {
        Ok(Ok(sent)) => Some(sent),
        Ok(Err(err)) => {
            warn!(error = %err, "peer failed");
            None
        }
        Err(err) if err.is_cancelled() => None,
        Err(err) => {
            warn!(error = %err, "peer task failed");
            None
        }
    }
}
