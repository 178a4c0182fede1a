use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::ScenarioSettings;
use crate::error::{Error, Result};

const WRITE_CHUNK: usize = 64 * 1024;
const FILLER: u8 = b'A';

/// What the dialing peer writes before hanging up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// The whole payload as fast as the socket accepts it.
    Constant { payload: u64 },
    /// Fixed-size chunks on a ticker, enlarged inside the spike window.
    Spike(SpikePlan),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpikePlan {
    pub payload: u64,
    pub chunk: u64,
    pub interval: Duration,
    /// Ticks strictly between these two send enlarged chunks.
    pub window: (u64, u64),
    pub multiplier: u64,
}

impl SpikePlan {
    pub fn from_settings(settings: &ScenarioSettings) -> Self {
        let spike = &settings.spike;
        Self {
            payload: settings.payload_bytes,
            chunk: spike.chunk_bytes(settings.buffer_size),
            interval: spike.chunk_interval,
            window: spike.tick_window(),
            multiplier: spike.multiplier.max(1),
        }
    }

    /// Bytes sent on writer tick `tick` (1-based).
    pub fn chunk_for_tick(&self, tick: u64) -> u64 {
        let (start, end) = self.window;
        if tick > start && tick < end {
            self.chunk.saturating_mul(self.multiplier)
        } else {
            self.chunk
        }
    }
}

/// Single-use loopback transfer: the listener is bound before the peer dials.
#[derive(Debug)]
pub struct LocalLink {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LocalLink {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        let addr = listener.local_addr()?;
        debug!(%addr, "listener bound");

        Ok(Self { listener, addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Starts the writing peer and accepts its connection as a blocking stream.
    ///
    /// The returned handle resolves to the number of bytes the peer wrote. The listener is closed
    /// once the connection is accepted.
    pub async fn connect(
        self,
        dial_delay: Duration,
        emission: Emission,
    ) -> Result<(std::net::TcpStream, JoinHandle<Result<u64>>)> {
        let mut peer = tokio::spawn(write_peer(self.addr, dial_delay, emission));

        let accepted = tokio::select! {
            biased;
            accepted = self.listener.accept() => accepted,
            finished = &mut peer => {
                return Err(match finished {
                    Ok(Err(err)) => err,
                    Ok(Ok(_)) => Error::Io(std::io::Error::other(
                        "peer finished before its connection was accepted",
                    )),
                    Err(err) => Error::Join(err),
                });
            }
        };

        let (stream, remote) = match accepted {
            Ok(v) => v,
            Err(err) => {
                peer.abort();
                return Err(Error::Io(err));
            }
        };
        debug!(%remote, "accepted peer");

        let stream = stream.into_std()?;
        stream.set_nonblocking(false)?;
        Ok((stream, peer))
    }
}

async fn write_peer(addr: SocketAddr, dial_delay: Duration, emission: Emission) -> Result<u64> {
    time::sleep(dial_delay).await;
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| Error::Dial { addr, source })?;

    let written = match emission {
        Emission::Constant { payload } => write_constant(&mut stream, payload).await?,
        Emission::Spike(plan) => write_spike(&mut stream, &plan).await?,
    };
    stream.shutdown().await?;
    debug!(written, "peer done");

    Ok(written)
}

async fn write_constant(stream: &mut TcpStream, payload: u64) -> Result<u64> {
    let buf = vec![FILLER; WRITE_CHUNK];
    let mut total = 0u64;
    while total < payload {
        let n = (payload - total).min(WRITE_CHUNK as u64) as usize;
        stream.write_all(&buf[..n]).await?;
        total += n as u64;
    }
    Ok(total)
}

async fn write_spike(stream: &mut TcpStream, plan: &SpikePlan) -> Result<u64> {
    let largest = usize::try_from(plan.chunk.saturating_mul(plan.multiplier)).unwrap_or(usize::MAX);
    let buf = vec![FILLER; largest];

    let mut ticker = time::interval_at(Instant::now() + plan.interval, plan.interval);
    // A throttled reader backs up the socket; late ticks are dropped, not replayed.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut total = 0u64;
    let mut tick = 0u64;
    while total < plan.payload {
        ticker.tick().await;
        tick += 1;

        let n = usize::try_from(plan.chunk_for_tick(tick)).unwrap_or(largest);
        stream.write_all(&buf[..n.min(largest)]).await?;
        total += n.min(largest) as u64;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn any_port() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
    }

    fn plan() -> SpikePlan {
        SpikePlan {
            payload: 0,
            chunk: 10,
            interval: Duration::from_millis(50),
            window: (20, 60),
            multiplier: 3,
        }
    }

    #[test]
    fn spike_window_is_exclusive() {
        let plan = plan();
        assert_eq!(plan.chunk_for_tick(20), 10);
        assert_eq!(plan.chunk_for_tick(21), 30);
        assert_eq!(plan.chunk_for_tick(59), 30);
        assert_eq!(plan.chunk_for_tick(60), 10);
    }

    #[tokio::test]
    async fn constant_emission_arrives_intact() {
        let link = LocalLink::bind(any_port())
            .await
            .unwrap_or_else(|err| panic!("bind failed: {err}"));
        assert_ne!(link.local_addr().port(), 0);

        let (mut stream, peer) = link
            .connect(Duration::from_millis(10), Emission::Constant { payload: 300_000 })
            .await
            .unwrap_or_else(|err| panic!("connect failed: {err}"));

        let received = tokio::task::spawn_blocking(move || {
            let mut buf = Vec::new();
            stream
                .read_to_end(&mut buf)
                .unwrap_or_else(|err| panic!("read failed: {err}"));
            buf.len()
        })
        .await
        .unwrap_or_else(|err| panic!("join failed: {err}"));

        let written = peer
            .await
            .unwrap_or_else(|err| panic!("join failed: {err}"))
            .unwrap_or_else(|err| panic!("peer failed: {err}"));
        assert_eq!(written, 300_000);
        assert_eq!(received, 300_000);
    }

    #[tokio::test]
    async fn spike_emission_may_overshoot_by_one_chunk() {
        let link = LocalLink::bind(any_port())
            .await
            .unwrap_or_else(|err| panic!("bind failed: {err}"));
        let plan = SpikePlan {
            payload: 95,
            interval: Duration::from_millis(5),
            window: (2, 4),
            ..plan()
        };

        let (mut stream, peer) = link
            .connect(Duration::ZERO, Emission::Spike(plan))
            .await
            .unwrap_or_else(|err| panic!("connect failed: {err}"));
        let received = tokio::task::spawn_blocking(move || {
            let mut buf = Vec::new();
            stream
                .read_to_end(&mut buf)
                .unwrap_or_else(|err| panic!("read failed: {err}"));
            buf.len()
        })
        .await
        .unwrap_or_else(|err| panic!("join failed: {err}"));

        // ticks: 10, 10, 30, 10, 10, 10, 10 -> 90, then 10 more -> 100
        let written = peer
            .await
            .unwrap_or_else(|err| panic!("join failed: {err}"))
            .unwrap_or_else(|err| panic!("peer failed: {err}"));
        assert_eq!(written, 100);
        assert_eq!(received, 100);
    }
}
