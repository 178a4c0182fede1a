//! Periodic host and synthetic-counter snapshots taken alongside a scenario run.

mod host;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::workload::SyntheticCounter;

pub use host::{HostFactory, HostMetrics, SysinfoHost, sysinfo_factory};

/// One sampler tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub rx_delta: u64,
    pub synthetic_delta: u64,
    pub synthetic_total: u64,
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

struct Readings {
    rx: u64,
    cpu_percent: f64,
    memory_mb: f64,
}

pub struct Sampler {
    interval: Duration,
    host: Box<dyn HostMetrics>,
    counter: SyntheticCounter,
}

impl Sampler {
    pub fn new(interval: Duration, host: Box<dyn HostMetrics>, counter: SyntheticCounter) -> Self {
        Self {
            interval,
            host,
            counter,
        }
    }

    /// Resets the synthetic counter and starts ticking on the runtime.
    pub fn start(self) -> SamplerHandle {
        self.counter.reset();

        let (cancel, cancelled) = oneshot::channel();
        let task = tokio::spawn(self.run(cancelled));

        SamplerHandle {
            cancel: Some(cancel),
            task,
        }
    }

    async fn run(mut self, mut cancelled: oneshot::Receiver<()>) -> Vec<Sample> {
        self.host.refresh();
        let mut prev_rx = match self.host.rx_bytes() {
            Ok(v) => Some(v),
            Err(err) => {
                warn!(error = %err, "no rx baseline; first delta reads as 0");
                None
            }
        };
        let mut prev_synthetic = 0u64;

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut samples = Vec::new();
        loop {
            tokio::select! {
                biased;
                // Fires on an explicit cancel and on a dropped handle alike.
                _ = &mut cancelled => break,
                _ = ticker.tick() => {
                    let readings = match self.read_host() {
                        Ok(v) => v,
                        Err(err) => {
                            warn!(error = %err, "host metric read failed; skipping tick");
                            continue;
                        }
                    };

                    let synthetic_total = self.counter.load();
                    let sample = Sample {
                        rx_delta: prev_rx.map_or(0, |prev| readings.rx.saturating_sub(prev)),
                        synthetic_delta: synthetic_total.saturating_sub(prev_synthetic),
                        synthetic_total,
                        cpu_percent: readings.cpu_percent,
                        memory_mb: readings.memory_mb,
                    };
                    prev_rx = Some(readings.rx);
                    prev_synthetic = synthetic_total;

                    debug!(
                        rx = sample.rx_delta,
                        cpu = sample.cpu_percent,
                        ram_mb = sample.memory_mb,
                        synthetic = sample.synthetic_delta,
                        synthetic_total,
                        "tick"
                    );
                    samples.push(sample);
                }
            }
        }

        debug!(ticks = samples.len(), "sampler stopped");
        samples
    }

    fn read_host(&mut self) -> Result<Readings> {
        self.host.refresh();
        Ok(Readings {
            rx: self.host.rx_bytes()?,
            cpu_percent: self.host.cpu_percent()?,
            memory_mb: self.host.memory_mb()?,
        })
    }
}

/// Running sampler. Samples are handed over exactly once, by [`SamplerHandle::collect`].
pub struct SamplerHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<Vec<Sample>>,
}

impl SamplerHandle {
    /// Signals the sampler to stop at its next select point. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Stops the sampler if still running and returns everything it recorded.
    pub async fn collect(mut self) -> Vec<Sample> {
        self.cancel();
        match self.task.await {
            Ok(samples) => samples,
            Err(err) => {
                error!(error = %err, "sampler task failed");
                Vec::new()
            }
        }
    }
}
