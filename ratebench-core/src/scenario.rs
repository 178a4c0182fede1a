//! The fixed procedures each reader is measured under.

mod network;
mod synthetic;

use std::io::{self, Read};
use std::time::Duration;

use ratebench_limiters::BoxedSource;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::{MIB, ScenarioSettings};
use crate::error::Result;
use crate::reader::ReaderKind;
use crate::results::MetricKind;
use crate::workload::{DurationGate, SyntheticCounter};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScenarioKind {
    /// Fixed synthetic payload limited to `payload / flat_rate_window`.
    FlatRateSynthetic,
    /// Fixed payload over loopback TCP, same limit.
    FlatRateNetwork,
    /// Synthetic source with no practical ceiling, for a fixed wall-clock duration.
    UnboundedSynthetic,
    /// Loopback transfer whose writer triples its chunk size inside the spike window.
    SpikeRecoveryNetwork,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::FlatRateSynthetic,
        ScenarioKind::FlatRateNetwork,
        ScenarioKind::UnboundedSynthetic,
        ScenarioKind::SpikeRecoveryNetwork,
    ];

    /// Metrics recorded for this scenario, in chart order.
    pub fn metrics(self) -> &'static [MetricKind] {
        match self {
            Self::FlatRateSynthetic => &[MetricKind::SyntheticReceived],
            Self::FlatRateNetwork | Self::SpikeRecoveryNetwork => &[
                MetricKind::Received,
                MetricKind::CpuPercent,
                MetricKind::ResidentMemory,
            ],
            Self::UnboundedSynthetic => &[
                MetricKind::CumulativeSyntheticReceived,
                MetricKind::CpuPercent,
            ],
        }
    }

    /// Runs the scenario once through `reader`.
    ///
    /// Byte-count mismatches are logged, not returned. Errors cover I/O failures other than a
    /// clean end of stream, listener and dial failures.
    pub async fn run(
        self,
        reader: ReaderKind,
        settings: &ScenarioSettings,
        counter: &SyntheticCounter,
    ) -> Result<ScenarioReport> {
        info!(scenario = %self, reader = %reader, "scenario starting");

        let outcome = match self {
            Self::FlatRateSynthetic => synthetic::flat_rate(reader, settings, counter).await,
            Self::UnboundedSynthetic => synthetic::unbounded(reader, settings, counter).await,
            Self::FlatRateNetwork => network::flat_rate(reader, settings).await,
            Self::SpikeRecoveryNetwork => network::spike_recovery(reader, settings).await,
        };

        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                error!(scenario = %self, reader = %reader, error = %err, "scenario failed");
                return Err(err);
            }
        };

        if !report.is_complete() {
            warn!(
                scenario = %self,
                reader = %reader,
                bytes = report.bytes,
                expected = ?report.expected,
                "byte count mismatch"
            );
        }
        info!(
            scenario = %self,
            reader = %reader,
            bytes = report.bytes,
            sent = ?report.sent,
            elapsed = ?report.elapsed,
            mib_per_sec = report.throughput() / MIB as f64,
            "scenario finished"
        );

        Ok(report)
    }
}

/// Outcome of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// Bytes that came out of the limited reader.
    pub bytes: u64,
    /// Nominal payload; `None` for time-boxed runs.
    pub expected: Option<u64>,
    /// Allowed overshoot over `expected`.
    pub tolerance: u64,
    /// Bytes the network peer reports having written.
    pub sent: Option<u64>,
    pub elapsed: Duration,
}

impl ScenarioReport {
    pub fn bounded(bytes: u64, expected: u64, elapsed: Duration) -> Self {
        Self {
            bytes,
            expected: Some(expected),
            tolerance: 0,
            sent: None,
            elapsed,
        }
    }

    pub fn timed(bytes: u64, elapsed: Duration) -> Self {
        Self {
            bytes,
            expected: None,
            tolerance: 0,
            sent: None,
            elapsed,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.expected
            .is_none_or(|expected| self.bytes >= expected && self.bytes - expected <= self.tolerance)
    }

    /// Bytes per second over the measured window.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes as f64 / secs
    }
}

/// Reads `reader` until end of stream, or until `gate` closes.
pub(crate) fn pump(
    reader: &mut BoxedSource,
    buffer_size: usize,
    gate: Option<&DurationGate>,
) -> Result<u64> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;

    while gate.is_none_or(DurationGate::next) {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => total += n as u64,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                error!(bytes = total, error = %err, "read failed");
                return Err(err.into());
            }
        }
    }

    if let Err(err) = reader.close() {
        warn!(error = %err, "close failed");
    }
    Ok(total)
}
