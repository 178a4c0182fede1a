use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::error::{Error, Result};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;

/// Port the local network scenarios listen on unless configured otherwise.
pub const DEFAULT_LISTEN_PORT: u16 = 1238;

/// Unit byte-valued series are reported in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum ByteUnit {
    #[strum(serialize = "KiB", ascii_case_insensitive)]
    KiB,
    #[default]
    #[strum(serialize = "MiB", ascii_case_insensitive)]
    MiB,
}

impl ByteUnit {
    pub fn bytes(self) -> u64 {
        match self {
            Self::KiB => KIB,
            Self::MiB => MIB,
        }
    }

    pub fn scale(self, bytes: u64) -> f64 {
        bytes as f64 / self.bytes() as f64
    }

    /// Short label used in chart titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::KiB => "KB",
            Self::MiB => "MB",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub timings: Timings,
    pub scenarios: ScenarioSettings,
    pub unit: ByteUnit,
}

impl BenchConfig {
    /// Tiny workload that makes individual limiter decisions visible on a chart.
    pub fn usage() -> Self {
        Self {
            timings: Timings::default(),
            scenarios: ScenarioSettings {
                buffer_size: KIB as usize,
                payload_bytes: 20 * KIB,
                ..ScenarioSettings::default()
            },
            unit: ByteUnit::KiB,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.timings;
        let s = &self.scenarios;

        if t.sample_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "`sample_interval` must be a positive duration".to_string(),
            ));
        }
        if s.buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "`buffer_size` must be a positive integer".to_string(),
            ));
        }
        if s.payload_bytes == 0 {
            return Err(Error::InvalidConfig(
                "`payload_bytes` must be a positive integer".to_string(),
            ));
        }
        if s.flat_rate_window.is_zero() {
            return Err(Error::InvalidConfig(
                "`flat_rate_window` must be a positive duration".to_string(),
            ));
        }
        if s.spike.chunk_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "`spike.chunk_interval` must be a positive duration".to_string(),
            ));
        }
        if s.spike.end < s.spike.start {
            return Err(Error::InvalidConfig(
                "`spike.end` must not precede `spike.start`".to_string(),
            ));
        }
        if s.spike.multiplier == 0 {
            return Err(Error::InvalidConfig(
                "`spike.multiplier` must be a positive integer".to_string(),
            ));
        }

        Ok(())
    }
}

/// Fixed waits around every measured scenario run.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub sample_interval: Duration,

    /// Between sampler start and scenario start.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub settle: Duration,

    /// Between scenario end and the stop signal.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub drain: Duration,

    /// Between the stop signal and harvesting the samples.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub shutdown: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(200),
            settle: Duration::from_millis(300),
            drain: Duration::from_millis(700),
            shutdown: Duration::from_millis(300),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    pub buffer_size: usize,
    pub payload_bytes: u64,

    /// The flat-rate scenarios limit to `payload_bytes / flat_rate_window`.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub flat_rate_window: Duration,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub unbounded_duration: Duration,

    pub listen_addr: SocketAddr,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub dial_delay: Duration,

    pub spike: SpikeSettings,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            buffer_size: 32 * KIB as usize,
            payload_bytes: 100 * MIB,
            flat_rate_window: Duration::from_secs(4),
            unbounded_duration: Duration::from_secs(10),
            listen_addr: SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::LOCALHOST,
                DEFAULT_LISTEN_PORT,
            )),
            dial_delay: Duration::from_millis(100),
            spike: SpikeSettings::default(),
        }
    }
}

impl ScenarioSettings {
    pub fn flat_rate_limit(&self) -> u64 {
        let per_sec = self.payload_bytes as f64 / self.flat_rate_window.as_secs_f64();
        (per_sec as u64).max(1)
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeSettings {
    /// Bytes per second; `None` means 500 buffers per second.
    pub limit: Option<u64>,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub chunk_interval: Duration,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub start: Duration,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub end: Duration,

    pub multiplier: u64,
}

impl Default for SpikeSettings {
    fn default() -> Self {
        Self {
            limit: None,
            chunk_interval: Duration::from_millis(50),
            start: Duration::from_secs(1),
            end: Duration::from_secs(3),
            multiplier: 3,
        }
    }
}

impl SpikeSettings {
    pub fn limit(&self, buffer_size: usize) -> u64 {
        self.limit
            .unwrap_or_else(|| buffer_size as u64 * 500)
            .max(1)
    }

    pub fn ticks_per_sec(&self) -> u64 {
        let per_sec = Duration::from_secs(1).as_nanos() / self.chunk_interval.as_nanos().max(1);
        u64::try_from(per_sec).unwrap_or(u64::MAX).max(1)
    }

    /// Bytes emitted per writer tick outside the spike window.
    pub fn chunk_bytes(&self, buffer_size: usize) -> u64 {
        (self.limit(buffer_size) / self.ticks_per_sec()).max(1)
    }

    /// Writer tick numbers bounding the spike window; spiked ticks lie strictly between them.
    pub fn tick_window(&self) -> (u64, u64) {
        let interval = self.chunk_interval.as_nanos().max(1);
        let to_tick = |at: Duration| u64::try_from(at.as_nanos() / interval).unwrap_or(u64::MAX);
        (to_tick(self.start), to_tick(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_workload() {
        let cfg = BenchConfig::default();
        assert_eq!(cfg.timings.sample_interval, Duration::from_millis(200));
        assert_eq!(cfg.scenarios.buffer_size, 32 * 1024);
        assert_eq!(cfg.scenarios.flat_rate_limit(), 25 * MIB);
        assert_eq!(cfg.scenarios.listen_addr.port(), DEFAULT_LISTEN_PORT);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn spike_geometry_follows_the_buffer_size() {
        let spike = SpikeSettings::default();
        assert_eq!(spike.limit(32 * 1024), 16_000 * 1024);
        assert_eq!(spike.ticks_per_sec(), 20);
        assert_eq!(spike.chunk_bytes(32 * 1024), 800 * 1024);
        assert_eq!(spike.tick_window(), (20, 60));
    }

    #[test]
    fn usage_preset_limits_to_five_kib_per_second() {
        let cfg = BenchConfig::usage();
        assert_eq!(cfg.scenarios.flat_rate_limit(), 5 * KIB);
        assert_eq!(cfg.unit, ByteUnit::KiB);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: BenchConfig = serde_json::from_str(
            r#"{"timings": {"settle": 50}, "scenarios": {"listen_addr": "127.0.0.1:0"}}"#,
        )
        .unwrap_or_else(|err| panic!("parse failed: {err}"));

        assert_eq!(cfg.timings.settle, Duration::from_millis(50));
        assert_eq!(cfg.timings.drain, Duration::from_millis(700));
        assert_eq!(cfg.scenarios.listen_addr.port(), 0);
        assert_eq!(cfg.scenarios.payload_bytes, 100 * MIB);
    }

    #[test]
    fn validate_rejects_inverted_spike_window() {
        let mut cfg = BenchConfig::default();
        cfg.scenarios.spike.start = Duration::from_secs(5);
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn byte_unit_parses_case_insensitively() {
        assert_eq!("kib".parse::<ByteUnit>().ok(), Some(ByteUnit::KiB));
        assert_eq!(ByteUnit::MiB.scale(3 * MIB), 3.0);
    }
}
