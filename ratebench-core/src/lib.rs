//! Benchmark harness for rate-limited readers.
//!
//! An [`Orchestrator`] runs every [`ScenarioKind`] through every [`ReaderKind`] while a
//! [`sampler::Sampler`] snapshots host counters, and turns the snapshots into per-metric
//! [`Series`]. Several runs can be merged with [`aggregate::average`], stored with [`persist`] and
//! described for a chart renderer with [`chart`].

pub mod aggregate;
pub mod chart;
pub mod config;
mod error;
pub mod orchestrator;
pub mod persist;
pub mod reader;
pub mod results;
pub mod sampler;
pub mod scenario;
pub mod workload;

pub use config::{BenchConfig, ByteUnit, ScenarioSettings, SpikeSettings, Timings};
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
pub use reader::ReaderKind;
pub use results::{AllResults, BenchmarkResult, MetricKind, ScenarioResult, Series};
pub use scenario::{ScenarioKind, ScenarioReport};
