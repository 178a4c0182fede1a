use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ByteUnit;
use crate::reader::ReaderKind;
use crate::sampler::Sample;
use crate::scenario::ScenarioKind;

/// What a series measures.
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
pub enum MetricKind {
    #[serde(rename = "rx")]
    #[strum(serialize = "rx")]
    Received,
    #[serde(rename = "synthetic-rx")]
    #[strum(serialize = "synthetic-rx")]
    SyntheticReceived,
    #[serde(rename = "total-synthetic-rx")]
    #[strum(serialize = "total-synthetic-rx")]
    CumulativeSyntheticReceived,
    #[serde(rename = "cpu")]
    #[strum(serialize = "cpu")]
    CpuPercent,
    #[serde(rename = "ram")]
    #[strum(serialize = "ram")]
    ResidentMemory,
}

impl MetricKind {
    pub fn is_bytes(self) -> bool {
        matches!(
            self,
            Self::Received | Self::SyntheticReceived | Self::CumulativeSyntheticReceived
        )
    }

    /// Projects one tick onto this metric. Byte metrics are scaled to `unit`.
    pub fn value(self, sample: &Sample, unit: ByteUnit) -> f64 {
        match self {
            Self::Received => unit.scale(sample.rx_delta),
            Self::SyntheticReceived => unit.scale(sample.synthetic_delta),
            Self::CumulativeSyntheticReceived => unit.scale(sample.synthetic_total),
            Self::CpuPercent => sample.cpu_percent,
            Self::ResidentMemory => sample.memory_mb,
        }
    }
}

/// One reader's observations of one metric, one value per sampler tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub title: String,
    pub color: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn for_reader(reader: ReaderKind, values: Vec<f64>) -> Self {
        Self {
            title: reader.display_name().to_string(),
            color: reader.color().to_string(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

pub type ScenarioResult = BTreeMap<MetricKind, Series>;
pub type BenchmarkResult = BTreeMap<ReaderKind, ScenarioResult>;
pub type AllResults = BTreeMap<ScenarioKind, BenchmarkResult>;

/// Turns the samples of one run into one series per requested metric.
pub fn scenario_result(
    reader: ReaderKind,
    metrics: &[MetricKind],
    samples: &[Sample],
    unit: ByteUnit,
) -> ScenarioResult {
    metrics
        .iter()
        .map(|&metric| {
            let values = samples.iter().map(|s| metric.value(s, unit)).collect();
            (metric, Series::for_reader(reader, values))
        })
        .collect()
}
