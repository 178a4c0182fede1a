//! Chart descriptions handed to an external renderer.
//!
//! One chart per (scenario, metric), every reader as one line. Rendering itself happens elsewhere;
//! this module only decides titles, axis labels, markers and which series go together.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{BenchConfig, ByteUnit};
use crate::reader::ReaderKind;
use crate::results::{AllResults, BenchmarkResult, MetricKind, Series};
use crate::scenario::ScenarioKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    /// X-axis label the marker sits on.
    pub at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub subtitle: String,
    pub x_axis: Vec<String>,
    pub markers: Vec<Marker>,
    pub series: Vec<Series>,
}

fn seconds(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs == 1.0 {
        "1 second".to_string()
    } else {
        format!("{secs} seconds")
    }
}

fn axis_label(secs: f64) -> String {
    format!("{secs:.1}")
}

/// Tick labels in seconds: 0.0, 0.2, 0.4, ...
pub fn x_axis(ticks: usize, interval: Duration) -> Vec<String> {
    let step = interval.as_secs_f64();
    (0..ticks).map(|i| axis_label(i as f64 * step)).collect()
}

fn heading(scenario: ScenarioKind, config: &BenchConfig) -> (String, String) {
    let s = &config.scenarios;
    let window = s.flat_rate_window.as_secs_f64();

    match scenario {
        ScenarioKind::FlatRateSynthetic => (
            "Classic Usage Synthetic Rate Limiting".to_string(),
            format!("Passing X data with X/{window} limit with synthetic reader"),
        ),
        ScenarioKind::FlatRateNetwork => (
            "Real-World Rate Limiting".to_string(),
            format!("Passing X data with X/{window} limit between 2 servers"),
        ),
        ScenarioKind::UnboundedSynthetic => (
            format!("Max Read Over {}", capitalized(&seconds(s.unbounded_duration))),
            "Passing infinite data with no limit with synthetic reader".to_string(),
        ),
        ScenarioKind::SpikeRecoveryNetwork => (
            "Real-World Spike Recovery".to_string(),
            format!(
                "Rate limit between 2 servers with a spike after {}",
                seconds(s.spike.start)
            ),
        ),
    }
}

fn capitalized(phrase: &str) -> String {
    phrase.replace("second", "Second")
}

fn metric_suffix(metric: MetricKind, unit: ByteUnit) -> String {
    match metric {
        MetricKind::Received => format!("RX {}", unit.label()),
        MetricKind::SyntheticReceived => format!("SyntheticRX {}", unit.label()),
        MetricKind::CumulativeSyntheticReceived => format!("Total SyntheticRX {}", unit.label()),
        MetricKind::CpuPercent => "CPU Usage".to_string(),
        MetricKind::ResidentMemory => "RAM MB Usage".to_string(),
    }
}

fn markers(scenario: ScenarioKind, config: &BenchConfig) -> Vec<Marker> {
    match scenario {
        ScenarioKind::SpikeRecoveryNetwork => {
            let spike = &config.scenarios.spike;
            vec![
                Marker {
                    name: "Spike Start".to_string(),
                    at: axis_label(spike.start.as_secs_f64()),
                },
                Marker {
                    name: "Spike End".to_string(),
                    at: axis_label(spike.end.as_secs_f64()),
                },
            ]
        }
        _ => Vec::new(),
    }
}

fn chart(
    title: String,
    subtitle: String,
    markers: Vec<Marker>,
    series: Vec<Series>,
    interval: Duration,
) -> ChartSpec {
    let ticks = series.iter().map(Series::len).max().unwrap_or(0);
    ChartSpec {
        title,
        subtitle,
        x_axis: x_axis(ticks, interval),
        markers,
        series,
    }
}

fn metric_series(bench: &BenchmarkResult, metric: MetricKind) -> Vec<Series> {
    bench
        .values()
        .filter_map(|result| result.get(&metric).cloned())
        .collect()
}

/// Charts for a full benchmark, in scenario order.
pub fn charts_for(results: &AllResults, config: &BenchConfig) -> Vec<ChartSpec> {
    let interval = config.timings.sample_interval;
    let mut charts = Vec::new();

    for (&scenario, bench) in results {
        let (title, subtitle) = heading(scenario, config);
        for &metric in scenario.metrics() {
            let series = metric_series(bench, metric);
            if series.is_empty() {
                continue;
            }
            charts.push(chart(
                format!("{title} - {}", metric_suffix(metric, config.unit)),
                subtitle.clone(),
                markers(scenario, config),
                series,
                interval,
            ));
        }
    }

    charts
}

fn usage_heading(reader: ReaderKind) -> (String, &'static str) {
    match reader {
        ReaderKind::TokenBucketBursts => (
            format!("{} Rate Limiting", ReaderKind::TokenBucket.display_name()),
            "Only Bursts Usage",
        ),
        _ => (
            format!("{} Rate Limiting", reader.display_name()),
            "Normal Usage",
        ),
    }
}

/// One chart per reader showing the bytes it released per tick.
pub fn usage_charts(results: &AllResults, config: &BenchConfig) -> Vec<ChartSpec> {
    let interval = config.timings.sample_interval;
    let Some(bench) = results.get(&ScenarioKind::FlatRateSynthetic) else {
        return Vec::new();
    };

    bench
        .iter()
        .filter_map(|(reader, result)| {
            let series = result.get(&MetricKind::SyntheticReceived)?;
            let (title, subtitle) = usage_heading(*reader);
            Some(chart(
                title,
                subtitle.to_string(),
                Vec::new(),
                vec![Series {
                    title: format!(
                        "{} per {}s",
                        config.unit.label(),
                        axis_label(interval.as_secs_f64())
                    ),
                    ..series.clone()
                }],
                interval,
            ))
        })
        .collect()
}
