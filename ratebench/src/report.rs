use ratebench_core::{AllResults, MetricKind, ReaderKind, ScenarioKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SummaryRow {
    pub scenario: ScenarioKind,
    pub reader: ReaderKind,
    pub metric: MetricKind,
    pub ticks: usize,
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

pub(crate) fn summary_rows(results: &AllResults) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    for (&scenario, bench) in results {
        for (&reader, result) in bench {
            for (&metric, series) in result {
                rows.push(SummaryRow {
                    scenario,
                    reader,
                    metric,
                    ticks: series.len(),
                    mean: series.mean(),
                    max: series.max(),
                });
            }
        }
    }
    rows
}

fn cell(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.3}")).unwrap_or("-".to_string())
}

pub(crate) fn render_summary(results: &AllResults) -> String {
    let mut out = String::new();
    out.push_str(
        "scenario                 | reader       | metric             | ticks |         mean |          max\n",
    );
    out.push_str(
        "-------------------------+--------------+--------------------+-------+--------------+-------------\n",
    );

    for row in summary_rows(results) {
        out.push_str(&format!(
            "{:<24} | {:<12} | {:<18} | {:>5} | {:>12} | {:>12}\n",
            row.scenario.to_string(),
            row.reader.to_string(),
            row.metric.to_string(),
            row.ticks,
            cell(row.mean),
            cell(row.max),
        ));
    }

    out
}

pub(crate) fn print_summary(results: &AllResults) {
    println!("\n{}", render_summary(results));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratebench_core::{BenchmarkResult, ScenarioResult, Series};

    fn sample() -> AllResults {
        let result: ScenarioResult = ScenarioResult::from([
            (
                MetricKind::SyntheticReceived,
                Series::for_reader(ReaderKind::Interval, vec![1.0, 3.0]),
            ),
            (
                MetricKind::CpuPercent,
                Series::for_reader(ReaderKind::Interval, Vec::new()),
            ),
        ]);
        AllResults::from([(
            ScenarioKind::FlatRateSynthetic,
            BenchmarkResult::from([(ReaderKind::Interval, result)]),
        )])
    }

    #[test]
    fn rows_follow_result_order() {
        let rows = summary_rows(&sample());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.reader == ReaderKind::Interval));

        let rx = rows
            .iter()
            .find(|r| r.metric == MetricKind::SyntheticReceived)
            .unwrap_or_else(|| panic!("missing synthetic row"));
        assert_eq!(rx.ticks, 2);
        assert_eq!(rx.mean, Some(2.0));
        assert_eq!(rx.max, Some(3.0));
    }

    #[test]
    fn empty_series_render_as_dashes() {
        let out = render_summary(&sample());
        let cpu_line = out
            .lines()
            .find(|l| l.contains("| cpu "))
            .unwrap_or_else(|| panic!("missing cpu line in:\n{out}"));
        assert!(cpu_line.contains("flat-rate-synthetic"));
        assert!(cpu_line.contains("interval"));
        assert!(cpu_line.trim_end().ends_with('-'));

        let rx_line = out
            .lines()
            .find(|l| l.contains("synthetic-rx"))
            .unwrap_or_else(|| panic!("missing rx line in:\n{out}"));
        assert!(rx_line.contains("2.000"));
        assert!(rx_line.contains("3.000"));
    }
}
