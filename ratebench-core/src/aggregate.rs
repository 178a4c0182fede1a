use crate::error::{Error, Result};
use crate::results::AllResults;

/// Element-wise mean of several runs.
///
/// The first run fixes the shape. Each leaf series is averaged against the series at the same
/// (scenario, reader, metric) position in the other runs and truncated to the shortest of them;
/// a position missing from any run therefore averages to an empty series.
pub fn average(runs: &[AllResults]) -> Result<AllResults> {
    let (first, rest) = runs.split_first().ok_or(Error::NoRuns)?;
    let mut averaged = first.clone();

    for (scenario, bench) in averaged.iter_mut() {
        for (reader, result) in bench.iter_mut() {
            for (metric, series) in result.iter_mut() {
                let peers: Vec<&[f64]> = rest
                    .iter()
                    .map(|run| {
                        run.get(scenario)
                            .and_then(|b| b.get(reader))
                            .and_then(|r| r.get(metric))
                            .map_or(&[][..], |s| s.values.as_slice())
                    })
                    .collect();
                series.values = mean_truncated(&series.values, &peers);
            }
        }
    }

    Ok(averaged)
}

fn mean_truncated(first: &[f64], peers: &[&[f64]]) -> Vec<f64> {
    let len = peers.iter().map(|p| p.len()).fold(first.len(), usize::min);
    let runs = (peers.len() + 1) as f64;

    (0..len)
        .map(|i| (first[i] + peers.iter().map(|p| p[i]).sum::<f64>()) / runs)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_truncated_uses_shortest_length() {
        let out = mean_truncated(&[1.0, 2.0, 3.0], &[&[3.0, 4.0]]);
        assert_eq!(out, vec![2.0, 3.0]);
    }

    #[test]
    fn single_run_is_unchanged() {
        assert_eq!(mean_truncated(&[5.0, 6.0], &[]), vec![5.0, 6.0]);
    }

    #[test]
    fn no_runs_is_an_error() {
        assert!(matches!(average(&[]), Err(Error::NoRuns)));
    }
}
