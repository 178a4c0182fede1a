use std::collections::BTreeMap;

use ratebench_core::persist::{load, numbered_path, save};
use ratebench_core::{
    AllResults, BenchmarkResult, Error, MetricKind, ReaderKind, ScenarioKind, Series,
};

fn sample_results() -> AllResults {
    let mut all = AllResults::new();
    for scenario in ScenarioKind::ALL {
        let mut bench = BenchmarkResult::new();
        for reader in ReaderKind::ALL {
            let result = scenario
                .metrics()
                .iter()
                .map(|&m| (m, Series::for_reader(reader, vec![0.5, 1.25, 3.0])))
                .collect::<BTreeMap<MetricKind, Series>>();
            bench.insert(reader, result);
        }
        all.insert(scenario, bench);
    }
    all
}

#[tokio::test]
async fn saved_results_load_back_unchanged() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = numbered_path(&dir.path().join("docs/benchmark.json"), 3);

    let results = sample_results();
    save(&results, &path).await?;
    anyhow::ensure!(path.ends_with("docs/benchmark.3.json"), "path: {}", path.display());

    let loaded = load(&path).await?;
    anyhow::ensure!(loaded == results, "round trip changed the results");

    Ok(())
}

#[tokio::test]
async fn missing_and_malformed_files_are_errors() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let missing = load(&dir.path().join("absent.json")).await;
    anyhow::ensure!(
        matches!(missing, Err(Error::Persist { .. })),
        "expected a persist error, got {missing:?}"
    );

    let garbage = dir.path().join("garbage.json");
    tokio::fs::write(&garbage, b"{ not json").await?;
    let malformed = load(&garbage).await;
    anyhow::ensure!(
        matches!(malformed, Err(Error::Json(_))),
        "expected a json error, got {malformed:?}"
    );

    Ok(())
}
