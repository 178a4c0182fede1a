use std::process::Command;

use anyhow::Context as _;
use ratebench_core::persist::save;
use ratebench_core::{AllResults, BenchmarkResult, ReaderKind, ScenarioKind, ScenarioResult, Series};

fn network_results() -> AllResults {
    let scenario = ScenarioKind::FlatRateNetwork;
    let bench: BenchmarkResult = ReaderKind::ALL
        .into_iter()
        .map(|reader| {
            let result: ScenarioResult = scenario
                .metrics()
                .iter()
                .map(|&m| (m, Series::for_reader(reader, vec![1.0, 2.0, 4.0])))
                .collect();
            (reader, result)
        })
        .collect();
    AllResults::from([(scenario, bench)])
}

#[tokio::test]
async fn show_prints_summary_and_writes_charts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let results_path = dir.path().join("benchmark.json");
    save(&network_results(), &results_path).await?;

    let exe = env!("CARGO_BIN_EXE_ratebench");
    let arg = results_path.clone();
    let out = tokio::task::spawn_blocking(move || Command::new(exe).arg("show").arg(&arg).output())
        .await
        .context("spawn_blocking join")?
        .context("run ratebench binary")?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(
        out.status.success(),
        "show failed\nstdout:\n{stdout}\nstderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
    anyhow::ensure!(
        stdout.contains("flat-rate-network") && stdout.contains("token-bucket"),
        "summary missing rows:\n{stdout}"
    );
    anyhow::ensure!(stdout.contains("2.333"), "summary missing mean:\n{stdout}");

    let charts_path = dir.path().join("benchmark.charts.json");
    let raw = tokio::fs::read(&charts_path)
        .await
        .with_context(|| format!("read {}", charts_path.display()))?;
    let charts: Vec<serde_json::Value> = serde_json::from_slice(&raw)?;

    anyhow::ensure!(charts.len() == 3, "expected 3 charts, got {}", charts.len());
    anyhow::ensure!(
        charts[0]["title"] == "Real-World Rate Limiting - RX MB",
        "title: {}",
        charts[0]["title"]
    );
    anyhow::ensure!(
        charts[0]["series"].as_array().map(Vec::len) == Some(4),
        "expected one series per reader"
    );
    Ok(())
}

#[tokio::test]
async fn show_can_skip_charts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let results_path = dir.path().join("benchmark.json");
    save(&network_results(), &results_path).await?;

    let exe = env!("CARGO_BIN_EXE_ratebench");
    let arg = results_path.clone();
    let out = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .arg("show")
            .arg(&arg)
            .arg("--no-charts")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run ratebench binary")?;

    anyhow::ensure!(out.status.success(), "show failed");
    anyhow::ensure!(
        !dir.path().join("benchmark.charts.json").exists(),
        "charts were written"
    );
    Ok(())
}
