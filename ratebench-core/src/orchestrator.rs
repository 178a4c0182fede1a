use tokio::time;
use tracing::{error, info};

use crate::config::BenchConfig;
use crate::error::Result;
use crate::reader::ReaderKind;
use crate::results::{self, AllResults, BenchmarkResult, ScenarioResult};
use crate::sampler::{HostFactory, Sampler, sysinfo_factory};
use crate::scenario::ScenarioKind;
use crate::workload::SyntheticCounter;

/// Runs every (scenario, reader) pair strictly one after another, each under its own sampler.
pub struct Orchestrator {
    config: BenchConfig,
    host: HostFactory,
    counter: SyntheticCounter,
}

impl Orchestrator {
    pub fn new(config: BenchConfig) -> Self {
        Self::with_host_factory(config, sysinfo_factory())
    }

    pub fn with_host_factory(config: BenchConfig, host: HostFactory) -> Self {
        Self {
            config,
            host,
            counter: SyntheticCounter::new(),
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub async fn run(&self) -> AllResults {
        self.run_selected(&ScenarioKind::ALL, &ReaderKind::ALL)
            .await
    }

    pub async fn run_selected(
        &self,
        scenarios: &[ScenarioKind],
        readers: &[ReaderKind],
    ) -> AllResults {
        let mut all = AllResults::new();

        for &scenario in scenarios {
            let mut bench = BenchmarkResult::new();
            for &reader in readers {
                match self.run_pair(scenario, reader).await {
                    Ok(result) => {
                        bench.insert(reader, result);
                    }
                    Err(err) => {
                        error!(scenario = %scenario, reader = %reader, error = %err, "pair skipped");
                    }
                }
            }
            all.insert(scenario, bench);
        }

        all
    }

    /// Measures one pair: settle, run, drain, stop, shut down, harvest.
    ///
    /// Scenario failures are logged and the samples taken so far still become series. Only a
    /// host that can't be opened at all fails the pair.
    pub async fn run_pair(
        &self,
        scenario: ScenarioKind,
        reader: ReaderKind,
    ) -> Result<ScenarioResult> {
        let timings = &self.config.timings;
        let host = (self.host)()?;

        let mut sampler =
            Sampler::new(timings.sample_interval, host, self.counter.clone()).start();
        time::sleep(timings.settle).await;

        // Failures are logged by the scenario itself.
        let _ = scenario
            .run(reader, &self.config.scenarios, &self.counter)
            .await;

        time::sleep(timings.drain).await;
        sampler.cancel();
        time::sleep(timings.shutdown).await;
        let samples = sampler.collect().await;

        info!(
            scenario = %scenario,
            reader = %reader,
            ticks = samples.len(),
            "pair measured"
        );

        Ok(results::scenario_result(
            reader,
            scenario.metrics(),
            &samples,
            self.config.unit,
        ))
    }
}
