use std::path::Path;

use anyhow::Context as _;
use ratebench_core::persist::{self, numbered_path, sibling_path};
use ratebench_core::{
    AllResults, BenchConfig, Orchestrator, ReaderKind, ScenarioKind, aggregate, chart,
};
use tracing::info;

use crate::app_error::AppError;
use crate::cli::{AverageArgs, BenchArgs, Command, RepeatArgs, RunArgs, ShowArgs, UsageArgs};
use crate::report;

const CHARTS_SUFFIX: &str = "charts.json";

pub async fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Run(args) => run_once(args).await,
        Command::Average(args) => average(args).await,
        Command::Repeat(args) => repeat(args).await,
        Command::Show(args) => show(args).await,
        Command::Usage(args) => usage(args).await,
    }
}

async fn read_config(path: &Path) -> anyhow::Result<BenchConfig> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// File config (or defaults) with flag overrides applied, then validated.
async fn load_config(args: &BenchArgs) -> Result<BenchConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => read_config(path).await.map_err(AppError::InvalidInput)?,
        None => BenchConfig::default(),
    };

    if let Some(v) = args.payload_bytes {
        config.scenarios.payload_bytes = v;
    }
    if let Some(v) = args.buffer_size {
        config.scenarios.buffer_size = v;
    }
    if let Some(v) = args.listen {
        config.scenarios.listen_addr = v;
    }
    if let Some(v) = args.sample_interval {
        config.timings.sample_interval = v;
    }
    if let Some(v) = args.unbounded_duration {
        config.scenarios.unbounded_duration = v;
    }

    config
        .validate()
        .map_err(|e| AppError::InvalidInput(e.into()))?;
    Ok(config)
}

fn selection<T: Copy>(picked: &[T], all: &[T]) -> Vec<T> {
    if picked.is_empty() {
        all.to_vec()
    } else {
        picked.to_vec()
    }
}

struct Bench {
    orchestrator: Orchestrator,
    scenarios: Vec<ScenarioKind>,
    readers: Vec<ReaderKind>,
}

impl Bench {
    async fn from_args(args: &BenchArgs) -> Result<Self, AppError> {
        let config = load_config(args).await?;
        Ok(Self {
            orchestrator: Orchestrator::new(config),
            scenarios: selection(&args.scenarios, &ScenarioKind::ALL),
            readers: selection(&args.readers, &ReaderKind::ALL),
        })
    }

    async fn measure(&self) -> AllResults {
        self.orchestrator
            .run_selected(&self.scenarios, &self.readers)
            .await
    }

    fn config(&self) -> &BenchConfig {
        self.orchestrator.config()
    }
}

/// Stores results plus their chart description next to them.
async fn store(results: &AllResults, config: &BenchConfig, path: &Path) -> anyhow::Result<()> {
    persist::save(results, path)
        .await
        .with_context(|| format!("failed to store results at {}", path.display()))?;
    write_charts(&chart::charts_for(results, config), path).await
}

async fn write_charts(charts: &[chart::ChartSpec], results_path: &Path) -> anyhow::Result<()> {
    let path = sibling_path(results_path, CHARTS_SUFFIX);
    persist::write_json(charts, &path)
        .await
        .with_context(|| format!("failed to store charts at {}", path.display()))
}

async fn run_once(args: RunArgs) -> Result<(), AppError> {
    let bench = Bench::from_args(&args.bench).await?;
    let results = bench.measure().await;

    store(&results, bench.config(), &args.output).await?;
    report::print_summary(&results);
    Ok(())
}

async fn average(args: AverageArgs) -> Result<(), AppError> {
    let bench = Bench::from_args(&args.bench).await?;

    let mut runs = Vec::with_capacity(args.runs as usize);
    for i in 1..=args.runs {
        info!(run = i, of = args.runs, "benchmark run");
        runs.push(bench.measure().await);
    }

    let averaged = aggregate::average(&runs).context("failed to average runs")?;
    store(&averaged, bench.config(), &args.output).await?;
    report::print_summary(&averaged);
    Ok(())
}

async fn repeat(args: RepeatArgs) -> Result<(), AppError> {
    let bench = Bench::from_args(&args.bench).await?;

    for i in 1..=args.runs {
        info!(run = i, of = args.runs, "benchmark run");
        let results = bench.measure().await;
        let path = numbered_path(&args.output, i as usize);
        store(&results, bench.config(), &path).await?;
    }
    Ok(())
}

async fn show(args: ShowArgs) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => read_config(path).await.map_err(AppError::InvalidInput)?,
        None => BenchConfig::default(),
    };

    let results = persist::load(&args.file)
        .await
        .with_context(|| format!("failed to load results from {}", args.file.display()))
        .map_err(AppError::InvalidInput)?;

    report::print_summary(&results);
    if !args.no_charts {
        write_charts(&chart::charts_for(&results, &config), &args.file).await?;
    }
    Ok(())
}

async fn usage(args: UsageArgs) -> Result<(), AppError> {
    let config = BenchConfig::usage();
    let readers = selection(&args.readers, &ReaderKind::USAGE);

    let orchestrator = Orchestrator::new(config);
    let results = orchestrator
        .run_selected(&[ScenarioKind::FlatRateSynthetic], &readers)
        .await;

    persist::save(&results, &args.output)
        .await
        .with_context(|| format!("failed to store results at {}", args.output.display()))?;
    write_charts(
        &chart::usage_charts(&results, orchestrator.config()),
        &args.output,
    )
    .await?;
    Ok(())
}
