use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ratebench_core::{ReaderKind, ScenarioKind};

#[derive(Debug, Parser)]
#[command(
    name = "ratebench",
    author,
    version,
    about = "Benchmark harness for rate-limited readers",
    long_about = "ratebench measures how accurately and smoothly different rate-limiting readers enforce a byte-rate ceiling.\n\nEvery scenario (flat-rate synthetic, flat-rate loopback TCP, unbounded synthetic, loopback spike recovery) runs once per reader while a sampler records received bytes, CPU and memory every tick.\n\nResults are stored as JSON next to a chart description file for an external renderer.",
    after_help = "Examples:\n  ratebench run\n  ratebench run --scenario spike-recovery-network --reader token-bucket\n  ratebench average --runs 3\n  ratebench repeat --runs 5 --output docs/benchmark.json\n  ratebench show docs/benchmark.json\n  ratebench usage\n\nLog verbosity follows RUST_LOG (default: info)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every scenario once for every reader
    Run(RunArgs),

    /// Run the benchmark several times and store the element-wise average
    Average(AverageArgs),

    /// Run the benchmark several times and store every run separately
    Repeat(RepeatArgs),

    /// Print the summary of stored results and regenerate their chart file
    Show(ShowArgs),

    /// Per-reader demo on a tiny synthetic workload, plus a burst-only token bucket
    Usage(UsageArgs),
}

/// Workload and timing overrides shared by the measuring subcommands.
#[derive(Debug, Default, Args)]
pub struct BenchArgs {
    /// JSON file with a full or partial benchmark config; flags override it
    #[arg(long, env = "RATEBENCH_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Restrict to these scenarios (repeatable)
    #[arg(long = "scenario", value_name = "SCENARIO")]
    pub scenarios: Vec<ScenarioKind>,

    /// Restrict to these readers (repeatable)
    #[arg(long = "reader", value_name = "READER")]
    pub readers: Vec<ReaderKind>,

    /// Payload size in bytes for the bounded scenarios
    #[arg(long, env = "RATEBENCH_PAYLOAD_BYTES")]
    pub payload_bytes: Option<u64>,

    /// Read buffer size in bytes
    #[arg(long, env = "RATEBENCH_BUFFER_SIZE")]
    pub buffer_size: Option<usize>,

    /// Address the loopback scenarios listen on
    #[arg(long, env = "RATEBENCH_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Sampler tick (e.g. 200ms)
    #[arg(long, env = "RATEBENCH_SAMPLE_INTERVAL", value_parser = humantime::parse_duration)]
    pub sample_interval: Option<Duration>,

    /// Length of the unbounded scenario (e.g. 10s)
    #[arg(long, env = "RATEBENCH_UNBOUNDED_DURATION", value_parser = humantime::parse_duration)]
    pub unbounded_duration: Option<Duration>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub bench: BenchArgs,

    /// Results file; the chart description lands next to it
    #[arg(long, env = "RATEBENCH_OUTPUT", default_value = "docs/benchmark.json")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct AverageArgs {
    #[command(flatten)]
    pub bench: BenchArgs,

    /// Number of runs to average
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: u32,

    #[arg(long, default_value = "docs/benchmarkAverage.json")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct RepeatArgs {
    #[command(flatten)]
    pub bench: BenchArgs,

    /// Number of runs; each is stored with its run number before the extension
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: u32,

    #[arg(long, default_value = "docs/benchmark.json")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Stored results file
    pub file: PathBuf,

    /// Config the results were produced with (titles and axis labels)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip regenerating the chart file
    #[arg(long)]
    pub no_charts: bool,
}

#[derive(Debug, Args)]
pub struct UsageArgs {
    /// Restrict to these readers (repeatable)
    #[arg(long = "reader", value_name = "READER")]
    pub readers: Vec<ReaderKind>,

    #[arg(long, default_value = "docs/usage.json")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(args) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        }
    }

    #[test]
    fn run_defaults() {
        let cli = parse(&["ratebench", "run"]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.output, PathBuf::from("docs/benchmark.json"));
                assert!(args.bench.scenarios.is_empty());
                assert!(args.bench.readers.is_empty());
                assert!(args.bench.config.is_none());
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn run_parses_filters_and_overrides() {
        let cli = parse(&[
            "ratebench",
            "run",
            "--scenario",
            "spike-recovery-network",
            "--scenario",
            "flat-rate-synthetic",
            "--reader",
            "token-bucket",
            "--payload-bytes",
            "1048576",
            "--sample-interval",
            "100ms",
            "--listen",
            "127.0.0.1:0",
        ]);

        match cli.command {
            Command::Run(args) => {
                assert_eq!(
                    args.bench.scenarios,
                    vec![
                        ScenarioKind::SpikeRecoveryNetwork,
                        ScenarioKind::FlatRateSynthetic
                    ]
                );
                assert_eq!(args.bench.readers, vec![ReaderKind::TokenBucket]);
                assert_eq!(args.bench.payload_bytes, Some(1024 * 1024));
                assert_eq!(
                    args.bench.sample_interval,
                    Some(Duration::from_millis(100))
                );
                assert_eq!(args.bench.listen.map(|a| a.port()), Some(0));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn average_and_repeat_have_their_own_defaults() {
        match parse(&["ratebench", "average"]).command {
            Command::Average(args) => {
                assert_eq!(args.runs, 3);
                assert_eq!(args.output, PathBuf::from("docs/benchmarkAverage.json"));
            }
            _ => panic!("expected average command"),
        }
        match parse(&["ratebench", "repeat", "--runs", "2"]).command {
            Command::Repeat(args) => assert_eq!(args.runs, 2),
            _ => panic!("expected repeat command"),
        }
    }

    #[test]
    fn rejects_unknown_identities_and_zero_runs() {
        assert!(Cli::try_parse_from(["ratebench", "run", "--reader", "nope"]).is_err());
        assert!(Cli::try_parse_from(["ratebench", "average", "--runs", "0"]).is_err());
        assert!(Cli::try_parse_from(["ratebench", "run", "--sample-interval", "10x"]).is_err());
    }

    #[test]
    fn show_requires_a_file() {
        assert!(Cli::try_parse_from(["ratebench", "show"]).is_err());
        match parse(&["ratebench", "show", "docs/benchmark.json", "--no-charts"]).command {
            Command::Show(args) => {
                assert_eq!(args.file, PathBuf::from("docs/benchmark.json"));
                assert!(args.no_charts);
            }
            _ => panic!("expected show command"),
        }
    }
}
