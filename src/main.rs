use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::BenchConfig;
use crate::domain::{AlgorithmSpec, RunOutcome};
use crate::driver::{BenchmarkDriver, DriverSettings};
use crate::load::gate::IdleGate;
use crate::report::CsvReporter;
use crate::runner::basic::BasicRunner;
use crate::runner::stubs::StubRunner;
use crate::runner::traits::Runner;

mod config;
mod domain;
mod driver;
mod load;
mod report;
mod runner;

#[derive(Parser, Debug)]
#[command(
    name = "fairbench",
    version,
    about = "Benchmark algorithm executables under pinned, idle-gated, comparable conditions"
)]
struct Cli {
    /// TOML config file describing the benchmark matrix
    #[arg(long)]
    config: Option<PathBuf>,

    /// Algorithm to benchmark as NAME=PATH (repeatable, order preserved)
    #[arg(long = "algorithm", value_name = "NAME=PATH", value_parser = parse_algorithm)]
    algorithms: Vec<AlgorithmSpec>,

    /// Input sizes, comma separated (overrides the config file)
    #[arg(long, value_delimiter = ',')]
    sizes: Vec<u64>,

    /// Logical core the children are pinned to
    #[arg(long)]
    core: Option<usize>,

    /// Run children unpinned
    #[arg(long)]
    no_pin: bool,

    /// CPU utilization percent a run waits for before starting
    #[arg(long)]
    threshold: Option<f64>,

    /// Per-run timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Stop idle-gating after this many milliseconds and run anyway
    #[arg(long)]
    idle_max_wait_ms: Option<u64>,

    /// Results CSV path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Walk the matrix against a canned runner without spawning children
    #[arg(long)]
    dry_run: bool,
}

fn parse_algorithm(raw: &str) -> Result<AlgorithmSpec, String> {
    let (name, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{raw}'"))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{raw}'"));
    }
    Ok(AlgorithmSpec {
        display_name: name.to_string(),
        executable_path: PathBuf::from(path),
    })
}

fn resolve_config(cli: &Cli) -> Result<BenchConfig> {
    let mut config = match &cli.config {
        Some(path) => BenchConfig::load(path)?,
        None => BenchConfig::default(),
    };

    if !cli.algorithms.is_empty() {
        config.algorithms = cli.algorithms.clone();
    }
    if !cli.sizes.is_empty() {
        config.sizes = cli.sizes.clone();
    }
    if let Some(core) = cli.core {
        config.target_core = core;
    }
    if cli.no_pin {
        config.pin = false;
    }
    if let Some(threshold) = cli.threshold {
        config.threshold_percent = threshold;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(max_wait) = cli.idle_max_wait_ms {
        config.idle_max_wait_ms = Some(max_wait);
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries only the progress report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    // The one fatal error: no output destination, no runs.
    let reporter = CsvReporter::create(&config.output)
        .context("could not create the results destination")?;

    let runner: Arc<dyn Runner> = if cli.dry_run {
        tracing::info!("dry run: walking the matrix with a canned runner");
        Arc::new(StubRunner::new(
            RunOutcome::Success { elapsed_ns: 0 },
            Duration::ZERO,
        ))
    } else {
        Arc::new(BasicRunner::new())
    };

    let gate = IdleGate::new(
        config.threshold_percent,
        Duration::from_millis(config.poll_interval_ms),
        config.idle_max_wait_ms.map(Duration::from_millis),
    );

    println!();
    println!("=== AUTOMATED ALGORITHM COMPARISON ===");
    println!(
        "Started {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    let started = Instant::now();
    let mut driver = BenchmarkDriver::new(
        runner,
        gate,
        Box::new(reporter),
        DriverSettings::from(&config),
    );
    let outcomes = driver.run_all().await;

    let succeeded = outcomes
        .iter()
        .filter(|cell| cell.outcome.is_success())
        .count();
    println!();
    println!(
        "Completed {}/{} cells in {:.1}s",
        succeeded,
        outcomes.len(),
        started.elapsed().as_secs_f64()
    );
    println!("Results written to {}", config.output.display());

    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_flag_requires_name_and_path() {
        let algorithm = parse_algorithm("Linear Search=build/linear").unwrap();
        assert_eq!(algorithm.display_name, "Linear Search");
        assert_eq!(algorithm.executable_path, PathBuf::from("build/linear"));

        assert!(parse_algorithm("no-separator").is_err());
        assert!(parse_algorithm("=path-only").is_err());
        assert!(parse_algorithm("name-only=").is_err());
    }

    #[test]
    fn cli_overrides_beat_defaults() {
        let cli = Cli::parse_from([
            "fairbench",
            "--algorithm",
            "Linear=bin/linear",
            "--sizes",
            "10,20",
            "--core",
            "1",
            "--threshold",
            "50",
            "--timeout-ms",
            "1000",
        ]);
        let config = resolve_config(&cli).unwrap();

        assert_eq!(config.algorithms.len(), 1);
        assert_eq!(config.sizes, vec![10, 20]);
        assert_eq!(config.effective_core(), Some(1));
        assert_eq!(config.threshold_percent, 50.0);
        assert_eq!(config.timeout_ms, 1000);
    }

    #[test]
    fn no_algorithms_is_a_startup_error() {
        let cli = Cli::parse_from(["fairbench"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn pinning_disabled_from_the_command_line() {
        let cli = Cli::parse_from(["fairbench", "--algorithm", "A=bin/a", "--no-pin"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.effective_core(), None);
    }
}
