use std::sync::Arc;
use std::time::Duration;

use crate::config::BenchConfig;
use crate::domain::{AlgorithmSpec, CellOutcome, FailureKind, ResultRow, RunOutcome, RunRequest};
use crate::load::gate::IdleGate;
use crate::report::ReportSink;
use crate::runner::traits::Runner;

/// The matrix axes and per-run knobs the driver needs; carved out of the
/// full config so the driver stays ignorant of file paths and CLI concerns.
#[derive(Clone, Debug)]
pub struct DriverSettings {
    pub algorithms: Vec<AlgorithmSpec>,
    pub sizes: Vec<u64>,
    pub target_core: Option<usize>,
    pub time_limit: Duration,
}

impl From<&BenchConfig> for DriverSettings {
    fn from(config: &BenchConfig) -> Self {
        Self {
            algorithms: config.algorithms.clone(),
            sizes: config.sizes.clone(),
            target_core: config.effective_core(),
            time_limit: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Walks the (algorithm × size) matrix strictly in order, one child at a
/// time: gate on idleness, run, relay the row. A failing cell is logged and
/// skipped; the matrix always runs to completion.
#[derive(Debug)]
pub struct BenchmarkDriver {
    runner: Arc<dyn Runner>,
    gate: IdleGate,
    sink: Box<dyn ReportSink>,
    settings: DriverSettings,
}

impl BenchmarkDriver {
    pub fn new(
        runner: Arc<dyn Runner>,
        gate: IdleGate,
        sink: Box<dyn ReportSink>,
        settings: DriverSettings,
    ) -> Self {
        Self {
            runner,
            gate,
            sink,
            settings,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run_all(&mut self) -> Vec<CellOutcome> {
        let algorithms = self.settings.algorithms.clone();
        let sizes = self.settings.sizes.clone();
        let mut outcomes = Vec::with_capacity(algorithms.len() * sizes.len());

        for algorithm in &algorithms {
            if !algorithm.executable_path.exists() {
                tracing::error!(
                    "executable not found: {} ({}), skipping all sizes",
                    algorithm.executable_path.display(),
                    algorithm.display_name
                );
                for &size in &sizes {
                    outcomes.push(CellOutcome {
                        algorithm: algorithm.clone(),
                        input_size: size,
                        outcome: RunOutcome::Failure {
                            kind: FailureKind::ExecutableNotFound,
                            detail: algorithm.executable_path.display().to_string(),
                        },
                    });
                }
                continue;
            }

            println!("{}:", algorithm.display_name);

            for &size in &sizes {
                self.gate.wait_until_idle().await;

                let request = RunRequest {
                    executable_path: algorithm.executable_path.clone(),
                    input_size: size,
                    target_core: self.settings.target_core,
                };
                let outcome = self.runner.run(&request, self.settings.time_limit).await;

                match &outcome {
                    RunOutcome::Success { elapsed_ns } => {
                        let row = ResultRow {
                            algorithm_name: algorithm.display_name.clone(),
                            input_size: size,
                            elapsed_ns: *elapsed_ns,
                        };
                        if let Err(e) = self.sink.record(&row) {
                            tracing::error!(
                                "failed to record {} N={}: {}",
                                algorithm.display_name,
                                size,
                                e
                            );
                        }
                        println!(
                            "  N={} | {} ns ({:.3} µs)",
                            size,
                            elapsed_ns,
                            *elapsed_ns as f64 / 1000.0
                        );
                    }
                    RunOutcome::Failure { kind, detail } => {
                        tracing::error!(
                            %kind,
                            "run failed for {} with N={}: {}",
                            algorithm.display_name,
                            size,
                            detail
                        );
                    }
                }

                outcomes.push(CellOutcome {
                    algorithm: algorithm.clone(),
                    input_size: size,
                    outcome,
                });
            }

            println!("----------------------------");
        }

        if let Err(e) = self.sink.finish() {
            tracing::error!("failed to finalize results file: {}", e);
        }
        outcomes
    }
}
