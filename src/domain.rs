use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct AlgorithmSpec {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "path")]
    pub executable_path: PathBuf,
}

/// One matrix cell handed to the runner. Built fresh per run, never shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
    pub executable_path: PathBuf,
    pub input_size: u64,
    pub target_core: Option<usize>,
}

/// What a single child run produced. A `Failure` carries no elapsed time;
/// callers branch on the variant, never on a numeric sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Success { elapsed_ns: u64 },
    Failure { kind: FailureKind, detail: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    ExecutableNotFound,
    SpawnFailed,
    Timeout,
    NonZeroExit,
    EmptyOutput,
    UnparsableOutput,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ExecutableNotFound => "executable not found",
            FailureKind::SpawnFailed => "spawn failed",
            FailureKind::Timeout => "timeout",
            FailureKind::NonZeroExit => "non-zero exit",
            FailureKind::EmptyOutput => "empty output",
            FailureKind::UnparsableOutput => "unparsable output",
        };
        f.write_str(name)
    }
}

/// The durable artifact: one CSV row per successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    pub algorithm_name: String,
    pub input_size: u64,
    pub elapsed_ns: u64,
}

/// One (algorithm, size) cell together with how its run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellOutcome {
    pub algorithm: AlgorithmSpec,
    pub input_size: u64,
    pub outcome: RunOutcome,
}
