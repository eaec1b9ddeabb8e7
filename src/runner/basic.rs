use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::domain::{FailureKind, RunOutcome, RunRequest};
use crate::runner::traits::Runner;

/// Runs one algorithm executable per call: `<path> <input_size>`, stdout
/// piped back for the nanosecond result, stderr left on the parent's stderr
/// so child diagnostics stay visible live.
#[derive(Debug, Default)]
pub struct BasicRunner;

impl BasicRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for BasicRunner {
    #[tracing::instrument(skip(self))]
    async fn run(&self, request: &RunRequest, time_limit: Duration) -> RunOutcome {
        let mut cmd = Command::new(&request.executable_path);
        cmd.arg(request.input_size.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return RunOutcome::Failure {
                    kind: FailureKind::SpawnFailed,
                    detail: format!(
                        "failed to spawn {}: {}",
                        request.executable_path.display(),
                        e
                    ),
                };
            }
        };

        // Best effort: a child that cannot be pinned still runs, it just
        // loses the single-core isolation.
        if let Some(core) = request.target_core {
            if let Err(e) = pin_to_core(&child, core) {
                tracing::warn!("failed to pin child to core {}: {}", core, e);
            }
        }

        let Some(mut stdout) = child.stdout.take() else {
            let _ = child.kill().await;
            return RunOutcome::Failure {
                kind: FailureKind::SpawnFailed,
                detail: "child stdout was not captured".to_string(),
            };
        };

        // The spawn machinery closed the parent's duplicate of the pipe's
        // write end, so EOF arrives exactly when the child's stdout handle
        // closes. Drain to EOF before reaping: the wait cannot block on a
        // full pipe, and output from a failing child is still collected.
        let collect = async {
            let mut raw = Vec::new();
            stdout.read_to_end(&mut raw).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((raw, status))
        };
        let collected = timeout(time_limit, collect).await;

        match collected {
            Err(_elapsed) => {
                // The only path that kills. kill() also reaps, so no orphan
                // or zombie survives a timed-out run.
                if let Err(e) = child.kill().await {
                    tracing::warn!("failed to kill timed-out child: {}", e);
                }
                RunOutcome::Failure {
                    kind: FailureKind::Timeout,
                    detail: format!(
                        "{} did not finish within {:?}",
                        request.executable_path.display(),
                        time_limit
                    ),
                }
            }
            Ok(Err(e)) => {
                let _ = child.kill().await;
                RunOutcome::Failure {
                    kind: FailureKind::SpawnFailed,
                    detail: format!("failed while collecting child output: {}", e),
                }
            }
            Ok(Ok((raw, status))) => {
                let text = String::from_utf8_lossy(&raw);
                let trimmed = text.trim();

                if trimmed.is_empty() {
                    return if status.success() {
                        RunOutcome::Failure {
                            kind: FailureKind::EmptyOutput,
                            detail: "child exited 0 without printing a result".to_string(),
                        }
                    } else {
                        RunOutcome::Failure {
                            kind: FailureKind::NonZeroExit,
                            detail: format!("child failed with {} and printed nothing", status),
                        }
                    };
                }

                match trimmed.parse::<u64>() {
                    Ok(elapsed_ns) => {
                        if !status.success() {
                            tracing::warn!(
                                "child {} exited with {} but still produced a usable result",
                                request.executable_path.display(),
                                status
                            );
                        }
                        RunOutcome::Success { elapsed_ns }
                    }
                    Err(e) => RunOutcome::Failure {
                        kind: FailureKind::UnparsableOutput,
                        detail: format!("cannot parse {:?} as nanoseconds: {}", trimmed, e),
                    },
                }
            }
        }
    }
}

/// Restricts the child to a single logical core via `sched_setaffinity`.
fn pin_to_core(child: &Child, core: usize) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        return Err(std::io::Error::other("child already reaped"));
    };
    // SAFETY: cpu_set_t is plain-old-data, zeroed is a valid empty set, and
    // the set outlives the syscall.
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core, &mut set);
        if libc::sched_setaffinity(
            pid as libc::pid_t,
            std::mem::size_of::<libc::cpu_set_t>(),
            &set,
        ) != 0
        {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}
