use std::time::Duration;

use crate::domain::{RunOutcome, RunRequest};
use crate::runner::traits::Runner;

/// Canned runner: answers every request with a fixed outcome after an
/// optional delay. Backs `--dry-run` and the driver tests.
#[derive(Debug, Clone)]
pub struct StubRunner {
    outcome: RunOutcome,
    delay: Duration,
}

impl StubRunner {
    pub fn new(outcome: RunOutcome, delay: Duration) -> Self {
        Self { outcome, delay }
    }
}

#[async_trait::async_trait]
impl Runner for StubRunner {
    #[tracing::instrument]
    async fn run(&self, request: &RunRequest, time_limit: Duration) -> RunOutcome {
        tracing::debug!(
            "stub run: request={:?}, time_limit={:?}",
            request,
            time_limit
        );
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}
