use std::time::Duration;

use crate::domain::{RunOutcome, RunRequest};

/// Executes one child run. Every call yields exactly one outcome; failures
/// are reported through the `RunOutcome` variants, never by panicking.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Runner: std::fmt::Debug + Send + Sync {
    async fn run(&self, request: &RunRequest, time_limit: Duration) -> RunOutcome;
}
