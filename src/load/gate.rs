use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::load::sampler::CpuLoadSampler;

/// Polling barrier: blocks a benchmark run until CPU utilization drops to
/// the threshold, so every child starts under comparable conditions.
#[derive(Debug)]
pub struct IdleGate {
    sampler: CpuLoadSampler,
    threshold_percent: f64,
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl IdleGate {
    pub fn new(
        threshold_percent: f64,
        poll_interval: Duration,
        max_wait: Option<Duration>,
    ) -> Self {
        Self {
            sampler: CpuLoadSampler::new(),
            threshold_percent,
            poll_interval,
            max_wait,
        }
    }

    /// Returns once utilization is at or below the threshold. Without
    /// `max_wait` this can block indefinitely on a loaded machine; with it,
    /// the gate logs a warning after the bound and lets the run proceed.
    pub async fn wait_until_idle(&mut self) {
        let started = Instant::now();
        loop {
            let usage = self.sampler.sample();
            if usage <= self.threshold_percent {
                return;
            }
            if let Some(bound) = self.max_wait {
                if started.elapsed() >= bound {
                    tracing::warn!(
                        usage,
                        "idle wait exceeded {:?}, proceeding under load",
                        bound
                    );
                    return;
                }
            }
            tracing::trace!(usage, "cpu above threshold, waiting");
            sleep(self.poll_interval).await;
        }
    }
}
