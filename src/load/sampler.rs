use std::fs;

const PROC_STAT: &str = "/proc/stat";

/// Cumulative tick counters from one `/proc/stat` snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Delta-based CPU utilization over the aggregate `cpu ` line. Holds the
/// previous snapshot as instance state; one serial caller per instance.
#[derive(Debug)]
pub struct CpuLoadSampler {
    prev: CpuTimes,
}

impl CpuLoadSampler {
    /// Seeds the baseline snapshot so the first `sample` call already
    /// compares against real counters instead of zeroes.
    pub fn new() -> Self {
        Self {
            prev: read_aggregate(),
        }
    }

    /// Instantaneous utilization in percent (0..=100) since the previous
    /// call. Two calls with no elapsed ticks between them read as 0.
    pub fn sample(&mut self) -> f64 {
        let current = read_aggregate();
        let usage = usage_percent(self.prev, current);
        self.prev = current;
        usage
    }
}

impl Default for CpuLoadSampler {
    fn default() -> Self {
        Self::new()
    }
}

// An unreadable /proc/stat yields zeroed counters, which read as idle; the
// gate then never blocks on a platform without it.
fn read_aggregate() -> CpuTimes {
    let raw = fs::read_to_string(PROC_STAT).unwrap_or_default();
    parse_aggregate(&raw).unwrap_or_default()
}

/// First line of `/proc/stat`: `cpu  user nice system idle iowait irq ...`,
/// cumulative ticks. Idle counts idle + iowait.
fn parse_aggregate(raw: &str) -> Option<CpuTimes> {
    let line = raw.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|s| s.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    let total = fields.iter().sum();
    Some(CpuTimes { idle, total })
}

fn usage_percent(prev: CpuTimes, current: CpuTimes) -> f64 {
    let total_delta = current.total.saturating_sub(prev.total);
    if total_delta == 0 {
        return 0.0;
    }
    let idle_delta = current.idle.saturating_sub(prev.idle);
    100.0 * (1.0 - idle_delta as f64 / total_delta as f64)
}
