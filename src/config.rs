use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::AlgorithmSpec;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No algorithms configured. Add [[algorithm]] entries or pass --algorithm NAME=PATH")]
    NoAlgorithms,

    #[error("No input sizes configured")]
    NoSizes,
}

/// The full configuration surface. A TOML file and CLI flags both feed
/// into this; every field has a usable default except the algorithm list.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Ordered `[[algorithm]]` entries; matrix rows follow this order.
    #[serde(rename = "algorithm")]
    pub algorithms: Vec<AlgorithmSpec>,

    /// Ordered input sizes; matrix columns follow this order.
    pub sizes: Vec<u64>,

    /// Logical core the children are pinned to.
    pub target_core: usize,

    /// Set false to run children unpinned.
    pub pin: bool,

    /// A run starts only once CPU utilization is at or below this percent.
    pub threshold_percent: f64,

    /// Hard per-run bound; a child exceeding it is killed.
    pub timeout_ms: u64,

    /// Sleep between idle-gate polls.
    pub poll_interval_ms: u64,

    /// When set, stop gating after this long and run under load. Unset by
    /// default: the gate waits as long as it takes.
    pub idle_max_wait_ms: Option<u64>,

    /// Destination CSV; its directory is created at startup.
    pub output: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            algorithms: Vec::new(),
            sizes: vec![1000, 5000, 10_000, 50_000, 100_000],
            target_core: 0,
            pin: true,
            threshold_percent: 20.0,
            timeout_ms: 30_000,
            poll_interval_ms: 50,
            idle_max_wait_ms: None,
            output: PathBuf::from("results/results.csv"),
        }
    }
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.algorithms.is_empty() {
            return Err(ConfigError::NoAlgorithms);
        }
        if self.sizes.is_empty() {
            return Err(ConfigError::NoSizes);
        }
        Ok(())
    }

    /// The core children get pinned to, or None when pinning is off.
    pub fn effective_core(&self) -> Option<usize> {
        self.pin.then_some(self.target_core)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use tempfile::NamedTempFile;

    use super::*;

    const FULL_CONFIG: &str = r#"
sizes = [10, 20, 30]
target_core = 2
pin = true
threshold_percent = 15.0
timeout_ms = 10000
poll_interval_ms = 25
idle_max_wait_ms = 5000
output = "out/bench.csv"

[[algorithm]]
name = "Linear Search"
path = "build/linear"

[[algorithm]]
name = "Binary Search"
path = "build/binary"
"#;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_full_config_in_order() {
        let file = write_config(FULL_CONFIG);
        let config = BenchConfig::load(file.path()).unwrap();

        assert_eq!(config.sizes, vec![10, 20, 30]);
        assert_eq!(config.target_core, 2);
        assert_eq!(config.threshold_percent, 15.0);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.poll_interval_ms, 25);
        assert_eq!(config.idle_max_wait_ms, Some(5000));
        assert_eq!(config.output, PathBuf::from("out/bench.csv"));

        let names: Vec<&str> = config
            .algorithms
            .iter()
            .map(|a| a.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Linear Search", "Binary Search"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let file = write_config(
            r#"
[[algorithm]]
name = "Linear Search"
path = "build/linear"
"#,
        );
        let config = BenchConfig::load(file.path()).unwrap();

        assert_eq!(config.sizes, vec![1000, 5000, 10_000, 50_000, 100_000]);
        assert_eq!(config.target_core, 0);
        assert_eq!(config.threshold_percent, 20.0);
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.idle_max_wait_ms, None);
        assert_eq!(config.output, PathBuf::from("results/results.csv"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("algorthms = []\n");
        assert!(matches!(
            BenchConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn empty_matrix_axes_fail_validation() {
        let config = BenchConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoAlgorithms)));

        let config = BenchConfig {
            algorithms: vec![AlgorithmSpec {
                display_name: "x".to_string(),
                executable_path: PathBuf::from("/bin/true"),
            }],
            sizes: Vec::new(),
            ..BenchConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoSizes)));
    }

    #[test]
    fn pinning_can_be_disabled() {
        let config = BenchConfig {
            target_core: 3,
            ..BenchConfig::default()
        };
        assert_eq!(config.effective_core(), Some(3));

        let config = BenchConfig {
            pin: false,
            ..config
        };
        assert_eq!(config.effective_core(), None);
    }
}
