//! Benchmark configuration: TOML file with a commented default template.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default configuration template, written on first run so operators edit a
/// documented file instead of starting from nothing.
pub const DEFAULT_CONFIG: &str = r#"# nodemark configuration

# Node API config
node_api_url        = "127.0.0.1:9980"
node_api_password   = ""
node_api_user_agent = "Sia-Agent"

# If watch_only is enabled the benchmark will not upload anything and never
# checks the exit conditions. It only monitors the node and records metrics.
watch_only = false

# Allowance settings, used when provisioning the node (informational for the
# benchmark itself).
allowance        = 1000    # coins
allowance_period = 12096   # blocks, roughly three months
host_count       = 50

# Erasure-coding width for uploaded files.
file_data_pieces   = 10
file_parity_pieces = 20

# Test parameters
file_size              = 1000000000 # bytes per generated file, 1 GB
max_concurrent_uploads = 10
min_upload_rate        = 1000000    # bytes/second the window average must sustain

# How often to poll the node for metrics, in seconds.
measurement_interval = 60

# Window for averaging bandwidth, in seconds. Must be a multiple of the
# interval. With a 1 MB/s floor and a two hour window the run only fails if
# throughput stays below 1 MB/s for two full hours.
measurement_period = 7200

# Total finished-upload bytes at which the run succeeds. 0 disables the
# success condition: the run continues until the bandwidth floor is crossed.
success_size_threshold = 1000000000000 # 1 TB

# Where generated files are staged until the node confirms the upload.
file_uploads_dir = "upload_queue"

# Where metric rows are appended.
metrics_file = "metrics.csv"

# Whether to ask the node to shut down when the run ends.
stop_node_on_exit = true
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub node_api_url: String,
    pub node_api_password: String,
    pub node_api_user_agent: String,

    pub watch_only: bool,

    pub allowance: u64,
    pub allowance_period: u64,
    pub host_count: u64,
    pub file_data_pieces: u64,
    pub file_parity_pieces: u64,

    pub file_size: u64,
    pub max_concurrent_uploads: u64,
    pub min_upload_rate: u64,
    pub measurement_interval: u64,
    pub measurement_period: u64,
    pub success_size_threshold: u64,

    pub file_uploads_dir: PathBuf,
    #[serde(default = "default_metrics_file")]
    pub metrics_file: PathBuf,
    pub stop_node_on_exit: bool,
}

fn default_metrics_file() -> PathBuf {
    PathBuf::from("metrics.csv")
}

impl Config {
    /// Load from `path`. A missing file is created from [`DEFAULT_CONFIG`]
    /// and then loaded, so a bare first run produces an editable template.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            std::fs::write(path, DEFAULT_CONFIG)
                .with_context(|| format!("writing default config to {path:?}"))?;
            tracing::info!(path = %path.display(), "wrote default configuration");
        }
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path:?}"))?;
        Self::load_from_str(&raw)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).context("parsing config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.node_api_url.is_empty(),
            "node_api_url must be non-empty"
        );
        anyhow::ensure!(
            self.measurement_interval > 0,
            "measurement_interval must be > 0, got {}",
            self.measurement_interval
        );
        anyhow::ensure!(
            self.measurement_period >= self.measurement_interval,
            "measurement_period ({}) must be at least measurement_interval ({})",
            self.measurement_period,
            self.measurement_interval
        );
        anyhow::ensure!(
            self.measurement_period % self.measurement_interval == 0,
            "measurement_period ({}) must be a multiple of measurement_interval ({})",
            self.measurement_period,
            self.measurement_interval
        );
        if !self.watch_only {
            anyhow::ensure!(self.file_size > 0, "file_size must be > 0");
            anyhow::ensure!(
                self.max_concurrent_uploads > 0,
                "max_concurrent_uploads must be > 0"
            );
            anyhow::ensure!(self.file_data_pieces > 0, "file_data_pieces must be > 0");
            anyhow::ensure!(
                self.file_uploads_dir.as_os_str() != "",
                "file_uploads_dir must be non-empty"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_and_validates() {
        let config = Config::load_from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.measurement_interval, 60);
        assert_eq!(config.measurement_period, 7200);
        assert_eq!(config.metrics_file, PathBuf::from("metrics.csv"));
        assert!(!config.watch_only);
    }

    #[test]
    fn rejects_period_not_multiple_of_interval() {
        let raw = DEFAULT_CONFIG.replace("measurement_period = 7200", "measurement_period = 90");
        let err = Config::load_from_str(&raw).unwrap_err();
        assert!(err.to_string().contains("multiple"));
    }

    #[test]
    fn rejects_zero_interval() {
        let raw =
            DEFAULT_CONFIG.replace("measurement_interval = 60", "measurement_interval = 0");
        assert!(Config::load_from_str(&raw).is_err());
    }

    #[test]
    fn watch_only_skips_upload_validation() {
        let raw = DEFAULT_CONFIG
            .replace("watch_only = false", "watch_only = true")
            .replace("file_size              = 1000000000", "file_size              = 0");
        let config = Config::load_from_str(&raw).unwrap();
        assert!(config.watch_only);
    }

    #[test]
    fn missing_file_is_seeded_with_the_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benchmark.toml");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.node_api_url, "127.0.0.1:9980");
        assert!(path.exists());
    }
}
