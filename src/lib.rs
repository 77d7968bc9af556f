//! nodemark -- long-running upload benchmark for storage-network nodes.
//!
//! This crate drives a remote storage node through its renter API: it
//! continuously generates and uploads synthetic files, samples node-reported
//! metrics on wall-clock-aligned intervals, tracks a sliding-window average
//! of achieved upload throughput, and ends the run when throughput sustains
//! below a configured floor (failure) or a configured amount of data has
//! been uploaded (success).

pub mod bandwidth;
pub mod client;
pub mod collector;
pub mod config;
pub mod currency;
pub mod report;
pub mod sampler;
pub mod sink;
pub mod uploader;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::client::http::HttpNodeClient;
use crate::client::NodeClient;
use crate::config::Config;
use crate::sampler::{Outcome, Sampler};
use crate::sink::MetricsSink;

/// Connect to the node, open the metrics sink, and run the benchmark loop
/// until an exit condition fires. Watch-only runs never return.
pub async fn run(mut config: Config) -> Result<Outcome> {
    if !config.watch_only {
        let dir = std::fs::metadata(&config.file_uploads_dir)
            .with_context(|| format!("upload queue dir {:?}", config.file_uploads_dir))?;
        anyhow::ensure!(
            dir.is_dir(),
            "upload queue path {:?} is not a directory",
            config.file_uploads_dir
        );
        config.file_uploads_dir = config
            .file_uploads_dir
            .canonicalize()
            .context("resolving upload queue dir")?;
    }

    let client: Arc<dyn NodeClient> = Arc::new(HttpNodeClient::new(&config)?);

    let version = client.version().await.context("connecting to node")?;
    tracing::info!(
        version = %version.version,
        revision = %version.revision,
        "connected to node"
    );

    let sink = MetricsSink::open(Path::new(&config.metrics_file))
        .with_context(|| format!("opening metrics file {:?}", config.metrics_file))?;

    Sampler::new(client, config, sink).run().await
}
