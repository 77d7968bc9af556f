//! End-to-end control loop: a node reporting zero upload progress must fail
//! the run on the first warmed-up tick, request shutdown, and leave a
//! complete CSV record behind.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nodemark::client::types::{
    ContractCategory, ContractEntry, FileEntry, FileStatus, NodeVersion, RenterInfo, WalletInfo,
};
use nodemark::client::{NodeClient, NodeError};
use nodemark::config::Config;
use nodemark::sampler::{Outcome, Sampler};
use nodemark::sink::MetricsSink;

#[derive(Default)]
struct StalledNode {
    shutdown_requested: AtomicBool,
}

#[async_trait]
impl NodeClient for StalledNode {
    async fn list_files(&self) -> Result<Vec<FileEntry>, NodeError> {
        Ok(Vec::new())
    }

    async fn list_contracts(
        &self,
        category: ContractCategory,
    ) -> Result<Vec<ContractEntry>, NodeError> {
        // A few contracts exist but their size never grows.
        if category == ContractCategory::Active {
            Ok(vec![ContractEntry {
                size: 50_000_000,
                ..ContractEntry::default()
            }])
        } else {
            Ok(Vec::new())
        }
    }

    async fn wallet(&self) -> Result<WalletInfo, NodeError> {
        Ok(WalletInfo::default())
    }

    async fn renter_info(&self) -> Result<RenterInfo, NodeError> {
        Ok(RenterInfo::default())
    }

    async fn upload_file(
        &self,
        _local: &Path,
        _remote: &str,
        _data_pieces: u64,
        _parity_pieces: u64,
    ) -> Result<(), NodeError> {
        Ok(())
    }

    async fn file_status(&self, _remote: &str) -> Result<FileStatus, NodeError> {
        Err(NodeError::Api {
            status: 404,
            message: "file not found".to_string(),
        })
    }

    async fn shutdown(&self) -> Result<(), NodeError> {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn version(&self) -> Result<NodeVersion, NodeError> {
        Ok(NodeVersion::default())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn stalled_node_fails_after_warmup_and_gets_shut_down() {
    let dir = tempfile::tempdir().unwrap();
    let uploads_dir = dir.path().join("upload_queue");
    std::fs::create_dir(&uploads_dir).unwrap();
    let metrics_path = dir.path().join("metrics.csv");

    let raw = nodemark::config::DEFAULT_CONFIG
        .replace("measurement_interval = 60", "measurement_interval = 1")
        .replace("measurement_period = 7200", "measurement_period = 2");
    let mut config = Config::load_from_str(&raw).unwrap();
    config.file_uploads_dir = uploads_dir;
    config.metrics_file = metrics_path.clone();

    let node = Arc::new(StalledNode::default());
    let sink = MetricsSink::open(&metrics_path).unwrap();
    let sampler = Sampler::new(Arc::clone(&node) as Arc<dyn NodeClient>, config, sink);

    // Window of 2 slots at 1s ticks: warm-up completes on the third tick,
    // which is the first one allowed to fail the run.
    let outcome = tokio::time::timeout(std::time::Duration::from_secs(30), sampler.run())
        .await
        .expect("run should terminate well within the timeout")
        .unwrap();

    assert_eq!(outcome, Outcome::Failure);
    assert!(node.shutdown_requested.load(Ordering::SeqCst));

    let contents = std::fs::read_to_string(&metrics_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    // Header plus one row per tick; at least warm-up length plus the
    // deciding tick must have been recorded.
    assert!(lines.len() >= 4, "expected 3+ rows, got {}", lines.len() - 1);
    assert!(lines[0].starts_with("timestamp,"));
    for row in &lines[1..] {
        assert!(row.contains(",50000000,"), "contract size missing: {row}");
    }
}
