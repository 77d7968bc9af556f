//! Bounded-concurrency upload batches and finished-upload cleanup.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::client::NodeClient;
use crate::collector::Metrics;

/// How much random content is drawn and written per syscall.
const GENERATE_CHUNK: usize = 256 * 1024;

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub uploads_dir: PathBuf,
    pub file_size: u64,
    pub data_pieces: u64,
    pub parity_pieces: u64,
    pub max_concurrent: u64,
    /// 0 disables the overshoot guard along with the success condition.
    pub success_threshold: u64,
}

/// Launches batches of upload workers and sweeps finished uploads.
///
/// At most one batch is ever in flight: the `in_flight` flag is claimed with
/// a compare-exchange before spawning and released only after every worker
/// in the batch has joined, so overlapping batches cannot happen even when
/// ticks race the batch task.
pub struct UploadScheduler {
    client: Arc<dyn NodeClient>,
    config: UploadConfig,
    in_flight: Arc<AtomicBool>,
}

impl UploadScheduler {
    pub fn new(client: Arc<dyn NodeClient>, config: UploadConfig) -> Self {
        Self {
            client,
            config,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn batch_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Launch a new upload batch if the snapshot allows one. Returns whether
    /// a batch was started.
    ///
    /// A batch is only started when there are free upload slots, enough
    /// active contracts to place every erasure-coded piece, and uploading
    /// more would not overshoot the success threshold (counting uploads
    /// already in flight at their full configured size).
    pub fn maybe_launch(&self, snapshot: &Metrics) -> bool {
        use crate::client::types::ContractCategory;

        let cfg = &self.config;
        if snapshot.file_uploads_in_progress >= cfg.max_concurrent {
            return false;
        }
        if snapshot.category(ContractCategory::Active).count < cfg.data_pieces + cfg.parity_pieces {
            return false;
        }
        if cfg.success_threshold > 0
            && snapshot.file_total_bytes + snapshot.file_uploads_in_progress * cfg.file_size
                >= cfg.success_threshold
        {
            return false;
        }
        // Claim the batch slot last; losing the race means a batch is
        // already running and this tick does nothing.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let workers = cfg.max_concurrent - snapshot.file_uploads_in_progress;
        debug!(workers, "starting upload batch");

        let client = Arc::clone(&self.client);
        let config = cfg.clone();
        let guard = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            let mut handles = Vec::with_capacity(workers as usize);
            for _ in 0..workers {
                let client = Arc::clone(&client);
                let config = config.clone();
                handles.push(tokio::spawn(async move {
                    if let Err(e) = upload_one(client.as_ref(), &config).await {
                        warn!(error = %e, "upload worker failed");
                    }
                }));
            }
            // One worker failing or panicking never cancels its siblings;
            // the batch slot frees only when all of them are done.
            for joined in futures::future::join_all(handles).await {
                if let Err(e) = joined {
                    warn!(error = %e, "upload worker panicked");
                }
            }
            guard.store(false, Ordering::Release);
            debug!("upload batch finished");
        });
        true
    }

    /// Delete local copies of files the node reports as fully uploaded and
    /// fully redundant. Files whose status query fails are left alone until
    /// a later tick.
    pub async fn sweep(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.config.uploads_dir)
            .await
            .with_context(|| format!("reading {:?}", self.config.uploads_dir))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("iterating upload queue dir")?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let status = match self.client.file_status(&remote_path(&name)).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(file = %name, error = %e, "status query failed, keeping local copy");
                    continue;
                }
            };
            if status.upload_progress >= 100.0 && status.health_percent >= 100.0 {
                debug!(file = %name, "upload complete, removing local copy");
                if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                    warn!(file = %name, error = %e, "failed to remove finished upload");
                }
            }
        }
        Ok(())
    }
}

async fn upload_one(client: &dyn NodeClient, config: &UploadConfig) -> Result<()> {
    let name = random_name();
    let local = config.uploads_dir.join(&name);

    if let Err(e) = write_random_file(&local, config.file_size).await {
        let _ = tokio::fs::remove_file(&local).await;
        return Err(e);
    }

    if let Err(e) = client
        .upload_file(
            &local,
            &remote_path(&name),
            config.data_pieces,
            config.parity_pieces,
        )
        .await
    {
        // Never leave an orphaned local file behind a failed upload.
        let _ = tokio::fs::remove_file(&local).await;
        return Err(e).with_context(|| format!("uploading {name}"));
    }

    debug!(file = %name, "upload submitted");
    Ok(())
}

/// Remote destination for a local file name, sharded by its first two
/// characters to keep remote directories shallow.
pub fn remote_path(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) => format!("{a}/{b}/{name}"),
        _ => name.to_string(),
    }
}

fn random_name() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{hex}.dat")
}

/// Fill a new file with `size` bytes of unpredictable content. Compressible
/// or repeated content would let the node cheat the benchmark.
async fn write_random_file(path: &Path, size: u64) -> Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("creating {path:?}"))?;

    let mut remaining = size;
    let mut buf = vec![0u8; GENERATE_CHUNK];
    while remaining > 0 {
        let n = remaining.min(GENERATE_CHUNK as u64) as usize;
        OsRng.fill_bytes(&mut buf[..n]);
        file.write_all(&buf[..n])
            .await
            .with_context(|| format!("writing {path:?}"))?;
        remaining -= n as u64;
    }
    file.flush().await.context("flushing generated file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_paths_shard_on_leading_characters() {
        assert_eq!(remote_path("ab12.dat"), "a/b/ab12.dat");
        assert_eq!(remote_path("x"), "x");
    }

    #[test]
    fn random_names_are_unique_hex() {
        let a = random_name();
        let b = random_name();
        assert_ne!(a, b);
        assert!(a.ends_with(".dat"));
        assert_eq!(a.len(), 32 + 4);
    }

    #[tokio::test]
    async fn generated_files_have_exact_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.dat");
        write_random_file(&path, 300_000).await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 300_000);
    }
}
