//! The benchmark control loop.
//!
//! One cooperative loop ticks at wall-clock-aligned instants. Each tick:
//! collect a snapshot, persist it, record bandwidth, log progress, evaluate
//! exit conditions, sweep finished uploads, and maybe launch a new batch.
//! Upload batches run in the background; the loop never blocks on them.

pub mod exit;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::bandwidth::BandwidthTracker;
use crate::client::NodeClient;
use crate::collector::{self, Metrics};
use crate::config::Config;
use crate::report::{format_bytes, format_rate};
use crate::sink::MetricsSink;
use crate::uploader::{UploadConfig, UploadScheduler};

pub use exit::{ExitPolicy, Outcome};

pub struct Sampler {
    client: Arc<dyn NodeClient>,
    config: Config,
    tracker: BandwidthTracker,
    policy: ExitPolicy,
    scheduler: UploadScheduler,
    sink: MetricsSink,
}

impl Sampler {
    pub fn new(client: Arc<dyn NodeClient>, config: Config, sink: MetricsSink) -> Self {
        let tracker = BandwidthTracker::new(config.measurement_interval, config.measurement_period);
        let policy = ExitPolicy {
            min_upload_rate: config.min_upload_rate,
            success_threshold: config.success_size_threshold,
        };
        let scheduler = UploadScheduler::new(
            Arc::clone(&client),
            UploadConfig {
                uploads_dir: config.file_uploads_dir.clone(),
                file_size: config.file_size,
                data_pieces: config.file_data_pieces,
                parity_pieces: config.file_parity_pieces,
                max_concurrent: config.max_concurrent_uploads,
                success_threshold: config.success_size_threshold,
            },
        );
        Self {
            client,
            config,
            tracker,
            policy,
            scheduler,
            sink,
        }
    }

    /// Run until an exit condition fires. Watch-only runs never return.
    ///
    /// A failed metrics round skips the tick; a failed CSV write ends the
    /// run with an error, because a benchmark record with holes in it is
    /// worthless.
    pub async fn run(mut self) -> Result<Outcome> {
        let interval = Duration::from_secs(self.config.measurement_interval);
        info!(
            interval_secs = self.config.measurement_interval,
            window_slots = self.tracker.window_size(),
            watch_only = self.config.watch_only,
            "sampler started"
        );

        loop {
            sleep_until_aligned(interval).await;

            let snapshot = match collector::collect(self.client.as_ref()).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(error = %e, "metrics round failed, skipping tick");
                    continue;
                }
            };

            self.sink
                .append(&snapshot)
                .context("persisting metrics row")?;

            let current = self.tracker.record(snapshot.contract_totals.size);
            let average = self.tracker.average();
            self.log_progress(&snapshot, current, average);

            if self.config.watch_only {
                continue;
            }

            if let Some(outcome) = self.policy.check(
                self.tracker.warmed_up(),
                average,
                snapshot.file_total_bytes,
            ) {
                self.report_outcome(outcome, &snapshot, average);
                if self.config.stop_node_on_exit {
                    info!("requesting node shutdown");
                    if let Err(e) = self.client.shutdown().await {
                        // The benchmark already concluded; a stuck node is
                        // the operator's problem now.
                        error!(error = %e, "node shutdown request failed");
                    }
                }
                return Ok(outcome);
            }

            if let Err(e) = self.scheduler.sweep().await {
                error!(error = %e, "finished-upload sweep failed");
            }
            self.scheduler.maybe_launch(&snapshot);
        }
    }

    fn log_progress(&self, snapshot: &Metrics, current: u64, average: u64) {
        // Contract size can be zero before the first contracts form.
        let efficiency = if snapshot.contract_totals.size > 0 {
            snapshot.file_total_bytes as f64 / snapshot.contract_totals.size as f64 * 100.0
        } else {
            0.0
        };
        info!(
            latency = ?snapshot.api_latency,
            files = snapshot.file_count,
            uploading = snapshot.file_uploads_in_progress,
            file_data = %format_bytes(snapshot.file_total_bytes),
            contract_data = %format_bytes(snapshot.contract_totals.size),
            efficiency = %format!("{efficiency:.2}%"),
            current = %format_rate(current),
            average = %format_rate(average),
            spent = %snapshot.contract_totals.total_spending().to_coins_string(),
            remaining = %snapshot.contract_totals.remaining_funds.to_coins_string(),
            "tick"
        );
    }

    fn report_outcome(&self, outcome: Outcome, snapshot: &Metrics, average: u64) {
        match outcome {
            Outcome::Failure => {
                warn!(
                    average = %format_rate(average),
                    floor = %format_rate(self.policy.min_upload_rate),
                    "average upload rate fell below the configured floor"
                );
                warn!(
                    file_data = %format_bytes(snapshot.file_total_bytes),
                    contract_data = %format_bytes(snapshot.contract_totals.size),
                    "benchmark failed"
                );
            }
            Outcome::Success => {
                info!(
                    file_data = %format_bytes(snapshot.file_total_bytes),
                    threshold = %format_bytes(self.policy.success_threshold),
                    "uploaded file data reached the configured threshold"
                );
                info!(
                    contract_data = %format_bytes(snapshot.contract_totals.size),
                    spent = %snapshot.contract_totals.total_spending().to_coins_string(),
                    "benchmark succeeded"
                );
            }
        }
    }
}

/// Sleep until the next wall-clock multiple of `interval`.
///
/// Aligning to the clock instead of sleeping a fixed duration keeps tick
/// timestamps stable across restarts and immune to per-tick drift.
async fn sleep_until_aligned(interval: Duration) {
    tokio::time::sleep(until_next_aligned(interval, now_unix())).await;
}

fn now_unix() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

fn until_next_aligned(interval: Duration, now: Duration) -> Duration {
    let interval_ms = interval.as_millis().max(1);
    let now_ms = now.as_millis();
    let next_ms = (now_ms / interval_ms + 1) * interval_ms;
    Duration::from_millis((next_ms - now_ms) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wakes_on_the_next_interval_boundary() {
        let interval = Duration::from_secs(60);
        // 13s past a boundary -> 47s to the next one.
        let wait = until_next_aligned(interval, Duration::from_secs(3 * 60 + 13));
        assert_eq!(wait, Duration::from_secs(47));
    }

    #[test]
    fn a_tick_on_the_boundary_waits_a_full_interval() {
        let interval = Duration::from_secs(60);
        let wait = until_next_aligned(interval, Duration::from_secs(120));
        assert_eq!(wait, Duration::from_secs(60));
    }

    #[test]
    fn alignment_is_sub_second_precise() {
        let interval = Duration::from_secs(1);
        let wait = until_next_aligned(interval, Duration::from_millis(1500));
        assert_eq!(wait, Duration::from_millis(500));
    }
}
