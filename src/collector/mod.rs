//! Metrics aggregation: one round of node queries per tick.

pub mod metrics;

use std::time::Instant;

use chrono::Utc;

use crate::client::types::ContractCategory;
use crate::client::{NodeClient, NodeError};

pub use metrics::{CategoryStats, Metrics};

/// Query the node for file, contract, wallet and renter stats, in that
/// order, and fold the results into one snapshot.
///
/// Any sub-query failure aborts the whole round: the caller gets an error
/// and no partial snapshot, and is expected to retry at the next tick. The
/// wall-clock time of the full sequence is recorded as the snapshot's
/// latency.
pub async fn collect(client: &dyn NodeClient) -> Result<Metrics, NodeError> {
    let started = Instant::now();
    let mut snapshot = Metrics {
        timestamp: Utc::now(),
        ..Metrics::default()
    };

    for file in client.list_files().await? {
        snapshot.file_count += 1;
        snapshot.file_uploaded_bytes += file.uploaded_bytes;
        if file.upload_progress < 100.0 {
            snapshot.file_uploads_in_progress += 1;
        } else {
            // Unfinished files are excluded from the finished-bytes tally so
            // the completion numbers only count fully uploaded data.
            snapshot.file_total_bytes += file.size;
        }
    }

    for category in ContractCategory::ALL {
        let contracts = client.list_contracts(category).await?;
        let stats = &mut snapshot.categories[category.index()];
        for contract in &contracts {
            stats.absorb(contract);
        }
    }
    snapshot.reconcile_totals();

    snapshot.wallet = client.wallet().await?;
    snapshot.renter = client.renter_info().await?;

    snapshot.api_latency = started.elapsed();
    Ok(snapshot)
}
