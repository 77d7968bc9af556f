//! The per-tick metrics snapshot and its CSV column layout.
//!
//! Columns are declared statically as (name, accessor) pairs so the header
//! row stays stable without any runtime introspection of the struct.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::client::types::{ContractCategory, ContractEntry, RenterInfo, WalletInfo};
use crate::currency::Currency;

/// Aggregated stats for one contract lifecycle category.
#[derive(Debug, Clone, Default)]
pub struct CategoryStats {
    pub count: u64,
    pub size: u64,
    pub remaining_funds: Currency,
    pub fee_spending: Currency,
    pub storage_spending: Currency,
    pub upload_spending: Currency,
    pub download_spending: Currency,
}

impl CategoryStats {
    /// Fold one contract into this category's totals.
    pub fn absorb(&mut self, contract: &ContractEntry) {
        self.count += 1;
        self.size += contract.size;
        self.remaining_funds += &contract.renter_funds;
        self.fee_spending += &contract.fees;
        self.storage_spending += &contract.storage_spending;
        self.upload_spending += &contract.upload_spending;
        self.download_spending += &contract.download_spending;
    }

    /// Fold another category into a grand total.
    pub fn accumulate(&mut self, other: &CategoryStats) {
        self.count += other.count;
        self.size += other.size;
        self.remaining_funds += &other.remaining_funds;
        self.fee_spending += &other.fee_spending;
        self.storage_spending += &other.storage_spending;
        self.upload_spending += &other.upload_spending;
        self.download_spending += &other.download_spending;
    }

    /// Sum of all four spending buckets.
    pub fn total_spending(&self) -> Currency {
        let mut total = Currency::zero();
        total += &self.fee_spending;
        total += &self.storage_spending;
        total += &self.upload_spending;
        total += &self.download_spending;
        total
    }
}

/// One immutable snapshot of node state, captured per tick.
///
/// `contract_totals` is always computed from `categories`, never fetched, so
/// the grand total reconciles with the per-category sums by construction.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub timestamp: DateTime<Utc>,
    pub api_latency: Duration,

    pub file_count: u64,
    /// Bytes of fully uploaded files only. Partial uploads are excluded so
    /// completion-rate numbers are not skewed by work still in flight.
    pub file_total_bytes: u64,
    pub file_uploaded_bytes: u64,
    pub file_uploads_in_progress: u64,

    pub categories: [CategoryStats; ContractCategory::ALL.len()],
    pub contract_totals: CategoryStats,

    pub wallet: WalletInfo,
    pub renter: RenterInfo,
}

impl Metrics {
    pub fn category(&self, category: ContractCategory) -> &CategoryStats {
        &self.categories[category.index()]
    }

    /// Recompute the grand total from the per-category stats.
    pub fn reconcile_totals(&mut self) {
        let mut totals = CategoryStats::default();
        for stats in &self.categories {
            totals.accumulate(stats);
        }
        self.contract_totals = totals;
    }

    /// Flattened CSV header, in the same order as [`Metrics::values`].
    pub fn headers() -> Vec<String> {
        let mut headers: Vec<String> =
            HEAD_COLUMNS.iter().map(|(name, _)| name.to_string()).collect();
        for category in ContractCategory::ALL {
            for (name, _) in CATEGORY_COLUMNS {
                headers.push(format!("{name}_{category}"));
            }
        }
        for (name, _) in CATEGORY_COLUMNS {
            headers.push(format!("{name}_total"));
        }
        headers.extend(TAIL_COLUMNS.iter().map(|(name, _)| name.to_string()));
        headers
    }

    /// One CSV row: timestamps in UTC ISO-8601, counts as decimal integers,
    /// currency as exact base-unit decimal text.
    pub fn values(&self) -> Vec<String> {
        let mut values: Vec<String> = HEAD_COLUMNS.iter().map(|(_, get)| get(self)).collect();
        for category in ContractCategory::ALL {
            let stats = self.category(category);
            for (_, get) in CATEGORY_COLUMNS {
                values.push(get(stats));
            }
        }
        for (_, get) in CATEGORY_COLUMNS {
            values.push(get(&self.contract_totals));
        }
        values.extend(TAIL_COLUMNS.iter().map(|(_, get)| get(self)));
        values
    }
}

type MetricsColumn = (&'static str, fn(&Metrics) -> String);
type CategoryColumn = (&'static str, fn(&CategoryStats) -> String);

static HEAD_COLUMNS: &[MetricsColumn] = &[
    ("timestamp", |m| {
        m.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }),
    ("api_latency", |m| format!("{:?}", m.api_latency)),
    ("file_count", |m| m.file_count.to_string()),
    ("file_total_bytes", |m| m.file_total_bytes.to_string()),
    ("file_uploads_in_progress_count", |m| {
        m.file_uploads_in_progress.to_string()
    }),
    ("file_uploaded_bytes", |m| m.file_uploaded_bytes.to_string()),
];

static CATEGORY_COLUMNS: &[CategoryColumn] = &[
    ("contract_count", |c| c.count.to_string()),
    ("contract_size", |c| c.size.to_string()),
    ("contract_remaining_funds", |c| c.remaining_funds.to_string()),
    ("contract_fee_spending", |c| c.fee_spending.to_string()),
    ("contract_storage_spending", |c| c.storage_spending.to_string()),
    ("contract_upload_spending", |c| c.upload_spending.to_string()),
    ("contract_download_spending", |c| c.download_spending.to_string()),
];

static TAIL_COLUMNS: &[MetricsColumn] = &[
    ("wallet_confirmed_balance", |m| {
        m.wallet.confirmed_balance.to_string()
    }),
    ("wallet_unconfirmed_incoming", |m| {
        m.wallet.unconfirmed_incoming.to_string()
    }),
    ("wallet_unconfirmed_outgoing", |m| {
        m.wallet.unconfirmed_outgoing.to_string()
    }),
    ("renter_allowance", |m| m.renter.allowance_funds.to_string()),
    ("renter_contract_fees", |m| m.renter.contract_fees.to_string()),
    ("renter_total_allocated", |m| {
        m.renter.total_allocated.to_string()
    }),
    ("renter_download_spending", |m| {
        m.renter.download_spending.to_string()
    }),
    ("renter_storage_spending", |m| {
        m.renter.storage_spending.to_string()
    }),
    ("renter_upload_spending", |m| {
        m.renter.upload_spending.to_string()
    }),
    ("renter_unspent", |m| m.renter.unspent.to_string()),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_and_values_stay_in_lockstep() {
        let metrics = Metrics::default();
        assert_eq!(Metrics::headers().len(), metrics.values().len());
    }

    #[test]
    fn headers_start_with_timestamp_and_cover_every_category() {
        let headers = Metrics::headers();
        assert_eq!(headers[0], "timestamp");
        for category in ContractCategory::ALL {
            assert!(headers.contains(&format!("contract_count_{category}")));
        }
        assert!(headers.contains(&"contract_size_total".to_string()));
        assert!(headers.contains(&"renter_unspent".to_string()));
    }

    #[test]
    fn totals_reconcile_with_category_sums() {
        let mut metrics = Metrics::default();
        let contract = ContractEntry {
            size: 500,
            fees: Currency::from(10u64),
            storage_spending: Currency::from(20u64),
            upload_spending: Currency::from(30u64),
            download_spending: Currency::from(40u64),
            renter_funds: Currency::from(900u64),
        };
        metrics.categories[ContractCategory::Active.index()].absorb(&contract);
        metrics.categories[ContractCategory::Expired.index()].absorb(&contract);
        metrics.reconcile_totals();

        assert_eq!(metrics.contract_totals.count, 2);
        assert_eq!(metrics.contract_totals.size, 1000);
        assert_eq!(metrics.contract_totals.total_spending().to_string(), "200");
        assert_eq!(
            metrics.contract_totals.remaining_funds.to_string(),
            "1800"
        );
    }

    #[test]
    fn timestamp_renders_utc_iso8601() {
        let metrics = Metrics::default();
        assert_eq!(metrics.values()[0], "1970-01-01T00:00:00Z");
    }
}
