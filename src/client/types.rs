//! Transport-agnostic node vocabulary used across the trait boundary.

use std::fmt;

use crate::currency::Currency;

/// Contract lifecycle categories reported by the node.
///
/// Which categories a deployment actually populates depends on the node
/// version; unpopulated categories simply report empty lists and zero totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractCategory {
    Active,
    Passive,
    Refreshed,
    Disabled,
    Expired,
    ExpiredRefreshed,
}

impl ContractCategory {
    pub const ALL: [ContractCategory; 6] = [
        ContractCategory::Active,
        ContractCategory::Passive,
        ContractCategory::Refreshed,
        ContractCategory::Disabled,
        ContractCategory::Expired,
        ContractCategory::ExpiredRefreshed,
    ];

    /// Stable position in per-category arrays and CSV column order.
    pub fn index(self) -> usize {
        match self {
            ContractCategory::Active => 0,
            ContractCategory::Passive => 1,
            ContractCategory::Refreshed => 2,
            ContractCategory::Disabled => 3,
            ContractCategory::Expired => 4,
            ContractCategory::ExpiredRefreshed => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContractCategory::Active => "active",
            ContractCategory::Passive => "passive",
            ContractCategory::Refreshed => "refreshed",
            ContractCategory::Disabled => "disabled",
            ContractCategory::Expired => "expired",
            ContractCategory::ExpiredRefreshed => "expired_refreshed",
        }
    }
}

impl fmt::Display for ContractCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One renter file as reported by the node.
#[derive(Debug, Clone, Default)]
pub struct FileEntry {
    pub size: u64,
    pub uploaded_bytes: u64,
    /// Percentage, 100.0 once fully uploaded.
    pub upload_progress: f64,
}

/// One storage contract as reported by the node.
#[derive(Debug, Clone, Default)]
pub struct ContractEntry {
    pub size: u64,
    pub fees: Currency,
    pub storage_spending: Currency,
    pub upload_spending: Currency,
    pub download_spending: Currency,
    pub renter_funds: Currency,
}

#[derive(Debug, Clone, Default)]
pub struct WalletInfo {
    pub confirmed_balance: Currency,
    pub unconfirmed_incoming: Currency,
    pub unconfirmed_outgoing: Currency,
}

#[derive(Debug, Clone, Default)]
pub struct RenterInfo {
    pub allowance_funds: Currency,
    pub contract_fees: Currency,
    pub total_allocated: Currency,
    pub download_spending: Currency,
    pub storage_spending: Currency,
    pub upload_spending: Currency,
    pub unspent: Currency,
}

/// Remote status of one uploaded file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStatus {
    pub upload_progress: f64,
    pub health_percent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct NodeVersion {
    pub version: String,
    pub revision: String,
}
