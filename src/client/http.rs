//! HTTP implementation of the node capability set.
//!
//! Speaks the renter API of a Sia-style storage node: password-protected
//! endpoints behind basic auth with an empty username, a mandatory custom
//! user-agent, and JSON bodies. Errors come back as `{"message": "..."}`.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::client::types::{
    ContractCategory, ContractEntry, FileEntry, FileStatus, NodeVersion, RenterInfo, WalletInfo,
};
use crate::client::{NodeClient, NodeError};
use crate::config::Config;
use crate::currency::Currency;

pub struct HttpNodeClient {
    client: Client,
    base: String,
    password: String,
}

impl HttpNodeClient {
    pub fn new(config: &Config) -> Result<Self, NodeError> {
        let client = Client::builder()
            .user_agent(config.node_api_user_agent.clone())
            .build()?;

        // The node address is conventionally given without a scheme.
        let base = if config.node_api_url.starts_with("http") {
            config.node_api_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", config.node_api_url.trim_end_matches('/'))
        };

        Ok(Self {
            client,
            base,
            password: config.node_api_password.clone(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base, path))
            .basic_auth("", Some(&self.password))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base, path))
            .basic_auth("", Some(&self.password))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, NodeError> {
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(NodeError::from)
    }

    async fn contracts(&self) -> Result<wire::Contracts, NodeError> {
        // One call returns every category; expired sets are opt-in.
        let response = self
            .get("/renter/contracts?disabled=true&expired=true")
            .send()
            .await?;
        Self::decode(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, NodeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<wire::ApiError>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(NodeError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn list_files(&self) -> Result<Vec<FileEntry>, NodeError> {
        let response = self.get("/renter/files?cached=true").send().await?;
        let files: wire::Files = Self::decode(response).await?;
        Ok(files
            .files
            .unwrap_or_default()
            .into_iter()
            .map(FileEntry::from)
            .collect())
    }

    async fn list_contracts(
        &self,
        category: ContractCategory,
    ) -> Result<Vec<ContractEntry>, NodeError> {
        let contracts = self.contracts().await?;
        let set = match category {
            ContractCategory::Active => contracts.active,
            ContractCategory::Passive => contracts.passive,
            ContractCategory::Refreshed => contracts.refreshed,
            ContractCategory::Disabled => contracts.disabled,
            ContractCategory::Expired => contracts.expired,
            ContractCategory::ExpiredRefreshed => contracts.expired_refreshed,
        };
        Ok(set
            .unwrap_or_default()
            .into_iter()
            .map(ContractEntry::from)
            .collect())
    }

    async fn wallet(&self) -> Result<WalletInfo, NodeError> {
        let response = self.get("/wallet").send().await?;
        let wallet: wire::Wallet = Self::decode(response).await?;
        Ok(wallet.into())
    }

    async fn renter_info(&self) -> Result<RenterInfo, NodeError> {
        let response = self.get("/renter").send().await?;
        let renter: wire::Renter = Self::decode(response).await?;
        Ok(renter.into())
    }

    async fn upload_file(
        &self,
        local: &Path,
        remote: &str,
        data_pieces: u64,
        parity_pieces: u64,
    ) -> Result<(), NodeError> {
        let source = local.to_string_lossy();
        let data_pieces = data_pieces.to_string();
        let parity_pieces = parity_pieces.to_string();
        let response = self
            .post(&format!("/renter/upload/{remote}"))
            .query(&[
                ("source", source.as_ref()),
                ("datapieces", data_pieces.as_str()),
                ("paritypieces", parity_pieces.as_str()),
            ])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn file_status(&self, remote: &str) -> Result<FileStatus, NodeError> {
        let response = self.get(&format!("/renter/file/{remote}")).send().await?;
        let file: wire::File = Self::decode(response).await?;
        Ok(FileStatus {
            upload_progress: file.file.upload_progress,
            health_percent: file.file.max_health_percent,
        })
    }

    async fn shutdown(&self) -> Result<(), NodeError> {
        let response = self.get("/daemon/stop").send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn version(&self) -> Result<NodeVersion, NodeError> {
        let response = self.get("/daemon/version").send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(NodeError::Decode(
                "node does not expose /daemon/version".to_string(),
            ));
        }
        let version: wire::Version = Self::decode(response).await?;
        Ok(NodeVersion {
            version: version.version,
            revision: version.git_revision,
        })
    }
}

/// JSON shapes of the node API. Field names follow the node's all-lowercase
/// convention; conversions keep the rest of the crate free of them.
mod wire {
    use super::*;

    #[derive(Deserialize)]
    pub struct ApiError {
        pub message: String,
    }

    #[derive(Deserialize)]
    pub struct Files {
        // The node reports null instead of an empty array.
        pub files: Option<Vec<FileMeta>>,
    }

    #[derive(Deserialize)]
    pub struct File {
        pub file: FileMeta,
    }

    #[derive(Deserialize)]
    pub struct FileMeta {
        #[serde(rename = "filesize", default)]
        pub filesize: u64,
        #[serde(rename = "uploadedbytes", default)]
        pub uploaded_bytes: u64,
        #[serde(rename = "uploadprogress", default)]
        pub upload_progress: f64,
        #[serde(rename = "maxhealthpercent", default)]
        pub max_health_percent: f64,
    }

    impl From<FileMeta> for FileEntry {
        fn from(f: FileMeta) -> Self {
            FileEntry {
                size: f.filesize,
                uploaded_bytes: f.uploaded_bytes,
                upload_progress: f.upload_progress,
            }
        }
    }

    #[derive(Deserialize)]
    pub struct Contracts {
        #[serde(rename = "activecontracts")]
        pub active: Option<Vec<Contract>>,
        #[serde(rename = "passivecontracts")]
        pub passive: Option<Vec<Contract>>,
        #[serde(rename = "refreshedcontracts")]
        pub refreshed: Option<Vec<Contract>>,
        #[serde(rename = "disabledcontracts")]
        pub disabled: Option<Vec<Contract>>,
        #[serde(rename = "expiredcontracts")]
        pub expired: Option<Vec<Contract>>,
        #[serde(rename = "expiredrefreshedcontracts")]
        pub expired_refreshed: Option<Vec<Contract>>,
    }

    #[derive(Deserialize)]
    pub struct Contract {
        #[serde(default)]
        pub size: u64,
        #[serde(default)]
        pub fees: Currency,
        #[serde(rename = "storagespending", default)]
        pub storage_spending: Currency,
        #[serde(rename = "uploadspending", default)]
        pub upload_spending: Currency,
        #[serde(rename = "downloadspending", default)]
        pub download_spending: Currency,
        #[serde(rename = "renterfunds", default)]
        pub renter_funds: Currency,
    }

    impl From<Contract> for ContractEntry {
        fn from(c: Contract) -> Self {
            ContractEntry {
                size: c.size,
                fees: c.fees,
                storage_spending: c.storage_spending,
                upload_spending: c.upload_spending,
                download_spending: c.download_spending,
                renter_funds: c.renter_funds,
            }
        }
    }

    #[derive(Deserialize)]
    pub struct Wallet {
        #[serde(rename = "confirmedsiacoinbalance", default)]
        pub confirmed: Currency,
        #[serde(rename = "unconfirmedincomingsiacoins", default)]
        pub incoming: Currency,
        #[serde(rename = "unconfirmedoutgoingsiacoins", default)]
        pub outgoing: Currency,
    }

    impl From<Wallet> for WalletInfo {
        fn from(w: Wallet) -> Self {
            WalletInfo {
                confirmed_balance: w.confirmed,
                unconfirmed_incoming: w.incoming,
                unconfirmed_outgoing: w.outgoing,
            }
        }
    }

    #[derive(Deserialize)]
    pub struct Renter {
        pub settings: RenterSettings,
        #[serde(rename = "financialmetrics")]
        pub financial_metrics: FinancialMetrics,
    }

    #[derive(Deserialize)]
    pub struct RenterSettings {
        pub allowance: Allowance,
    }

    #[derive(Deserialize)]
    pub struct Allowance {
        #[serde(default)]
        pub funds: Currency,
    }

    #[derive(Deserialize)]
    pub struct FinancialMetrics {
        #[serde(rename = "contractfees", default)]
        pub contract_fees: Currency,
        #[serde(rename = "totalallocated", default)]
        pub total_allocated: Currency,
        #[serde(rename = "downloadspending", default)]
        pub download_spending: Currency,
        #[serde(rename = "storagespending", default)]
        pub storage_spending: Currency,
        #[serde(rename = "uploadspending", default)]
        pub upload_spending: Currency,
        #[serde(default)]
        pub unspent: Currency,
    }

    impl From<Renter> for RenterInfo {
        fn from(r: Renter) -> Self {
            RenterInfo {
                allowance_funds: r.settings.allowance.funds,
                contract_fees: r.financial_metrics.contract_fees,
                total_allocated: r.financial_metrics.total_allocated,
                download_spending: r.financial_metrics.download_spending,
                storage_spending: r.financial_metrics.storage_spending,
                upload_spending: r.financial_metrics.upload_spending,
                unspent: r.financial_metrics.unspent,
            }
        }
    }

    #[derive(Deserialize)]
    pub struct Version {
        pub version: String,
        #[serde(rename = "gitrevision", default)]
        pub git_revision: String,
    }
}
