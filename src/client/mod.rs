//! Node client capability set.
//!
//! Everything the benchmark needs from the remote node is expressed as the
//! [`NodeClient`] trait; the control loop never sees a transport. The only
//! production implementation is [`http::HttpNodeClient`], which speaks the
//! node's renter HTTP API. Tests substitute in-memory mocks.

pub mod http;
pub mod types;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::client::types::{
    ContractCategory, ContractEntry, FileEntry, FileStatus, NodeVersion, RenterInfo, WalletInfo,
};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Capabilities the benchmark consumes from a storage node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// All files known to the renter, finished or not.
    async fn list_files(&self) -> Result<Vec<FileEntry>, NodeError>;

    /// Contracts in the given lifecycle category.
    async fn list_contracts(
        &self,
        category: ContractCategory,
    ) -> Result<Vec<ContractEntry>, NodeError>;

    async fn wallet(&self) -> Result<WalletInfo, NodeError>;

    async fn renter_info(&self) -> Result<RenterInfo, NodeError>;

    /// Start uploading a local file to the given remote path. Returns once
    /// the node has accepted the upload, not once it has finished.
    async fn upload_file(
        &self,
        local: &Path,
        remote: &str,
        data_pieces: u64,
        parity_pieces: u64,
    ) -> Result<(), NodeError>;

    /// Upload progress and redundancy health for one remote file.
    /// Fails if the node does not know the file.
    async fn file_status(&self, remote: &str) -> Result<FileStatus, NodeError>;

    /// Ask the node to shut down.
    async fn shutdown(&self) -> Result<(), NodeError>;

    async fn version(&self) -> Result<NodeVersion, NodeError>;
}
