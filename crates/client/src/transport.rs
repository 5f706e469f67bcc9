//! Transport collaborator used by the sync client

use async_trait::async_trait;
use sync_core::ChecksumIndex;
use thiserror::Error;
use tokio::fs::File;

/// Transport failures
///
/// These are confined to a single path: the client logs them and moves on.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection or protocol failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success status
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The remote index was not a valid path -> checksum object
    #[error("invalid index: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL cannot address remote paths
    #[error("invalid remote URL {0}")]
    InvalidUrl(String),
}

/// Remote side of the sync protocol
///
/// Every method is one round trip. Paths are normalized index paths without
/// a trailing separator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the checksum index of the whole remote tree
    async fn fetch_index(&self) -> Result<ChecksumIndex, TransportError>;

    /// Upload the full content of an open file, read to its end
    async fn push_file(&self, path: &str, file: File) -> Result<String, TransportError>;

    /// Ensure a directory exists remotely
    async fn push_directory(&self, path: &str) -> Result<String, TransportError>;

    /// Remove a path remotely, recursively for directories
    async fn delete(&self, path: &str) -> Result<String, TransportError>;
}
