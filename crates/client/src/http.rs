//! HTTP implementation of the transport

use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Url};
use sync_core::ChecksumIndex;
use tokio::fs::File;
use tracing::debug;

/// Content type for file bodies
pub const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type marking a directory push
pub const DIRECTORY_CONTENT_TYPE: &str = "directory";

/// Talks to a remote server rooted at a base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// Create a transport for `base`, e.g. `http://build-host:8080/`
    ///
    /// A missing trailing slash is added so that relative paths land below
    /// the base path rather than replacing its last segment.
    pub fn new(base: &str) -> Result<Self, TransportError> {
        let mut base = Url::parse(base).map_err(|e| TransportError::InvalidUrl(format!("{base}: {e}")))?;

        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    /// Base URL, always ending in `/`
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of a remote path, each segment percent-encoded
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Send a request and return the body of a successful response
    async fn send(&self, request: RequestBuilder) -> Result<String, TransportError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.trim_end().to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_index(&self) -> Result<ChecksumIndex, TransportError> {
        debug!("GET {}", self.base);
        let body = self.send(self.client.get(self.base.clone())).await?;
        Ok(ChecksumIndex::from_json(body.as_bytes())?)
    }

    /// The file is streamed as the request body, never buffered whole
    async fn push_file(&self, path: &str, file: File) -> Result<String, TransportError> {
        let url = self.url_for(path)?;
        debug!("POST {} (file)", url);
        self.send(
            self.client
                .post(url)
                .header(CONTENT_TYPE, FILE_CONTENT_TYPE)
                .body(file),
        )
        .await
    }

    async fn push_directory(&self, path: &str) -> Result<String, TransportError> {
        let url = self.url_for(path)?;
        debug!("POST {} (directory)", url);
        self.send(self.client.post(url).header(CONTENT_TYPE, DIRECTORY_CONTENT_TYPE))
            .await
    }

    async fn delete(&self, path: &str) -> Result<String, TransportError> {
        let url = self.url_for(path)?;
        debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await
    }
}
