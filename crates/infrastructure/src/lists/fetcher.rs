use async_trait::async_trait;
use bguard_application::ports::ByteSourceFetcher;
use bguard_domain::{DomainError, ListSource};
use bytes::{Bytes, BytesMut};
use std::path::Path;
use std::time::Duration;

/// Largest list body accepted from one HTTP or file source.
pub const DEFAULT_MAX_LIST_BYTES: usize = 64 * 1024 * 1024;

/// Reads inline text, HTTP(S) URLs and local files.
pub struct ListSourceFetcher {
    http_client: reqwest::Client,
    max_bytes: usize,
}

impl ListSourceFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("bguard/", env!("CARGO_PKG_VERSION"), " (list-sync)"))
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            max_bytes: DEFAULT_MAX_LIST_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self) -> String {
        format!("list larger than {} bytes", self.max_bytes)
    }

    async fn fetch_url(&self, url: &str) -> Result<Bytes, DomainError> {
        let fetch_err = |reason: String| DomainError::Fetch {
            list: url.to_string(),
            reason,
        };

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_err(format!("HTTP {}", response.status().as_u16())));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(fetch_err(self.too_large()));
        }

        let mut response = response;
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| fetch_err(format!("read error: {}", e)))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(fetch_err(self.too_large()));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes, DomainError> {
        let fetch_err = |reason: String| DomainError::Fetch {
            list: path.display().to_string(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if metadata.len() > self.max_bytes as u64 {
            return Err(fetch_err(self.too_large()));
        }
        tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|e| fetch_err(e.to_string()))
    }
}

#[async_trait]
impl ByteSourceFetcher for ListSourceFetcher {
    async fn fetch(&self, source: &ListSource) -> Result<Bytes, DomainError> {
        match source {
            ListSource::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            ListSource::Http(url) => self.fetch_url(url).await,
            ListSource::File(path) => self.read_file(path).await,
        }
    }
}
