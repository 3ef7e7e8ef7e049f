use async_trait::async_trait;
use bguard_domain::{DomainError, ListSource};
use bytes::Bytes;

/// Reads the raw content of one list source in a single attempt.
#[async_trait]
pub trait ByteSourceFetcher: Send + Sync {
    async fn fetch(&self, source: &ListSource) -> Result<Bytes, DomainError>;
}
