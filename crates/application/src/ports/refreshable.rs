use async_trait::async_trait;
use bguard_domain::DomainError;
use tokio_util::sync::CancellationToken;

/// Something the refresh scheduler can reload, such as a list cache.
#[async_trait]
pub trait Refreshable: Send + Sync {
    fn name(&self) -> &str;

    /// Runs one complete refresh cycle. Must be safe to call while another call is running.
    async fn refresh(&self, token: &CancellationToken) -> Result<(), DomainError>;
}
