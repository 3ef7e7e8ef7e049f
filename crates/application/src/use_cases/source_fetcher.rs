use crate::ports::ByteSourceFetcher;
use bguard_domain::{DomainError, DownloadPolicy, ListSource};
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fetches list sources with a per-attempt timeout, a bounded number of attempts and a
/// cooldown between failed attempts.
#[derive(Clone)]
pub struct SourceFetcher {
    backend: Arc<dyn ByteSourceFetcher>,
    policy: DownloadPolicy,
}

impl SourceFetcher {
    pub fn new(backend: Arc<dyn ByteSourceFetcher>, policy: DownloadPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &DownloadPolicy {
        &self.policy
    }

    pub async fn fetch(
        &self,
        token: &CancellationToken,
        source: &ListSource,
    ) -> Result<Bytes, DomainError> {
        let attempts = self.policy.attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 1..=attempts {
            if token.is_cancelled() {
                return Err(DomainError::Cancelled);
            }

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(DomainError::Cancelled),
                r = tokio::time::timeout(self.policy.timeout, self.backend.fetch(source)) => r,
            };

            match result {
                Ok(Ok(bytes)) => {
                    debug!(source = %source, attempt, bytes = bytes.len(), "List source fetched");
                    return Ok(bytes);
                }
                Ok(Err(e)) if e.is_context_error() => return Err(e),
                Ok(Err(DomainError::Fetch { reason, .. })) => last_reason = reason,
                Ok(Err(e)) => last_reason = e.to_string(),
                Err(_) => {
                    last_reason = format!("timed out after {}ms", self.policy.timeout.as_millis())
                }
            }

            warn!(
                source = %source,
                attempt,
                attempts,
                error = %last_reason,
                "List source fetch attempt failed"
            );

            if attempt < attempts {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(DomainError::Cancelled),
                    _ = tokio::time::sleep(self.policy.cooldown) => {}
                }
            }
        }

        Err(DomainError::Fetch {
            list: source.to_string(),
            reason: format!("giving up after {} attempts: {}", attempts, last_reason),
        })
    }
}
