use async_trait::async_trait;
use bguard_domain::{DomainError, Request, Response};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline carried through one resolution.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ResolveContext {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    /// Tightens the deadline to `timeout` from now. An earlier existing deadline is kept.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A context cancelled together with this one, which can also be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn check(&self) -> Result<(), DomainError> {
        if self.token.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(DomainError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Runs `fut` until it completes, the context is cancelled or the deadline passes.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(DomainError::Cancelled),
            _ = deadline => Err(DomainError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

/// One stage of the resolution chain.
///
/// A stage either answers with a terminal [`Response`], delegates to its next stage and returns
/// that result unchanged, or fails. A failure aborts the whole resolution.
#[async_trait]
pub trait Resolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Disabled stages only delegate.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError>;
}
