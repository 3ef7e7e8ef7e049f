use arc_swap::ArcSwap;
use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::{DomainError, Request, Response};
use std::sync::Arc;
use tracing::{debug, info};

type StageFactory = Box<dyn FnOnce(Arc<dyn Resolver>) -> Arc<dyn Resolver> + Send>;

/// Collects stages in query order and links them once the terminal stage is known.
#[derive(Default)]
pub struct ResolverChainBuilder {
    stages: Vec<StageFactory>,
}

impl ResolverChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. `factory` receives the stage that follows it.
    pub fn stage<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(Arc<dyn Resolver>) -> Arc<dyn Resolver> + Send + 'static,
    {
        self.stages.push(Box::new(factory));
        self
    }

    pub fn build(self, terminal: Arc<dyn Resolver>) -> ResolverChain {
        let mut names = vec![(terminal.name(), terminal.is_enabled())];
        let mut next = terminal;

        for factory in self.stages.into_iter().rev() {
            let stage = factory(next);
            names.push((stage.name(), stage.is_enabled()));
            next = stage;
        }
        names.reverse();

        let enabled: Vec<&str> = names
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(name, _)| *name)
            .collect();
        info!(stages = names.len(), enabled = ?enabled, "Resolver chain built");

        ResolverChain {
            entry: next,
            stages: names.into_iter().map(|(name, _)| name).collect(),
        }
    }
}

/// Entry point of a fully linked chain of resolver stages.
pub struct ResolverChain {
    entry: Arc<dyn Resolver>,
    stages: Vec<&'static str>,
}

impl ResolverChain {
    /// Stage names in query order.
    pub fn stages(&self) -> &[&'static str] {
        &self.stages
    }
}

#[async_trait]
impl Resolver for ResolverChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        ctx.check()?;
        let response = self.entry.resolve(ctx, request).await?;
        debug!(
            client = %request.client_ip(),
            question = request.question_name().as_deref().unwrap_or(""),
            rtype = %response.rtype,
            reason = %response.reason,
            "Query resolved"
        );
        Ok(response)
    }
}

/// Holds the active chain. A rebuilt chain replaces the old one atomically, in-flight
/// queries finish on the chain they started with.
pub struct ChainHandle {
    current: ArcSwap<ResolverChain>,
}

impl ChainHandle {
    pub fn new(chain: ResolverChain) -> Self {
        Self {
            current: ArcSwap::from_pointee(chain),
        }
    }

    pub fn current(&self) -> Arc<ResolverChain> {
        self.current.load_full()
    }

    pub fn replace(&self, chain: ResolverChain) {
        info!(stages = chain.stages().len(), "Resolver chain replaced");
        self.current.store(Arc::new(chain));
    }
}

#[async_trait]
impl Resolver for ChainHandle {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        let chain = self.current.load_full();
        chain.resolve(ctx, request).await
    }
}
