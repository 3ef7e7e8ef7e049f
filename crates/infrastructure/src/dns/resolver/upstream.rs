use crate::dns::transport::DnsTransport;
use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::{DomainError, Request, Response, ResponseType, UpstreamStrategy};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use hickory_proto::op::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Servers raced by `parallel_best`.
const PARALLEL_FANOUT: usize = 2;
/// Servers tried by `random`.
const RANDOM_ATTEMPTS: usize = 2;

/// A set of upstream servers queried with one strategy.
#[derive(Clone)]
pub struct UpstreamGroup {
    servers: Vec<SocketAddr>,
    strategy: UpstreamStrategy,
    timeout: Duration,
    transport: Arc<dyn DnsTransport>,
}

impl UpstreamGroup {
    pub fn new(
        servers: Vec<SocketAddr>,
        strategy: UpstreamStrategy,
        timeout: Duration,
        transport: Arc<dyn DnsTransport>,
    ) -> Self {
        Self {
            servers,
            strategy,
            timeout,
            transport,
        }
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    /// Forwards `query` and returns the answer with the id of `query`, plus the server that
    /// produced it.
    pub async fn forward(
        &self,
        ctx: &ResolveContext,
        query: &Message,
    ) -> Result<(Message, SocketAddr), DomainError> {
        if self.servers.is_empty() {
            return Err(DomainError::NoUpstream);
        }

        let mut outgoing = query.clone();
        outgoing.set_id(fastrand::u16(..));

        let (mut reply, server) = ctx
            .run(async {
                match self.strategy {
                    UpstreamStrategy::Strict => self.strict(&outgoing).await,
                    UpstreamStrategy::ParallelBest => self.parallel_best(&outgoing).await,
                    UpstreamStrategy::Random => self.random(&outgoing).await,
                }
            })
            .await?;

        reply.set_id(query.id());
        Ok((reply, server))
    }

    async fn exchange(
        &self,
        server: SocketAddr,
        query: &Message,
    ) -> Result<(Message, SocketAddr), DomainError> {
        let reply = self.transport.exchange(server, query, self.timeout).await?;
        Ok((reply, server))
    }

    async fn strict(&self, query: &Message) -> Result<(Message, SocketAddr), DomainError> {
        self.sequential(&self.servers, query).await
    }

    async fn random(&self, query: &Message) -> Result<(Message, SocketAddr), DomainError> {
        let picked = self.pick(RANDOM_ATTEMPTS);
        self.sequential(&picked, query).await
    }

    async fn parallel_best(&self, query: &Message) -> Result<(Message, SocketAddr), DomainError> {
        let picked = self.pick(PARALLEL_FANOUT);
        if picked.len() == 1 {
            return self.exchange(picked[0], query).await;
        }

        debug!(strategy = "parallel_best", servers = ?picked, "Racing upstreams");
        let mut racing: FuturesUnordered<_> = picked
            .iter()
            .map(|server| self.exchange(*server, query))
            .collect();

        let mut last_error = DomainError::NoUpstream;
        while let Some(result) = racing.next().await {
            match result {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    debug!(error = %e, "Upstream failed in race");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn sequential(
        &self,
        servers: &[SocketAddr],
        query: &Message,
    ) -> Result<(Message, SocketAddr), DomainError> {
        let mut last_error = DomainError::NoUpstream;
        for server in servers {
            match self.exchange(*server, query).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    debug!(server = %server, error = %e, "Upstream failed, trying next");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Up to `count` distinct servers in random order.
    fn pick(&self, count: usize) -> Vec<SocketAddr> {
        let mut servers = self.servers.clone();
        fastrand::shuffle(&mut servers);
        servers.truncate(count);
        servers
    }
}

/// Terminal stage: forwards every question to the configured upstream servers.
pub struct UpstreamResolver {
    group: UpstreamGroup,
}

impl UpstreamResolver {
    pub fn new(group: UpstreamGroup) -> Self {
        Self { group }
    }
}

#[async_trait]
impl Resolver for UpstreamResolver {
    fn name(&self) -> &'static str {
        "upstream"
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        let (reply, server) = self.group.forward(ctx, request.message()).await?;
        debug!(
            domain = request.question_name().as_deref().unwrap_or(""),
            server = %server,
            rcode = %reply.response_code(),
            "Upstream answered"
        );
        Ok(Response::new(
            reply,
            ResponseType::Resolved,
            format!("RESOLVED ({})", server),
        ))
    }
}
