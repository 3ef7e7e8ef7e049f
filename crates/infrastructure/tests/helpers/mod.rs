#![allow(dead_code)]

pub mod builders;
pub mod dns_server_mock;

use async_trait::async_trait;
use bguard_application::ports::{ByteSourceFetcher, ResolveContext, Resolver};
use bguard_domain::dns_message::{address_reply, reply_to};
use bguard_domain::{DomainError, ListSource, Request, Response, ResponseType};
use bguard_infrastructure::dns::DnsTransport;
use bytes::Bytes;
use hickory_proto::op::{Message, ResponseCode};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Terminal stage answering every question with `ip`, counting calls.
pub struct RecordingResolver {
    name: &'static str,
    ip: IpAddr,
    ttl: u32,
    calls: AtomicUsize,
}

impl RecordingResolver {
    pub fn new(ip: &str) -> Self {
        Self {
            name: "recording",
            ip: ip.parse().unwrap(),
            ttl: 300,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for RecordingResolver {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        ctx.check()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = address_reply(request.message(), &[self.ip], self.ttl);
        Ok(Response::new(reply, ResponseType::Resolved, "RESOLVED (test)"))
    }
}

/// Stage that records its name in a shared log, then delegates.
pub struct PassThrough {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
    next: Arc<dyn Resolver>,
}

impl PassThrough {
    pub fn new(
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        next: Arc<dyn Resolver>,
    ) -> Self {
        Self { name, log, next }
    }
}

#[async_trait]
impl Resolver for PassThrough {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        self.log.lock().unwrap().push(self.name);
        self.next.resolve(ctx, request).await
    }
}

/// Stage that always fails.
pub struct FailingResolver;

#[async_trait]
impl Resolver for FailingResolver {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn resolve(
        &self,
        _ctx: &ResolveContext,
        _request: &Request,
    ) -> Result<Response, DomainError> {
        Err(DomainError::Upstream {
            server: "test".to_string(),
            reason: "boom".to_string(),
        })
    }
}

pub enum MockReply {
    Address(IpAddr, u32),
    Code(ResponseCode),
    Fail,
    Slow(Duration, IpAddr),
}

/// Upstream transport answering from a per-server script.
#[derive(Default)]
pub struct MockTransport {
    replies: HashMap<SocketAddr, MockReply>,
    calls: Mutex<Vec<SocketAddr>>,
    seen_ids: Mutex<Vec<u16>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, server: &str, reply: MockReply) -> Self {
        self.replies.insert(server.parse().unwrap(), reply);
        self
    }

    pub fn calls(&self) -> Vec<SocketAddr> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seen_ids(&self) -> Vec<u16> {
        self.seen_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsTransport for MockTransport {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &Message,
        _timeout: Duration,
    ) -> Result<Message, DomainError> {
        self.calls.lock().unwrap().push(server);
        self.seen_ids.lock().unwrap().push(query.id());

        let fail = || DomainError::Upstream {
            server: server.to_string(),
            reason: "scripted failure".to_string(),
        };
        match self.replies.get(&server) {
            Some(MockReply::Address(ip, ttl)) => Ok(address_reply(query, &[*ip], *ttl)),
            Some(MockReply::Code(code)) => Ok(reply_to(query, *code)),
            Some(MockReply::Slow(delay, ip)) => {
                tokio::time::sleep(*delay).await;
                Ok(address_reply(query, &[*ip], 60))
            }
            Some(MockReply::Fail) | None => Err(fail()),
        }
    }
}

/// Serves list bodies by source, switchable between calls.
#[derive(Default)]
pub struct MapFetcher {
    bodies: Mutex<HashMap<String, Result<String, String>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, source: &ListSource, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(source.to_string(), Ok(body.to_string()));
    }

    pub fn fail(&self, source: &ListSource) {
        self.bodies
            .lock()
            .unwrap()
            .insert(source.to_string(), Err("unreachable".to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ByteSourceFetcher for MapFetcher {
    async fn fetch(&self, source: &ListSource) -> Result<Bytes, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let body = self.bodies.lock().unwrap().get(&source.to_string()).cloned();
        match body {
            Some(Ok(body)) => Ok(Bytes::from(body)),
            Some(Err(reason)) => Err(DomainError::Fetch {
                list: source.to_string(),
                reason,
            }),
            None => Err(DomainError::Fetch {
                list: source.to_string(),
                reason: "no body scripted".to_string(),
            }),
        }
    }
}
