use crate::lists::HostsFileCache;
use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::dns_message::address_reply;
use bguard_domain::{DomainError, Request, Response, ResponseType};
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Answers address questions for names found in the loaded hosts files.
pub struct HostsFileResolver {
    hosts: Arc<HostsFileCache>,
    ttl: u32,
    next: Arc<dyn Resolver>,
}

impl HostsFileResolver {
    pub fn new(hosts: Arc<HostsFileCache>, ttl: u32, next: Arc<dyn Resolver>) -> Self {
        Self { hosts, ttl, next }
    }
}

#[async_trait]
impl Resolver for HostsFileResolver {
    fn name(&self) -> &'static str {
        "hosts_file"
    }

    fn is_enabled(&self) -> bool {
        self.hosts.is_enabled()
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        let (Some(name), Some(qtype)) = (request.question_name(), request.query_type()) else {
            return self.next.resolve(ctx, request).await;
        };
        if !matches!(qtype, RecordType::A | RecordType::AAAA) {
            return self.next.resolve(ctx, request).await;
        }

        let table = self.hosts.snapshot();
        let Some(ips) = table.lookup(&name) else {
            return self.next.resolve(ctx, request).await;
        };

        let family_matches = |ip: &IpAddr| match qtype {
            RecordType::A => ip.is_ipv4(),
            _ => ip.is_ipv6(),
        };
        if !ips.iter().any(family_matches) {
            return self.next.resolve(ctx, request).await;
        }

        debug!(domain = %name, "Answering from hosts file");
        let reply = address_reply(request.message(), ips, self.ttl);
        Ok(Response::new(reply, ResponseType::HostsFile, "HOSTS FILE"))
    }
}
