use crate::lists::ListCache;
use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::config::DEFAULT_CLIENT_GROUP;
use bguard_domain::dns_message::{address_reply, reply_to};
use bguard_domain::{BlockType, DomainError, Request, Response, ResponseType};
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::RecordType;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tracing::debug;

const ZERO_IPS: [IpAddr; 2] = [
    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    IpAddr::V6(Ipv6Addr::UNSPECIFIED),
];

/// Answers questions matching a denylist of the client's groups, unless an allowlist of
/// those groups also matches.
pub struct BlockingResolver {
    denylists: Arc<ListCache>,
    allowlists: Arc<ListCache>,
    client_groups: FxHashMap<String, Vec<String>>,
    block_type: BlockType,
    ttl: u32,
    next: Arc<dyn Resolver>,
}

impl BlockingResolver {
    pub fn new(
        denylists: Arc<ListCache>,
        allowlists: Arc<ListCache>,
        client_groups: &BTreeMap<String, Vec<String>>,
        block_type: BlockType,
        ttl: u32,
        next: Arc<dyn Resolver>,
    ) -> Self {
        let client_groups = client_groups
            .iter()
            .map(|(client, groups)| (client.trim().to_ascii_lowercase(), groups.clone()))
            .collect();
        Self {
            denylists,
            allowlists,
            client_groups,
            block_type,
            ttl,
            next,
        }
    }

    /// Groups of every client name and the client address, or the default groups when none
    /// of them is configured.
    fn groups_for(&self, request: &Request) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        let ip = request.client_ip().to_string();
        let keys = request
            .client_names()
            .iter()
            .map(|name| name.to_ascii_lowercase())
            .chain(std::iter::once(ip));

        for key in keys {
            if let Some(configured) = self.client_groups.get(&key) {
                for group in configured {
                    if !groups.contains(&group.as_str()) {
                        groups.push(group);
                    }
                }
            }
        }

        if groups.is_empty() {
            if let Some(defaults) = self.client_groups.get(DEFAULT_CLIENT_GROUP) {
                groups.extend(defaults.iter().map(String::as_str));
            }
        }
        groups
    }

    fn blocked_reply(&self, request: &Message, qtype: RecordType) -> Message {
        match &self.block_type {
            BlockType::ZeroIp => address_reply(request, &ZERO_IPS, self.ttl),
            BlockType::NxDomain => reply_to(request, ResponseCode::NXDomain),
            BlockType::CustomIps(ips) => {
                let reply = address_reply(request, ips, self.ttl);
                // no configured address of the asked family
                if reply.answers().is_empty() && matches!(qtype, RecordType::A | RecordType::AAAA) {
                    address_reply(request, &ZERO_IPS, self.ttl)
                } else {
                    reply
                }
            }
        }
    }
}

#[async_trait]
impl Resolver for BlockingResolver {
    fn name(&self) -> &'static str {
        "blocking"
    }

    fn is_enabled(&self) -> bool {
        !self.client_groups.is_empty()
            && (self.denylists.source_count() > 0 || self.allowlists.source_count() > 0)
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        if !self.is_enabled() {
            return self.next.resolve(ctx, request).await;
        }
        let (Some(name), Some(qtype)) = (request.question_name(), request.query_type()) else {
            return self.next.resolve(ctx, request).await;
        };

        let groups = self.groups_for(request);
        if groups.is_empty() {
            return self.next.resolve(ctx, request).await;
        }

        if let Some(group) = self.allowlists.matching_group(&name, groups.iter().copied()) {
            debug!(domain = %name, group = %group, "Allowlisted");
            return self.next.resolve(ctx, request).await;
        }

        match self.denylists.matching_group(&name, groups.iter().copied()) {
            Some(group) => {
                debug!(domain = %name, group = %group, client = %request.client_ip(), "Blocked");
                let reply = self.blocked_reply(request.message(), qtype);
                Ok(Response::new(
                    reply,
                    ResponseType::Blocked,
                    format!("BLOCKED ({})", group),
                ))
            }
            None => self.next.resolve(ctx, request).await,
        }
    }
}
