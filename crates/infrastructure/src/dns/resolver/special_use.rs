use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::dns_message::{address_reply, reply_to, self_and_parents};
use bguard_domain::{DomainError, Request, Response, ResponseType};
use hickory_proto::op::ResponseCode;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Names that must never leave the local resolver (RFC 6761, RFC 6762, RFC 7686, RFC 8375).
const NXDOMAIN_ZONES: &[&str] = &["invalid", "local", "onion", "test", "home.arpa"];

const LOOPBACK_TTL: u32 = 3600;
const REASON: &str = "Special-Use Domain Name";

pub struct SpecialUseDomainsResolver {
    enabled: bool,
    next: Arc<dyn Resolver>,
}

impl SpecialUseDomainsResolver {
    pub fn new(enabled: bool, next: Arc<dyn Resolver>) -> Self {
        Self { enabled, next }
    }
}

#[async_trait]
impl Resolver for SpecialUseDomainsResolver {
    fn name(&self) -> &'static str {
        "special_use_domains"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        if self.enabled {
            if let Some(name) = request.question_name() {
                let zones: Vec<&str> = self_and_parents(&name).collect();
                if zones.contains(&"localhost") {
                    let loopback = [
                        IpAddr::V4(Ipv4Addr::LOCALHOST),
                        IpAddr::V6(Ipv6Addr::LOCALHOST),
                    ];
                    let reply = address_reply(request.message(), &loopback, LOOPBACK_TTL);
                    return Ok(Response::new(reply, ResponseType::Special, REASON));
                }
                if zones.iter().any(|zone| NXDOMAIN_ZONES.contains(zone)) {
                    let reply = reply_to(request.message(), ResponseCode::NXDomain);
                    return Ok(Response::new(reply, ResponseType::Special, REASON));
                }
            }
        }

        self.next.resolve(ctx, request).await
    }
}
