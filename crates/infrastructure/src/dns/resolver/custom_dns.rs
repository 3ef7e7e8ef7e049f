use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::config::CustomDnsConfig;
use bguard_domain::dns_message::{address_reply, normalize_str, reply_to, self_and_parents};
use bguard_domain::{DomainError, Request, Response, ResponseType};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use rustc_hash::FxHashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Answers from a static name to address mapping. A mapping also covers every subdomain.
pub struct CustomDnsResolver {
    mapping: FxHashMap<String, Vec<IpAddr>>,
    ttl: u32,
    filter_unmapped_types: bool,
    next: Arc<dyn Resolver>,
}

impl CustomDnsResolver {
    pub fn new(config: &CustomDnsConfig, next: Arc<dyn Resolver>) -> Self {
        let mapping = config
            .mapping
            .iter()
            .map(|(name, ips)| (normalize_str(name), ips.clone()))
            .collect();
        Self {
            mapping,
            ttl: config.custom_ttl_secs,
            filter_unmapped_types: config.filter_unmapped_types,
            next,
        }
    }

    fn lookup(&self, name: &str) -> Option<(&str, &[IpAddr])> {
        self_and_parents(name).find_map(|candidate| {
            self.mapping
                .get_key_value(candidate)
                .map(|(k, v)| (k.as_str(), v.as_slice()))
        })
    }
}

#[async_trait]
impl Resolver for CustomDnsResolver {
    fn name(&self) -> &'static str {
        "custom_dns"
    }

    fn is_enabled(&self) -> bool {
        !self.mapping.is_empty()
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        let (Some(name), Some(qtype)) = (request.question_name(), request.query_type()) else {
            return self.next.resolve(ctx, request).await;
        };

        if let Some((mapped, ips)) = self.lookup(&name) {
            match qtype {
                RecordType::A | RecordType::AAAA => {
                    debug!(domain = %name, mapped = %mapped, "Answering from custom DNS");
                    let reply = address_reply(request.message(), ips, self.ttl);
                    return Ok(Response::new(reply, ResponseType::CustomDns, "CUSTOM DNS"));
                }
                _ if self.filter_unmapped_types => {
                    let reply = reply_to(request.message(), ResponseCode::NoError);
                    return Ok(Response::new(reply, ResponseType::CustomDns, "CUSTOM DNS"));
                }
                _ => {}
            }
        }

        self.next.resolve(ctx, request).await
    }
}
