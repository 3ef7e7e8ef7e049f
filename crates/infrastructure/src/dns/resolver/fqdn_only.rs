use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::dns_message::reply_to;
use bguard_domain::{DomainError, Request, Response, ResponseType};
use hickory_proto::op::ResponseCode;
use std::sync::Arc;

/// Rejects names without a dot with NXDOMAIN.
pub struct FqdnOnlyResolver {
    enabled: bool,
    next: Arc<dyn Resolver>,
}

impl FqdnOnlyResolver {
    pub fn new(enabled: bool, next: Arc<dyn Resolver>) -> Self {
        Self { enabled, next }
    }
}

#[async_trait]
impl Resolver for FqdnOnlyResolver {
    fn name(&self) -> &'static str {
        "fqdn_only"
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
                if !name.contains('.') {
                    let reply = reply_to(request.message(), ResponseCode::NXDomain);
                    return Ok(Response::new(reply, ResponseType::NotFqdn, "NOTFQDN"));
                }
            }
        }

        self.next.resolve(ctx, request).await
    }
}
