use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::dns_message::reply_to;
use bguard_domain::{DomainError, Request, Response, ResponseType};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

/// Answers queries of the configured types with an empty NOERROR, e.g. to drop all AAAA.
pub struct FilteringResolver {
    query_types: FxHashSet<RecordType>,
    next: Arc<dyn Resolver>,
}

impl FilteringResolver {
    pub fn new(query_types: impl IntoIterator<Item = RecordType>, next: Arc<dyn Resolver>) -> Self {
        Self {
            query_types: query_types.into_iter().collect(),
            next,
        }
    }
}

#[async_trait]
impl Resolver for FilteringResolver {
    fn name(&self) -> &'static str {
        "filtering"
    }

    fn is_enabled(&self) -> bool {
        !self.query_types.is_empty()
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        if let Some(qtype) = request.query_type() {
            if self.query_types.contains(&qtype) {
                debug!(qtype = %qtype, "Query type filtered");
                let reply = reply_to(request.message(), ResponseCode::NoError);
                return Ok(Response::new(reply, ResponseType::Filtered, "FILTERED"));
            }
        }

        self.next.resolve(ctx, request).await
    }
}
