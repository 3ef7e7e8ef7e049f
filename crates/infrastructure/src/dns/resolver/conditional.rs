use super::upstream::UpstreamGroup;
use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::dns_message::self_and_parents;
use bguard_domain::{DomainError, Request, Response, ResponseType};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// Mapping key that matches every name without a dot.
const SINGLE_LABEL_KEY: &str = ".";

/// Forwards questions under configured domain suffixes to their own upstream servers.
pub struct ConditionalResolver {
    mapping: FxHashMap<String, UpstreamGroup>,
    next: Arc<dyn Resolver>,
}

impl ConditionalResolver {
    /// `mapping` keys are normalized suffixes, `.` for single-label names.
    pub fn new(mapping: FxHashMap<String, UpstreamGroup>, next: Arc<dyn Resolver>) -> Self {
        Self { mapping, next }
    }

    /// Longest configured suffix of `name`.
    fn lookup(&self, name: &str) -> Option<(&str, &UpstreamGroup)> {
        if !name.contains('.') {
            if let Some(group) = self.mapping.get(SINGLE_LABEL_KEY) {
                return Some((SINGLE_LABEL_KEY, group));
            }
        }
        self_and_parents(name).find_map(|suffix| {
            self.mapping
                .get_key_value(suffix)
                .map(|(key, group)| (key.as_str(), group))
        })
    }
}

#[async_trait]
impl Resolver for ConditionalResolver {
    fn name(&self) -> &'static str {
        "conditional"
    }

    fn is_enabled(&self) -> bool {
        !self.mapping.is_empty()
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        let Some(name) = request.question_name() else {
            return self.next.resolve(ctx, request).await;
        };

        let Some((suffix, group)) = self.lookup(&name) else {
            return self.next.resolve(ctx, request).await;
        };

        debug!(domain = %name, suffix = %suffix, "Forwarding conditionally");
        let (reply, server) = group.forward(ctx, request.message()).await?;
        Ok(Response::new(
            reply,
            ResponseType::Conditional,
            format!("CONDITIONAL ({})", server),
        ))
    }
}
