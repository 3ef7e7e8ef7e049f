use super::ListServices;
use anyhow::Context;
use bguard_domain::Config;
use bguard_infrastructure::dns::resolver::{build_standard_chain, ChainDeps};
use bguard_infrastructure::dns::{DnsTransport, ResolverChain};
use std::sync::Arc;
use tracing::info;

pub fn build_chain(
    config: &Config,
    lists: &ListServices,
    transport: Arc<dyn DnsTransport>,
) -> anyhow::Result<ResolverChain> {
    let deps = ChainDeps {
        denylists: Arc::clone(&lists.denylists),
        allowlists: Arc::clone(&lists.allowlists),
        hosts: Arc::clone(&lists.hosts),
        transport,
    };
    let chain = build_standard_chain(config, deps).context("failed to build resolver chain")?;
    info!(stages = ?chain.stages(), "Resolver chain ready");
    Ok(chain)
}
