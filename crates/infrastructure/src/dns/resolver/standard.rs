use super::blocking::BlockingResolver;
use super::caching::CachingResolver;
use super::chain::{ResolverChain, ResolverChainBuilder};
use super::conditional::ConditionalResolver;
use super::custom_dns::CustomDnsResolver;
use super::ede::EdeResolver;
use super::filtering::FilteringResolver;
use super::fqdn_only::FqdnOnlyResolver;
use super::hosts_file::HostsFileResolver;
use super::special_use::SpecialUseDomainsResolver;
use super::upstream::{UpstreamGroup, UpstreamResolver};
use crate::dns::transport::DnsTransport;
use crate::lists::{HostsFileCache, ListCache};
use bguard_domain::{Config, ConfigError, DomainError};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Long-lived state the chain reads from. It outlives any single chain.
#[derive(Clone)]
pub struct ChainDeps {
    pub denylists: Arc<ListCache>,
    pub allowlists: Arc<ListCache>,
    pub hosts: Arc<HostsFileCache>,
    pub transport: Arc<dyn DnsTransport>,
}

fn config_error(e: ConfigError) -> DomainError {
    DomainError::Config(e.to_string())
}

/// Links every stage in query order, ending at the upstream resolver.
pub fn build_standard_chain(config: &Config, deps: ChainDeps) -> Result<ResolverChain, DomainError> {
    let query_types = config.filtering.record_types().map_err(config_error)?;
    let block_type = config.blocking.block_type().map_err(config_error)?;
    let upstreams = config.upstreams.addresses().map_err(config_error)?;
    let conditional = config
        .conditional
        .resolved_mapping()
        .map_err(config_error)?
        .into_iter()
        .map(|(suffix, servers)| {
            let group = UpstreamGroup::new(
                servers,
                config.upstreams.strategy,
                config.upstreams.timeout(),
                Arc::clone(&deps.transport),
            );
            (suffix, group)
        })
        .collect::<FxHashMap<_, _>>();

    let terminal = Arc::new(UpstreamResolver::new(UpstreamGroup::new(
        upstreams,
        config.upstreams.strategy,
        config.upstreams.timeout(),
        Arc::clone(&deps.transport),
    )));

    let fqdn_only = config.fqdn_only.enable;
    let ede = config.ede.enable;
    let custom_dns = config.custom_dns.clone();
    let hosts_ttl = config.hosts_file.hosts_ttl_secs;
    let client_groups = config.blocking.client_groups_block.clone();
    let block_ttl = config.blocking.block_ttl_secs;
    let caching = config.caching.clone();
    let special_use = config.special_use_domains.enable;
    let ChainDeps {
        denylists,
        allowlists,
        hosts,
        ..
    } = deps;

    let chain = ResolverChainBuilder::new()
        .stage(move |next| Arc::new(FilteringResolver::new(query_types, next)))
        .stage(move |next| Arc::new(FqdnOnlyResolver::new(fqdn_only, next)))
        .stage(move |next| Arc::new(EdeResolver::new(ede, next)))
        .stage(move |next| Arc::new(CustomDnsResolver::new(&custom_dns, next)))
        .stage(move |next| Arc::new(HostsFileResolver::new(hosts, hosts_ttl, next)))
        .stage(move |next| {
            Arc::new(BlockingResolver::new(
                denylists,
                allowlists,
                &client_groups,
                block_type,
                block_ttl,
                next,
            ))
        })
        .stage(move |next| Arc::new(CachingResolver::new(&caching, next)))
        .stage(move |next| Arc::new(ConditionalResolver::new(conditional, next)))
        .stage(move |next| Arc::new(SpecialUseDomainsResolver::new(special_use, next)))
        .build(terminal);

    Ok(chain)
}
