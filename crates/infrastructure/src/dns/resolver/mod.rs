pub mod blocking;
pub mod caching;
pub mod chain;
pub mod conditional;
pub mod custom_dns;
pub mod ede;
pub mod filtering;
pub mod fqdn_only;
pub mod hosts_file;
pub mod special_use;
pub mod standard;
pub mod upstream;

pub use blocking::BlockingResolver;
pub use caching::CachingResolver;
pub use chain::{ChainHandle, ResolverChain, ResolverChainBuilder};
pub use conditional::ConditionalResolver;
pub use custom_dns::CustomDnsResolver;
pub use ede::EdeResolver;
pub use filtering::FilteringResolver;
pub use fqdn_only::FqdnOnlyResolver;
pub use hosts_file::HostsFileResolver;
pub use special_use::SpecialUseDomainsResolver;
pub use standard::{build_standard_chain, ChainDeps};
pub use upstream::{UpstreamGroup, UpstreamResolver};
