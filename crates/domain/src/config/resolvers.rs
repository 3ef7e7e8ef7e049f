//! Configuration of the smaller resolver stages.

use super::errors::ConfigError;
use super::loading::SourceLoadingConfig;
use super::upstream::parse_upstream;
use crate::list_source::ListSource;
use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HOSTS_REFRESH: Duration = Duration::from_secs(60 * 60);

/// `[filtering]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilteringConfig {
    /// Query type names such as `AAAA` or `ANY`.
    #[serde(default)]
    pub query_types: Vec<String>,
}

impl FilteringConfig {
    pub fn record_types(&self) -> Result<Vec<RecordType>, ConfigError> {
        self.query_types
            .iter()
            .map(|name| {
                RecordType::from_str(&name.trim().to_ascii_uppercase()).map_err(|_| {
                    ConfigError::Validation(format!("Unknown query type '{}'", name))
                })
            })
            .collect()
    }
}

/// `[fqdn_only]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FqdnOnlyConfig {
    #[serde(default)]
    pub enable: bool,
}

/// `[ede]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EdeConfig {
    #[serde(default)]
    pub enable: bool,
}

/// `[custom_dns]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomDnsConfig {
    #[serde(default)]
    pub mapping: BTreeMap<String, Vec<IpAddr>>,

    #[serde(default = "default_custom_ttl_secs")]
    pub custom_ttl_secs: u32,

    /// Answer non-address questions for mapped names with an empty NOERROR.
    #[serde(default = "default_true")]
    pub filter_unmapped_types: bool,
}

impl Default for CustomDnsConfig {
    fn default() -> Self {
        Self {
            mapping: BTreeMap::new(),
            custom_ttl_secs: default_custom_ttl_secs(),
            filter_unmapped_types: true,
        }
    }
}

/// `[hosts_file]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostsFileConfig {
    #[serde(default)]
    pub sources: Vec<ListSource>,

    #[serde(default = "default_hosts_ttl_secs")]
    pub hosts_ttl_secs: u32,

    /// Drop loopback entries such as `127.0.0.1 localhost`.
    #[serde(default)]
    pub filter_loopback: bool,

    #[serde(default)]
    pub loading: SourceLoadingConfig,
}

impl Default for HostsFileConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            hosts_ttl_secs: default_hosts_ttl_secs(),
            filter_loopback: false,
            loading: SourceLoadingConfig::default(),
        }
    }
}

/// `[caching]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CachingConfig {
    #[serde(default)]
    pub min_time_secs: u32,

    /// Zero keeps upstream TTLs uncapped, negative disables the cache.
    #[serde(default)]
    pub max_time_secs: i64,

    #[serde(default = "default_max_items_count")]
    pub max_items_count: usize,

    /// Negative disables negative caching.
    #[serde(default = "default_cache_time_negative_secs")]
    pub cache_time_negative_secs: i64,
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            min_time_secs: 0,
            max_time_secs: 0,
            max_items_count: default_max_items_count(),
            cache_time_negative_secs: default_cache_time_negative_secs(),
        }
    }
}

impl CachingConfig {
    pub fn is_enabled(&self) -> bool {
        self.max_time_secs >= 0
    }
}

/// `[conditional]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConditionalConfig {
    /// Domain suffix to upstream servers. The key `.` matches names without a dot.
    #[serde(default)]
    pub mapping: BTreeMap<String, Vec<String>>,
}

impl ConditionalConfig {
    pub fn resolved_mapping(&self) -> Result<BTreeMap<String, Vec<SocketAddr>>, ConfigError> {
        self.mapping
            .iter()
            .map(|(domain, servers)| {
                let addrs = servers
                    .iter()
                    .map(|s| parse_upstream(s))
                    .collect::<Result<Vec<_>, _>>()?;
                if addrs.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "Conditional domain '{}' has no upstream",
                        domain
                    )));
                }
                let key = domain.trim().trim_end_matches('.').to_ascii_lowercase();
                let key = if key.is_empty() { ".".to_string() } else { key };
                Ok((key, addrs))
            })
            .collect()
    }
}

/// `[special_use_domains]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpecialUseDomainsConfig {
    #[serde(default = "default_true")]
    pub enable: bool,
}

impl Default for SpecialUseDomainsConfig {
    fn default() -> Self {
        Self { enable: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_custom_ttl_secs() -> u32 {
    60 * 60
}

fn default_hosts_ttl_secs() -> u32 {
    60 * 60
}

fn default_max_items_count() -> usize {
    10_000
}

fn default_cache_time_negative_secs() -> i64 {
    30 * 60
}
