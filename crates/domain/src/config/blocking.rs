use super::errors::ConfigError;
use super::loading::SourceLoadingConfig;
use crate::list_source::ListSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BLOCK_TTL_SECS: u32 = 6 * 60 * 60;
pub const DEFAULT_BLOCKING_REFRESH: Duration = Duration::from_secs(4 * 60 * 60);
pub const DEFAULT_CLIENT_GROUP: &str = "default";

/// How a blocked query is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockType {
    /// `0.0.0.0` for A and `::` for AAAA.
    ZeroIp,
    NxDomain,
    CustomIps(Vec<IpAddr>),
}

impl FromStr for BlockType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("zeroip") {
            return Ok(BlockType::ZeroIp);
        }
        if value.eq_ignore_ascii_case("nxdomain") {
            return Ok(BlockType::NxDomain);
        }

        let ips = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<IpAddr>().map_err(|_| {
                    ConfigError::Validation(format!("Invalid block type '{}'", value))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if ips.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Invalid block type '{}'",
                value
            )));
        }
        Ok(BlockType::CustomIps(ips))
    }
}

/// `[blocking]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockingConfig {
    /// Group name to sources.
    #[serde(default)]
    pub denylists: BTreeMap<String, Vec<ListSource>>,

    #[serde(default)]
    pub allowlists: BTreeMap<String, Vec<ListSource>>,

    /// Client name, IP or `default` to the groups applied to it.
    #[serde(default)]
    pub client_groups_block: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_block_type")]
    pub block_type: String,

    #[serde(default = "default_block_ttl_secs")]
    pub block_ttl_secs: u32,

    #[serde(default)]
    pub loading: SourceLoadingConfig,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            denylists: BTreeMap::new(),
            allowlists: BTreeMap::new(),
            client_groups_block: BTreeMap::new(),
            block_type: default_block_type(),
            block_ttl_secs: default_block_ttl_secs(),
            loading: SourceLoadingConfig::default(),
        }
    }
}

impl BlockingConfig {
    pub fn is_enabled(&self) -> bool {
        !self.client_groups_block.is_empty()
            && (!self.denylists.is_empty() || !self.allowlists.is_empty())
    }

    pub fn block_type(&self) -> Result<BlockType, ConfigError> {
        BlockType::from_str(&self.block_type)
    }

    pub fn block_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.block_ttl_secs))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.block_type()?;
        for (client, groups) in &self.client_groups_block {
            if client.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "Empty client name in client_groups_block".to_string(),
                ));
            }
            for group in groups {
                if !self.denylists.contains_key(group) && !self.allowlists.contains_key(group) {
                    return Err(ConfigError::Validation(format!(
                        "Client '{}' references unknown group '{}'",
                        client, group
                    )));
                }
            }
        }
        Ok(())
    }
}

fn default_block_type() -> String {
    "zeroIp".to_string()
}

fn default_block_ttl_secs() -> u32 {
    DEFAULT_BLOCK_TTL_SECS
}
