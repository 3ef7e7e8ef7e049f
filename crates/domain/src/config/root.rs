use serde::{Deserialize, Serialize};

use super::blocking::BlockingConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::migration::{self, Deprecated};
use super::resolvers::{
    CachingConfig, ConditionalConfig, CustomDnsConfig, EdeConfig, FilteringConfig,
    FqdnOnlyConfig, HostsFileConfig, SpecialUseDomainsConfig,
};
use super::server::PortsConfig;
use super::upstream::UpstreamsConfig;

/// Main configuration structure for bguard
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub upstreams: UpstreamsConfig,

    pub filtering: FilteringConfig,

    pub fqdn_only: FqdnOnlyConfig,

    pub ede: EdeConfig,

    pub custom_dns: CustomDnsConfig,

    pub hosts_file: HostsFileConfig,

    pub blocking: BlockingConfig,

    pub caching: CachingConfig,

    pub conditional: ConditionalConfig,

    pub special_use_domains: SpecialUseDomainsConfig,

    pub ports: PortsConfig,

    pub log: LoggingConfig,

    #[serde(flatten)]
    pub deprecated: Deprecated,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. bguard.toml in current directory
    /// 3. /etc/bguard/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("bguard.toml").exists() {
            Self::from_file("bguard.toml")?
        } else if std::path::Path::new("/etc/bguard/config.toml").exists() {
            Self::from_file("/etc/bguard/config.toml")?
        } else {
            Self::default()
        };

        migration::apply_all(&mut config);
        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        migration::apply_all(&mut config);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(dns) = overrides.dns_listen {
            self.ports.dns = dns;
        }
        if let Some(level) = overrides.log_level {
            self.log.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ports.dns_addr()?;

        if self.upstreams.servers.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }
        self.upstreams.addresses()?;

        self.filtering.record_types()?;
        self.conditional.resolved_mapping()?;
        self.blocking.validate()?;

        for (section, loading) in [
            ("blocking", &self.blocking.loading),
            ("hosts_file", &self.hosts_file.loading),
        ] {
            if loading.concurrency == 0 {
                return Err(ConfigError::Validation(format!(
                    "{}.loading.concurrency must be at least 1",
                    section
                )));
            }
            if loading.downloads.timeout_ms == 0 {
                return Err(ConfigError::Validation(format!(
                    "{}.loading.downloads.timeout_ms must be at least 1",
                    section
                )));
            }
            if loading.downloads.attempts == 0 {
                return Err(ConfigError::Validation(format!(
                    "{}.loading.downloads.attempts must be at least 1",
                    section
                )));
            }
        }

        if self.caching.is_enabled() && self.caching.max_items_count == 0 {
            return Err(ConfigError::Validation(
                "caching.max_items_count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_listen: Option<String>,
    pub log_level: Option<String>,
}
