use super::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_DNS_LISTEN: &str = "0.0.0.0:53";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortsConfig {
    /// `ip:port`, or a bare port listening on all IPv4 interfaces.
    #[serde(default = "default_dns")]
    pub dns: String,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self { dns: default_dns() }
    }
}

impl PortsConfig {
    pub fn dns_addr(&self) -> Result<SocketAddr, ConfigError> {
        let value = self.dns.trim();
        if let Ok(port) = value.trim_start_matches(':').parse::<u16>() {
            return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
        }
        value.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Validation(format!("Invalid DNS listen address '{}': {}", value, e))
        })
    }
}

fn default_dns() -> String {
    DEFAULT_DNS_LISTEN.to_string()
}
