use super::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStrategy {
    /// Race two random servers, first success wins.
    #[default]
    ParallelBest,

    /// Servers in configured order, next one on error.
    Strict,

    /// One random server, falling back to another on error.
    Random,
}

impl UpstreamStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParallelBest => "parallel_best",
            Self::Strict => "strict",
            Self::Random => "random",
        }
    }
}

/// `[upstreams]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamsConfig {
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    #[serde(default)]
    pub strategy: UpstreamStrategy,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            strategy: UpstreamStrategy::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl UpstreamsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn addresses(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.servers.iter().map(|s| parse_upstream(s)).collect()
    }
}

/// Parses `1.1.1.1`, `1.1.1.1:5353`, `2606:4700::1111` or `[2606:4700::1111]:53`.
/// An optional `udp:`/`tcp:` scheme prefix is accepted and ignored.
pub fn parse_upstream(value: &str) -> Result<SocketAddr, ConfigError> {
    let trimmed = value.trim();
    let trimmed = trimmed
        .strip_prefix("udp:")
        .or_else(|| trimmed.strip_prefix("tcp:"))
        .unwrap_or(trimmed);

    if let Ok(addr) = trimmed.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = trimmed.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, 53));
    }
    let bracketed = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']'));
    if let Some(ip) = bracketed.and_then(|s| s.parse::<IpAddr>().ok()) {
        return Ok(SocketAddr::new(ip, 53));
    }

    Err(ConfigError::Validation(format!(
        "Invalid upstream address '{}'",
        value
    )))
}

fn default_servers() -> Vec<String> {
    vec!["8.8.8.8:53".to_string(), "1.1.1.1:53".to_string()]
}

fn default_timeout_ms() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT_MS
}
