use anyhow::Context;
use bguard_domain::{CliOverrides, Config};
use tracing::info;

/// Loads and validates the configuration. Errors here are fatal.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Startup summary of what is enabled, logged once logging is up.
pub fn log_summary(config: &Config) {
    info!(
        upstreams = config.upstreams.servers.len(),
        strategy = config.upstreams.strategy.as_str(),
        denylist_groups = config.blocking.denylists.len(),
        allowlist_groups = config.blocking.allowlists.len(),
        hosts_sources = config.hosts_file.sources.len(),
        conditional = config.conditional.mapping.len(),
        caching = config.caching.is_enabled(),
        "Configuration loaded"
    );
}
