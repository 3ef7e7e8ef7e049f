//! Legacy top-level keys and the table that moves them into their current sections.

use super::logging::DEFAULT_LOG_LEVEL;
use super::root::Config;
use super::server::DEFAULT_DNS_LISTEN;
use super::upstream::DEFAULT_UPSTREAM_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Keys still accepted at the top level of the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Deprecated {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_ipv6: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    NotSet,
    Moved,
    /// Both old and new keys were set; the old value was dropped.
    Conflict,
}

pub struct Migration {
    pub old_key: &'static str,
    pub new_key: &'static str,
    pub apply: fn(&mut Config) -> MigrationOutcome,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        old_key: "upstream_timeout_ms",
        new_key: "upstreams.timeout_ms",
        apply: migrate_upstream_timeout,
    },
    Migration {
        old_key: "log_level",
        new_key: "log.level",
        apply: migrate_log_level,
    },
    Migration {
        old_key: "disable_ipv6",
        new_key: "filtering.query_types",
        apply: migrate_disable_ipv6,
    },
    Migration {
        old_key: "port",
        new_key: "ports.dns",
        apply: migrate_port,
    },
];

/// Runs every entry of [`MIGRATIONS`] once and returns how many values were moved.
pub fn apply_all(config: &mut Config) -> usize {
    let mut moved = 0;
    for migration in MIGRATIONS {
        match (migration.apply)(config) {
            MigrationOutcome::NotSet => {}
            MigrationOutcome::Moved => {
                warn!(
                    old = migration.old_key,
                    new = migration.new_key,
                    "Deprecated config option in use, please move it"
                );
                moved += 1;
            }
            MigrationOutcome::Conflict => {
                error!(
                    old = migration.old_key,
                    new = migration.new_key,
                    "Deprecated config option ignored because the new option is also set"
                );
            }
        }
    }
    moved
}

fn migrate_upstream_timeout(config: &mut Config) -> MigrationOutcome {
    let Some(timeout) = config.deprecated.upstream_timeout_ms.take() else {
        return MigrationOutcome::NotSet;
    };
    if config.upstreams.timeout_ms != DEFAULT_UPSTREAM_TIMEOUT_MS {
        return MigrationOutcome::Conflict;
    }
    config.upstreams.timeout_ms = timeout;
    MigrationOutcome::Moved
}

fn migrate_log_level(config: &mut Config) -> MigrationOutcome {
    let Some(level) = config.deprecated.log_level.take() else {
        return MigrationOutcome::NotSet;
    };
    if config.log.level != DEFAULT_LOG_LEVEL {
        return MigrationOutcome::Conflict;
    }
    config.log.level = level;
    MigrationOutcome::Moved
}

fn migrate_disable_ipv6(config: &mut Config) -> MigrationOutcome {
    match config.deprecated.disable_ipv6.take() {
        None => MigrationOutcome::NotSet,
        Some(false) => MigrationOutcome::Moved,
        Some(true) => {
            let types = &mut config.filtering.query_types;
            if !types.iter().any(|t| t.eq_ignore_ascii_case("AAAA")) {
                types.push("AAAA".to_string());
            }
            MigrationOutcome::Moved
        }
    }
}

fn migrate_port(config: &mut Config) -> MigrationOutcome {
    let Some(port) = config.deprecated.port.take() else {
        return MigrationOutcome::NotSet;
    };
    if config.ports.dns != DEFAULT_DNS_LISTEN {
        return MigrationOutcome::Conflict;
    }
    config.ports.dns = port;
    MigrationOutcome::Moved
}
