use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_ERRORS_PER_SOURCE: i64 = 5;
pub const DEFAULT_DOWNLOAD_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_DOWNLOAD_ATTEMPTS: u32 = 3;
pub const DEFAULT_DOWNLOAD_COOLDOWN_MS: u64 = 500;

/// Startup ordering of the first list load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InitStrategy {
    /// Wait for the first load, log its error and keep starting.
    #[default]
    Blocking,
    /// Wait for the first load and abort startup if it fails.
    FailOnError,
    /// Start immediately and load in the background.
    Fast,
}

impl InitStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitStrategy::Blocking => "blocking",
            InitStrategy::FailOnError => "failOnError",
            InitStrategy::Fast => "fast",
        }
    }
}

/// `[*.loading.downloads]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            attempts: default_attempts(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl DownloadConfig {
    pub fn policy(&self) -> DownloadPolicy {
        DownloadPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            attempts: self.attempts.max(1),
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadPolicy {
    pub timeout: Duration,
    pub attempts: u32,
    pub cooldown: Duration,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        DownloadConfig::default().policy()
    }
}

/// `[*.loading]`
///
/// `refresh_period_secs` is optional so each list group can carry its own default period.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceLoadingConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Negative means unlimited.
    #[serde(default = "default_max_errors_per_source")]
    pub max_errors_per_source: i64,

    /// Zero or negative disables periodic refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_period_secs: Option<i64>,

    #[serde(default)]
    pub strategy: InitStrategy,

    #[serde(default)]
    pub downloads: DownloadConfig,
}

impl Default for SourceLoadingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_errors_per_source: default_max_errors_per_source(),
            refresh_period_secs: None,
            strategy: InitStrategy::default(),
            downloads: DownloadConfig::default(),
        }
    }
}

impl SourceLoadingConfig {
    pub fn refresh_policy(&self, default_period: Duration) -> RefreshPolicy {
        let refresh_period = match self.refresh_period_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
            Some(_) => Duration::ZERO,
            None => default_period,
        };
        RefreshPolicy {
            concurrency: self.concurrency.max(1),
            max_errors_per_source: usize::try_from(self.max_errors_per_source).ok(),
            refresh_period,
            init_strategy: self.strategy,
        }
    }

    pub fn download_policy(&self) -> DownloadPolicy {
        self.downloads.policy()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub concurrency: usize,
    /// `None` disables the per-source error budget.
    pub max_errors_per_source: Option<usize>,
    /// `Duration::ZERO` disables periodic refresh.
    pub refresh_period: Duration,
    pub init_strategy: InitStrategy,
}

impl RefreshPolicy {
    pub fn is_periodic(&self) -> bool {
        !self.refresh_period.is_zero()
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        SourceLoadingConfig::default().refresh_policy(Duration::ZERO)
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_max_errors_per_source() -> i64 {
    DEFAULT_MAX_ERRORS_PER_SOURCE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_MS
}

fn default_attempts() -> u32 {
    DEFAULT_DOWNLOAD_ATTEMPTS
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_DOWNLOAD_COOLDOWN_MS
}
