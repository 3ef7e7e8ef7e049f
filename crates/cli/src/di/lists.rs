use anyhow::Context;
use bguard_application::use_cases::{SourceFetcher, SourceLoader};
use bguard_domain::config::{DEFAULT_BLOCKING_REFRESH, DEFAULT_HOSTS_REFRESH};
use bguard_domain::{Config, RefreshPolicy, SourceLoadingConfig};
use bguard_infrastructure::lists::{HostsFileCache, HostsFileGrammar, ListCache, ListSourceFetcher};
use bguard_jobs::JobRunner;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct ListServices {
    pub denylists: Arc<ListCache>,
    pub allowlists: Arc<ListCache>,
    pub hosts: Arc<HostsFileCache>,
    blocking_policy: RefreshPolicy,
    hosts_policy: RefreshPolicy,
}

fn loader(loading: &SourceLoadingConfig, policy: &RefreshPolicy) -> anyhow::Result<SourceLoader> {
    let download = loading.download_policy();
    let fetcher = ListSourceFetcher::new(download.timeout).context("failed to build list fetcher")?;
    Ok(SourceLoader::new(
        SourceFetcher::new(Arc::new(fetcher), download),
        policy.max_errors_per_source,
    ))
}

impl ListServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let blocking = &config.blocking;
        let blocking_policy = blocking.loading.refresh_policy(DEFAULT_BLOCKING_REFRESH);
        let blocking_loader = loader(&blocking.loading, &blocking_policy)?;

        let denylists = Arc::new(ListCache::new(
            "denylists",
            &blocking.denylists,
            blocking_loader.clone(),
            blocking_policy.concurrency,
        ));
        let allowlists = Arc::new(ListCache::new(
            "allowlists",
            &blocking.allowlists,
            blocking_loader,
            blocking_policy.concurrency,
        ));

        let hosts_file = &config.hosts_file;
        let hosts_policy = hosts_file.loading.refresh_policy(DEFAULT_HOSTS_REFRESH);
        let hosts = Arc::new(HostsFileCache::new(
            hosts_file.sources.clone(),
            HostsFileGrammar::new(hosts_file.filter_loopback),
            loader(&hosts_file.loading, &hosts_policy)?,
            hosts_policy.concurrency,
        ));

        info!(
            denylist_sources = denylists.source_count(),
            allowlist_sources = allowlists.source_count(),
            hosts_enabled = hosts.is_enabled(),
            "List caches created"
        );

        Ok(Self {
            denylists,
            allowlists,
            hosts,
            blocking_policy,
            hosts_policy,
        })
    }

    /// Registers a refresh job for every cache that has sources.
    pub fn job_runner(&self, shutdown: CancellationToken) -> JobRunner {
        let mut runner = JobRunner::new(shutdown);
        if self.allowlists.source_count() > 0 {
            runner = runner.with_refresh(self.allowlists.clone(), self.blocking_policy);
        }
        if self.denylists.source_count() > 0 {
            runner = runner.with_refresh(self.denylists.clone(), self.blocking_policy);
        }
        if self.hosts.is_enabled() {
            runner = runner.with_refresh(self.hosts.clone(), self.hosts_policy);
        }
        runner
    }
}
