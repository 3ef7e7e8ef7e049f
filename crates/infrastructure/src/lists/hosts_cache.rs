use super::failed_sources_error;
use super::hosts_entry::{HostsEntry, HostsFileGrammar};
use super::slots::SourceSlots;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use bguard_application::ports::Refreshable;
use bguard_application::use_cases::SourceLoader;
use bguard_domain::{DomainError, ListSource};
use rustc_hash::FxHashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Name to addresses, merged from every hosts source in configured order.
#[derive(Debug, Default)]
pub struct HostsTable {
    names: FxHashMap<String, Vec<IpAddr>>,
}

impl HostsTable {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a HostsEntry>) -> Self {
        let mut names: FxHashMap<String, Vec<IpAddr>> = FxHashMap::default();
        for entry in entries {
            for name in &entry.names {
                let ips = names.entry(name.clone()).or_default();
                if !ips.contains(&entry.ip) {
                    ips.push(entry.ip);
                }
            }
        }
        Self { names }
    }

    pub fn lookup(&self, name: &str) -> Option<&[IpAddr]> {
        self.names.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub struct HostsFileCache {
    sources: Vec<ListSource>,
    grammar: HostsFileGrammar,
    loader: SourceLoader,
    concurrency: usize,
    slots: Mutex<SourceSlots<Vec<HostsEntry>>>,
    current: ArcSwap<HostsTable>,
}

impl HostsFileCache {
    pub fn new(
        sources: Vec<ListSource>,
        grammar: HostsFileGrammar,
        loader: SourceLoader,
        concurrency: usize,
    ) -> Self {
        Self {
            slots: Mutex::new(SourceSlots::new(sources.len())),
            sources,
            grammar,
            loader,
            concurrency,
            current: ArcSwap::from_pointee(HostsTable::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn snapshot(&self) -> Arc<HostsTable> {
        self.current.load_full()
    }

    pub async fn refresh(&self, token: &CancellationToken) -> Result<(), DomainError> {
        let mut slots = self.slots.lock().await;
        if token.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        let loads = self
            .loader
            .load_all(token, &self.sources, &self.grammar, self.concurrency)
            .await;
        if token.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        for (index, load) in loads.iter().enumerate() {
            let fresh = (!load.outcome.is_failed()).then(|| load.records.clone());
            slots.update(index, fresh);
        }

        let table = HostsTable::from_entries(slots.iter().flat_map(|entries| entries.iter()));
        info!(
            cache = "hosts_file",
            sources = self.sources.len(),
            names = table.len(),
            "Hosts file cache refreshed"
        );
        self.current.store(Arc::new(table));

        match failed_sources_error("hosts_file", &loads) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Refreshable for HostsFileCache {
    fn name(&self) -> &str {
        "hosts_file"
    }

    async fn refresh(&self, token: &CancellationToken) -> Result<(), DomainError> {
        HostsFileCache::refresh(self, token).await
    }
}
