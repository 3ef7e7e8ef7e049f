use super::failed_sources_error;
use super::list_entry::ListEntryGrammar;
use super::rules::{RuleSet, SourceRules};
use super::slots::SourceSlots;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use bguard_application::ports::Refreshable;
use bguard_application::use_cases::SourceLoader;
use bguard_domain::{DomainError, ListSource};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

struct RefreshState {
    slots: SourceSlots<SourceRules>,
    generation: u64,
}

/// Grouped denylist or allowlist rules, reloaded from their sources on refresh.
///
/// Readers always see one complete [`RuleSet`]. Refreshes are serialized.
pub struct ListCache {
    name: &'static str,
    groups: Vec<String>,
    sources: Vec<ListSource>,
    loader: SourceLoader,
    concurrency: usize,
    state: Mutex<RefreshState>,
    current: ArcSwap<RuleSet>,
}

impl ListCache {
    pub fn new(
        name: &'static str,
        lists: &BTreeMap<String, Vec<ListSource>>,
        loader: SourceLoader,
        concurrency: usize,
    ) -> Self {
        let (groups, sources): (Vec<String>, Vec<ListSource>) = lists
            .iter()
            .flat_map(|(group, sources)| {
                sources
                    .iter()
                    .map(move |source| (group.clone(), source.clone()))
            })
            .unzip();

        let mut empty = FxHashMap::default();
        for group in lists.keys() {
            empty.insert(group.clone(), Vec::new());
        }

        Self {
            name,
            state: Mutex::new(RefreshState {
                slots: SourceSlots::new(sources.len()),
                generation: 0,
            }),
            groups,
            sources,
            loader,
            concurrency,
            current: ArcSwap::from_pointee(RuleSet::new(0, empty)),
        }
    }

    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// First of `groups` whose rules match `name`.
    pub fn matching_group<'a, I>(&self, name: &str, groups: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.current.load().matching_group(name, groups)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Reloads every source and publishes the result.
    ///
    /// A failed source keeps its previous rules. The new set is published even when some
    /// sources failed; the error then lists them.
    pub async fn refresh(&self, token: &CancellationToken) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        token_check(token)?;

        let grammar = ListEntryGrammar;
        let loads = self
            .loader
            .load_all(token, &self.sources, &grammar, self.concurrency)
            .await;

        if token.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        for (index, load) in loads.iter().enumerate() {
            let fresh = if load.outcome.is_failed() {
                None
            } else {
                Some(SourceRules::from_entries(
                    load.records.iter().flatten().cloned(),
                ))
            };
            if !state.slots.update(index, fresh) && load.outcome.is_failed() {
                warn!(cache = self.name, source = %load.source, "No previous rules to keep for failed source");
            }
        }

        state.generation += 1;
        let mut groups: FxHashMap<String, Vec<Arc<SourceRules>>> = FxHashMap::default();
        for group in &self.groups {
            groups.entry(group.clone()).or_default();
        }
        for (index, group) in self.groups.iter().enumerate() {
            if let Some(rules) = state.slots.get(index) {
                groups.entry(group.clone()).or_default().push(Arc::clone(rules));
            }
        }
        let set = RuleSet::new(state.generation, groups);
        let entries = set.entry_count();
        self.current.store(Arc::new(set));

        info!(
            cache = self.name,
            generation = state.generation,
            sources = self.sources.len(),
            entries,
            "List cache refreshed"
        );

        match failed_sources_error(self.name, &loads) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn token_check(token: &CancellationToken) -> Result<(), DomainError> {
    if token.is_cancelled() {
        Err(DomainError::Cancelled)
    } else {
        Ok(())
    }
}

#[async_trait]
impl Refreshable for ListCache {
    fn name(&self) -> &str {
        self.name
    }

    async fn refresh(&self, token: &CancellationToken) -> Result<(), DomainError> {
        ListCache::refresh(self, token).await
    }
}
