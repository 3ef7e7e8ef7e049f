use super::list_entry::ListEntry;
use bguard_domain::dns_message::self_and_parents;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Compiled rules of a single list source.
#[derive(Debug, Default)]
pub struct SourceRules {
    exact: FxHashSet<String>,
    wildcards: FxHashSet<String>,
    regexes: Vec<Regex>,
}

impl SourceRules {
    pub fn from_entries(entries: impl IntoIterator<Item = ListEntry>) -> Self {
        let mut rules = Self::default();
        for entry in entries {
            match entry {
                ListEntry::Exact(name) => {
                    rules.exact.insert(name);
                }
                ListEntry::Wildcard(base) => {
                    rules.wildcards.insert(base);
                }
                ListEntry::Regex(re) => rules.regexes.push(re),
            }
        }
        rules
    }

    /// `name` must already be normalized.
    pub fn matches(&self, name: &str) -> bool {
        if self.exact.contains(name) {
            return true;
        }
        if !self.wildcards.is_empty()
            && self_and_parents(name).any(|suffix| self.wildcards.contains(suffix))
        {
            return true;
        }
        self.regexes.iter().any(|re| re.is_match(name))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcards.len() + self.regexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable view of every group of a list cache, published as a whole.
#[derive(Debug, Default)]
pub struct RuleSet {
    generation: u64,
    groups: FxHashMap<String, Vec<Arc<SourceRules>>>,
}

impl RuleSet {
    pub fn new(generation: u64, groups: FxHashMap<String, Vec<Arc<SourceRules>>>) -> Self {
        Self { generation, groups }
    }

    /// Number of refreshes that produced this set. `0` is the empty set before the first refresh.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn matches_in(&self, group: &str, name: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|sources| sources.iter().any(|rules| rules.matches(name)))
    }

    /// First group of `groups` with a rule matching `name`.
    pub fn matching_group<'a, I>(&self, name: &str, groups: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        groups
            .into_iter()
            .find(|group| self.matches_in(group, name))
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn entry_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|sources| sources.iter())
            .map(|rules| rules.len())
            .sum()
    }
}
