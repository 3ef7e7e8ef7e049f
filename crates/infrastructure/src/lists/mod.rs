//! Loading of denylists, allowlists and hosts files into queryable snapshots.

pub mod fetcher;
pub mod hosts_cache;
pub mod hosts_entry;
pub mod list_cache;
pub mod list_entry;
pub mod rules;
pub mod slots;

pub use fetcher::ListSourceFetcher;
pub use hosts_cache::{HostsFileCache, HostsTable};
pub use hosts_entry::{HostsEntry, HostsFileGrammar};
pub use list_cache::ListCache;
pub use list_entry::{ListEntry, ListEntryGrammar};
pub use rules::{RuleSet, SourceRules};
pub use slots::SourceSlots;

use bguard_application::use_cases::{SourceLoad, SourceOutcome};
use bguard_domain::DomainError;

/// Error reported by a refresh cycle in which some sources failed.
pub(crate) fn failed_sources_error<R>(cache: &str, loads: &[SourceLoad<R>]) -> Option<DomainError> {
    let failed: Vec<String> = loads
        .iter()
        .filter_map(|load| match &load.outcome {
            SourceOutcome::Failed { reason } => {
                Some(format!("{}: {}", load.source, reason))
            }
            _ => None,
        })
        .collect();

    if failed.is_empty() {
        return None;
    }
    Some(DomainError::Refresh(format!(
        "{}: {} of {} sources failed ({})",
        cache,
        failed.len(),
        loads.len(),
        failed.join("; ")
    )))
}
