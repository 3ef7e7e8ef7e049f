use super::source_fetcher::SourceFetcher;
use crate::parsers::{for_each, AllowErrors, LineGrammar, LineSeriesParser};
use bguard_domain::ListSource;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Ok,
    /// Loaded, but `dropped` malformed lines were skipped.
    Partial { dropped: usize },
    /// Nothing from this source may be used.
    Failed { reason: String },
}

impl SourceOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed { .. })
    }
}

/// Result of loading one source. `records` is always empty for a failed source.
#[derive(Debug)]
pub struct SourceLoad<R> {
    pub source: ListSource,
    pub records: Vec<R>,
    pub outcome: SourceOutcome,
}

/// Fetch, parse and error-budget enforcement for list sources.
#[derive(Clone)]
pub struct SourceLoader {
    fetcher: SourceFetcher,
    max_errors_per_source: Option<usize>,
}

impl SourceLoader {
    pub fn new(fetcher: SourceFetcher, max_errors_per_source: Option<usize>) -> Self {
        Self {
            fetcher,
            max_errors_per_source,
        }
    }

    pub async fn load<G>(
        &self,
        token: &CancellationToken,
        source: &ListSource,
        grammar: &G,
    ) -> SourceLoad<G::Record>
    where
        G: LineGrammar + Sync,
        G::Record: Send,
    {
        let bytes = match self.fetcher.fetch(token, source).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(source = %source, error = %e, "List source could not be fetched");
                return Self::failed(source, e.to_string());
            }
        };

        let mut parser = AllowErrors::new(
            LineSeriesParser::new(&bytes, grammar),
            self.max_errors_per_source,
        );
        let mut records = Vec::new();
        let result = for_each(token, &mut parser, |record| {
            records.push(record);
            Ok(())
        });

        if let Err(e) = result {
            warn!(source = %source, error = %e, "List source rejected");
            return Self::failed(source, e.to_string());
        }

        let dropped = parser.error_count();
        let outcome = if dropped == 0 {
            SourceOutcome::Ok
        } else {
            SourceOutcome::Partial { dropped }
        };
        info!(source = %source, records = records.len(), dropped, "List source loaded");

        SourceLoad {
            source: source.clone(),
            records,
            outcome,
        }
    }

    /// Loads every source with at most `concurrency` loads in flight. Results keep the order
    /// of `sources` and the call returns only once every load has finished.
    pub async fn load_all<G>(
        &self,
        token: &CancellationToken,
        sources: &[ListSource],
        grammar: &G,
        concurrency: usize,
    ) -> Vec<SourceLoad<G::Record>>
    where
        G: LineGrammar + Sync,
        G::Record: Send,
    {
        let loads: Vec<_> = sources
            .iter()
            .map(|source| self.load(token, source, grammar))
            .collect();
        stream::iter(loads)
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    fn failed<R>(source: &ListSource, reason: String) -> SourceLoad<R> {
        SourceLoad {
            source: source.clone(),
            records: Vec::new(),
            outcome: SourceOutcome::Failed { reason },
        }
    }
}
