pub mod source_fetcher;
pub mod source_loader;

pub use source_fetcher::SourceFetcher;
pub use source_loader::{SourceLoad, SourceLoader, SourceOutcome};
