pub mod list_refresh;
pub mod runner;

pub use list_refresh::{log_refresh_error, RefreshErrorLog, RefreshScheduler};
pub use runner::JobRunner;
