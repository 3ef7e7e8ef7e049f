use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream {server} failed: {reason}")]
    Upstream { server: String, reason: String },

    #[error("Upstream {server} timed out")]
    UpstreamTimeout { server: String },

    #[error("No upstream servers configured")]
    NoUpstream,

    #[error("Fetch of {list} failed: {reason}")]
    Fetch { list: String, reason: String },

    #[error("Source {list} rejected: {reason}")]
    SourceFailed { list: String, reason: String },

    #[error("Refresh failed: {0}")]
    Refresh(String),

    #[error("{0}")]
    Panic(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    /// Cancellation and deadline errors come from the caller's context, not from the work itself.
    pub fn is_context_error(&self) -> bool {
        matches!(self, DomainError::Cancelled | DomainError::DeadlineExceeded)
    }
}
