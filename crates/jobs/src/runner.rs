use crate::list_refresh::{log_refresh_error, RefreshScheduler};
use bguard_application::ports::Refreshable;
use bguard_domain::{DomainError, RefreshPolicy};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

struct RefreshJob {
    target: Arc<dyn Refreshable>,
    policy: RefreshPolicy,
}

/// Starts the refresh of every registered list in registration order.
pub struct JobRunner {
    jobs: Vec<RefreshJob>,
    shutdown: CancellationToken,
}

impl JobRunner {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            jobs: Vec::new(),
            shutdown,
        }
    }

    pub fn with_refresh(mut self, target: Arc<dyn Refreshable>, policy: RefreshPolicy) -> Self {
        self.jobs.push(RefreshJob { target, policy });
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Returns the first `failOnError` initialization error. Background tasks already spawned
    /// keep running until the shutdown token is cancelled.
    pub async fn start(self) -> Result<Vec<JoinHandle<()>>, DomainError> {
        info!(jobs = self.jobs.len(), "Starting background job runner");

        let mut handles = Vec::new();
        for job in self.jobs {
            let log_err = log_refresh_error(job.target.name());
            let scheduler = RefreshScheduler::new(job.policy);
            if let Some(handle) = scheduler
                .start_periodic_refresh(&self.shutdown, job.target, log_err)
                .await?
            {
                handles.push(handle);
            }
        }

        info!(background_tasks = handles.len(), "All background jobs started");
        Ok(handles)
    }
}
