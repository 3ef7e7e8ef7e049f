#![allow(dead_code)]

use async_trait::async_trait;
use bguard_application::ports::Refreshable;
use bguard_domain::{DomainError, InitStrategy, RefreshPolicy};
use bguard_jobs::RefreshErrorLog;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Counts refresh calls and the highest number of calls in flight at once.
pub struct CountingRefresh {
    behavior: Behavior,
    delay: Duration,
    calls: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_first_only: AtomicBool,
}

impl CountingRefresh {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fail_first_only: AtomicBool::new(false),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Only the first call behaves as configured, later calls succeed.
    pub fn first_only(self) -> Self {
        self.fail_first_only.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Refreshable for CountingRefresh {
    fn name(&self) -> &str {
        "counting"
    }

    async fn refresh(&self, _token: &CancellationToken) -> Result<(), DomainError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        let configured = call == 0 || !self.fail_first_only.load(Ordering::SeqCst);
        match (&self.behavior, configured) {
            (Behavior::Fail, true) => Err(DomainError::Refresh("scripted failure".to_string())),
            (Behavior::Panic, true) => panic!("refresh exploded"),
            _ => Ok(()),
        }
    }
}

/// Error log recording every reported error.
pub fn recording_log() -> (RefreshErrorLog, Arc<Mutex<Vec<DomainError>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let log: RefreshErrorLog = Arc::new(move |e: &DomainError| {
        sink.lock().unwrap().push(e.clone());
    });
    (log, errors)
}

pub fn policy(init_strategy: InitStrategy, refresh_period: Duration) -> RefreshPolicy {
    RefreshPolicy {
        concurrency: 1,
        max_errors_per_source: None,
        refresh_period,
        init_strategy,
    }
}
