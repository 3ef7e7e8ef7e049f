use bguard_application::ports::Refreshable;
use bguard_domain::{DomainError, InitStrategy, RefreshPolicy};
use std::any::Any;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Callback receiving every refresh error that is not returned to the caller.
pub type RefreshErrorLog = Arc<dyn Fn(&DomainError) + Send + Sync>;

/// Logs a refresh error of `name` at error level.
pub fn log_refresh_error(name: impl Into<String>) -> RefreshErrorLog {
    let name = name.into();
    Arc::new(move |e: &DomainError| {
        error!(target_name = %name, error = %e, "List refresh failed");
    })
}

/// Runs the first load of a [`Refreshable`] according to its [`InitStrategy`], then reloads it
/// every refresh period until cancelled.
pub struct RefreshScheduler {
    policy: RefreshPolicy,
}

impl RefreshScheduler {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self { policy }
    }

    /// Returns once the initial load is done, or right away for [`InitStrategy::Fast`].
    ///
    /// Only a failed initial load under [`InitStrategy::FailOnError`] is returned as an error.
    /// The handle, when present, belongs to the background task (initial load for `Fast`,
    /// then the periodic loop). It finishes after `token` is cancelled.
    pub async fn start_periodic_refresh(
        &self,
        token: &CancellationToken,
        target: Arc<dyn Refreshable>,
        log_err: RefreshErrorLog,
    ) -> Result<Option<JoinHandle<()>>, DomainError> {
        let period = self.policy.refresh_period;
        info!(
            target_name = target.name(),
            strategy = self.policy.init_strategy.as_str(),
            period_secs = period.as_secs(),
            "Starting list refresh"
        );

        match self.policy.init_strategy {
            InitStrategy::Fast => {
                let token = token.clone();
                let periodic = self.policy.is_periodic();
                let handle = tokio::spawn(async move {
                    if let Err(e) = run_guarded(&target, &token, "initialization").await {
                        log_err(&e);
                    }
                    if periodic {
                        periodic_loop(target, token, period, log_err).await;
                    }
                });
                return Ok(Some(handle));
            }
            InitStrategy::Blocking | InitStrategy::FailOnError => {
                if let Err(e) = run_guarded(&target, token, "initialization").await {
                    log_err(&e);
                    if self.policy.init_strategy == InitStrategy::FailOnError {
                        return Err(e);
                    }
                }
            }
        }

        if !self.policy.is_periodic() {
            return Ok(None);
        }
        let token = token.clone();
        Ok(Some(tokio::spawn(periodic_loop(target, token, period, log_err))))
    }
}

async fn periodic_loop(
    target: Arc<dyn Refreshable>,
    token: CancellationToken,
    period: std::time::Duration,
    log_err: RefreshErrorLog,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    // a run longer than the period drops the ticks it covered
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        debug!(target_name = target.name(), "Periodic list refresh");
        match run_guarded(&target, &token, "periodic refresh").await {
            Ok(()) => {}
            Err(DomainError::Cancelled) if token.is_cancelled() => break,
            Err(e) => log_err(&e),
        }
    }

    debug!(target_name = target.name(), "Periodic list refresh stopped");
}

/// Runs one refresh in its own task so a panic surfaces as [`DomainError::Panic`].
async fn run_guarded(
    target: &Arc<dyn Refreshable>,
    token: &CancellationToken,
    phase: &'static str,
) -> Result<(), DomainError> {
    let target = Arc::clone(target);
    let token = token.clone();
    tokio::spawn(async move { target.refresh(&token).await })
        .await
        .unwrap_or_else(|e| Err(join_error(phase, e)))
}

fn join_error(phase: &str, e: JoinError) -> DomainError {
    if e.is_panic() {
        DomainError::Panic(format!(
            "panic during {}: {}",
            phase,
            panic_message(e.into_panic())
        ))
    } else {
        DomainError::Panic(format!("{} task aborted: {}", phase, e))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(_) => "unknown panic payload".to_string(),
    }
}
