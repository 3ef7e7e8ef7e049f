#![allow(dead_code)]

use async_trait::async_trait;
use bguard_application::ports::ByteSourceFetcher;
use bguard_domain::{DomainError, ListSource};
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replays a fixed script of results, one per call. The last entry repeats once the script
/// is exhausted.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Bytes, DomainError>>>,
    last: Mutex<Option<Result<Bytes, DomainError>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<&str, DomainError>>) -> Self {
        let script = script
            .into_iter()
            .map(|r| r.map(|s| Bytes::copy_from_slice(s.as_bytes())))
            .collect();
        Self {
            script: Mutex::new(script),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(body: &str) -> Self {
        Self::new(vec![Ok(body)])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn fetch_error(reason: &str) -> DomainError {
    DomainError::Fetch {
        list: "scripted".to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl ByteSourceFetcher for ScriptedFetcher {
    async fn fetch(&self, _source: &ListSource) -> Result<Bytes, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last.clone().unwrap_or_else(|| Err(fetch_error("empty script"))),
        }
    }
}
