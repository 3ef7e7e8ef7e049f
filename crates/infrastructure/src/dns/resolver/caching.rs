use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::config::CachingConfig;
use bguard_domain::{DomainError, Request, Response, ResponseType};
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{Record, RecordType};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

type CacheKey = (String, RecordType);

struct CacheEntry {
    message: Message,
    stored_at: Instant,
    ttl: u32,
}

impl CacheEntry {
    fn remaining(&self, now: Instant) -> Option<u32> {
        let elapsed = now.saturating_duration_since(self.stored_at).as_secs();
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        (elapsed < self.ttl).then(|| self.ttl - elapsed)
    }
}

/// LRU cache of answers keyed by question name and type.
pub struct CachingResolver {
    enabled: bool,
    min_ttl: u32,
    /// `None` keeps upstream TTLs uncapped.
    max_ttl: Option<u32>,
    /// `None` disables negative caching.
    negative_ttl: Option<u32>,
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    next: Arc<dyn Resolver>,
}

impl CachingResolver {
    pub fn new(config: &CachingConfig, next: Arc<dyn Resolver>) -> Self {
        let capacity = NonZeroUsize::new(config.max_items_count).unwrap_or(NonZeroUsize::MIN);
        Self {
            enabled: config.is_enabled(),
            min_ttl: config.min_time_secs,
            max_ttl: (config.max_time_secs > 0)
                .then(|| u32::try_from(config.max_time_secs).unwrap_or(u32::MAX)),
            negative_ttl: (config.cache_time_negative_secs > 0)
                .then(|| u32::try_from(config.cache_time_negative_secs).unwrap_or(u32::MAX)),
            entries: Mutex::new(LruCache::new(capacity)),
            next,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &CacheKey, id: u16) -> Option<Message> {
        let now = Instant::now();
        let mut entries = self.lock();
        let remaining = match entries.get(key) {
            Some(entry) => entry.remaining(now),
            None => return None,
        };
        let Some(remaining) = remaining else {
            entries.pop(key);
            return None;
        };

        let entry = entries.get(key)?;
        let mut message = entry.message.clone();
        message.set_id(id);
        set_answer_ttls(&mut message, remaining);
        Some(message)
    }

    /// TTL to cache `message` for, `None` when it must not be cached.
    fn cache_ttl(&self, message: &Message) -> Option<u32> {
        let negative = match message.response_code() {
            ResponseCode::NXDomain => true,
            ResponseCode::NoError => message.answers().is_empty(),
            _ => return None,
        };
        if negative {
            return self.negative_ttl;
        }

        let upstream = message.answers().iter().map(Record::ttl).min()?;
        let mut ttl = upstream.max(self.min_ttl);
        if let Some(max) = self.max_ttl {
            ttl = ttl.min(max);
        }
        (ttl > 0).then_some(ttl)
    }

    fn store(&self, key: CacheKey, message: &Message) {
        let Some(ttl) = self.cache_ttl(message) else {
            return;
        };
        let mut message = message.clone();
        set_answer_ttls(&mut message, ttl);
        debug!(domain = %key.0, qtype = %key.1, ttl, "Caching answer");
        self.lock().put(
            key,
            CacheEntry {
                message,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Time until the cached answer for `name`/`qtype` expires.
    pub fn remaining_ttl(&self, name: &str, qtype: RecordType) -> Option<Duration> {
        let key = (name.to_string(), qtype);
        let entries = self.lock();
        let entry = entries.peek(&key)?;
        entry
            .remaining(Instant::now())
            .map(|secs| Duration::from_secs(u64::from(secs)))
    }
}

fn set_answer_ttls(message: &mut Message, ttl: u32) {
    let mut answers = message.take_answers();
    for record in &mut answers {
        record.set_ttl(ttl);
    }
    message.insert_answers(answers);
}

#[async_trait]
impl Resolver for CachingResolver {
    fn name(&self) -> &'static str {
        "caching"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        if !self.enabled {
            return self.next.resolve(ctx, request).await;
        }
        let (Some(name), Some(qtype)) = (request.question_name(), request.query_type()) else {
            return self.next.resolve(ctx, request).await;
        };
        let key = (name, qtype);

        if let Some(message) = self.lookup(&key, request.message().id()) {
            debug!(domain = %key.0, qtype = %qtype, "Cache hit");
            return Ok(Response::new(message, ResponseType::Cached, "CACHED"));
        }

        let response = self.next.resolve(ctx, request).await?;
        self.store(key, &response.message);
        Ok(response)
    }
}
