//! In-memory session cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use market_core::{Result, Session, SessionCache};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Default lifetime of a cached session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: chrono::DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// In-memory session cache keyed by provider name.
///
/// Entries older than the configured TTL are treated as misses on `get`, so a
/// provider re-bootstraps once the crumb is likely to have expired upstream.
#[derive(Debug)]
pub struct InMemorySessionCache {
    sessions: RwLock<HashMap<String, CacheEntry<Session>>>,
    ttl: Duration,
}

impl Default for InMemorySessionCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl InMemorySessionCache {
    /// Create a new empty cache with the default one hour TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl SessionCache for InMemorySessionCache {
    #[instrument(skip(self))]
    async fn get(&self, provider: &str) -> Result<Option<Session>> {
        let cache = self.sessions.read().await;
        match cache.get(provider) {
            Some(entry) if !entry.is_stale(self.ttl) => {
                debug!("Cache hit for session");
                Ok(Some(entry.data.clone()))
            }
            Some(_) => {
                debug!("Cached session expired");
                Ok(None)
            }
            None => {
                debug!("Cache miss for session");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, session))]
    async fn put(&self, provider: &str, session: &Session) -> Result<()> {
        let mut cache = self.sessions.write().await;
        cache.insert(provider.to_string(), CacheEntry::new(session.clone()));
        debug!("Cached session");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate(&self, provider: &str) -> Result<()> {
        if self.sessions.write().await.remove(provider).is_some() {
            debug!("Invalidated session");
        }
        Ok(())
    }
}
