//! No-op session cache implementation.

use async_trait::async_trait;
use market_core::{Result, Session, SessionCache};
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get` always returns `Ok(None)` and every other method returns `Ok`.
/// Providers using it bootstrap a new session on every fetch cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionCache;

impl NoopSessionCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionCache for NoopSessionCache {
    async fn get(&self, _provider: &str) -> Result<Option<Session>> {
        trace!("NoopSessionCache: get called, returning None");
        Ok(None)
    }

    async fn put(&self, _provider: &str, _session: &Session) -> Result<()> {
        trace!("NoopSessionCache: put called, doing nothing");
        Ok(())
    }

    async fn invalidate(&self, _provider: &str) -> Result<()> {
        trace!("NoopSessionCache: invalidate called, doing nothing");
        Ok(())
    }
}
