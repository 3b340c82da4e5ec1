//! Session credentials and the cache trait for reusing them.
//!
//! Some providers only answer quote requests that carry a session cookie and
//! a crumb derived from it. [`Session`] holds that pair; [`SessionCache`] lets
//! a provider reuse it across fetch cycles instead of bootstrapping every time.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// A cookie plus the crumb token the provider derived from it.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    cookie: String,
    crumb: String,
}

impl Session {
    /// Creates a session from raw values.
    #[must_use]
    pub fn new(cookie: impl Into<String>, crumb: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
            crumb: crumb.into(),
        }
    }

    /// The `name=value` cookie to send with each request.
    #[must_use]
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// The crumb token to pass as a query parameter.
    #[must_use]
    pub fn crumb(&self) -> &str {
        &self.crumb
    }

    /// A session is usable only when both values are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.cookie.trim().is_empty() && !self.crumb.trim().is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookie", &"[REDACTED]")
            .field("crumb", &"[REDACTED]")
            .finish()
    }
}

/// Trait for caching session credentials between fetch cycles.
///
/// Entries are keyed by provider name. Reuse is an optimization only: a
/// provider must be able to bootstrap a fresh session whenever the cache
/// misses.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Retrieves the cached session for a provider.
    ///
    /// Returns `Ok(Some(session))` if cached, `Ok(None)` if not.
    async fn get(&self, provider: &str) -> Result<Option<Session>>;

    /// Stores a session for a provider, replacing any previous one.
    async fn put(&self, provider: &str, session: &Session) -> Result<()>;

    /// Drops the cached session of a provider, e.g. after it was rejected.
    async fn invalidate(&self, provider: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_completeness() {
        assert!(Session::new("A3=d=AQABBK", "Xy7.abc").is_complete());
        assert!(!Session::new("", "Xy7.abc").is_complete());
        assert!(!Session::new("A3=d=AQABBK", "  ").is_complete());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let session = Session::new("A3=secret_cookie", "secret_crumb");
        let debug_str = format!("{session:?}");
        assert!(!debug_str.contains("secret_cookie"));
        assert!(!debug_str.contains("secret_crumb"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
