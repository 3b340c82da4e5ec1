//! Cookie and crumb bootstrap for the Yahoo quote endpoint.
//!
//! Yahoo's quote API requires:
//! 1. A session cookie handed out by `fc.yahoo.com`
//! 2. A crumb token from `/v1/test/getcrumb`, requested with that cookie

use market_core::{MarketError, Result, Session};
use reqwest::{Client, header};
use tracing::{debug, instrument};

use crate::{PROVIDER_NAME, USER_AGENT};

/// Landing host that sets the session cookie.
pub const COOKIE_URL: &str = "https://fc.yahoo.com";

/// Endpoint returning the crumb for the current cookie.
pub const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// Environment variable holding a pre-obtained cookie.
pub const COOKIE_ENV: &str = "YAHOO_COOKIE";

/// Environment variable holding the crumb matching [`COOKIE_ENV`].
pub const CRUMB_ENV: &str = "YAHOO_CRUMB";

/// Crumbs longer than this are error pages, not tokens.
const MAX_CRUMB_LEN: usize = 100;

/// Performs the two-step exchange that yields a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionBootstrap {
    client: Client,
    cookie_url: String,
    crumb_url: String,
}

impl SessionBootstrap {
    /// Create a bootstrap against the public Yahoo endpoints.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_urls(client, COOKIE_URL, CRUMB_URL)
    }

    /// Create a bootstrap against custom endpoints.
    #[must_use]
    pub fn with_urls(
        client: Client,
        cookie_url: impl Into<String>,
        crumb_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cookie_url: cookie_url.into(),
            crumb_url: crumb_url.into(),
        }
    }

    /// Obtains a fresh cookie and crumb.
    ///
    /// Fails with [`MarketError::Session`] unless both values are non-empty.
    #[instrument(skip(self))]
    pub async fn acquire_session(&self) -> Result<Session> {
        // The landing host answers 404 but still sets the cookie, so the
        // status is not checked here.
        let response = self
            .client
            .get(&self.cookie_url)
            .header(header::REFERER, "https://finance.yahoo.com/")
            .send()
            .await
            .map_err(|e| MarketError::session(PROVIDER_NAME, format!("cookie request failed: {e}")))?;

        let cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(parse_set_cookie)
            .ok_or_else(|| MarketError::session(PROVIDER_NAME, "no session cookie in response"))?;

        debug!("Obtained session cookie");

        let response = self
            .client
            .get(&self.crumb_url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::REFERER, "https://finance.yahoo.com/")
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| MarketError::session(PROVIDER_NAME, format!("crumb request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MarketError::session(
                PROVIDER_NAME,
                format!("crumb request returned HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketError::session(PROVIDER_NAME, format!("failed to read crumb: {e}")))?;

        let crumb = validate_crumb(&body)
            .ok_or_else(|| MarketError::session(PROVIDER_NAME, "crumb response is not a token"))?;

        debug!("Obtained crumb");
        Ok(Session::new(cookie, crumb))
    }
}

/// Reads a session from [`COOKIE_ENV`] and [`CRUMB_ENV`] when both are set.
#[must_use]
pub fn session_from_env() -> Option<Session> {
    let cookie = std::env::var(COOKIE_ENV).ok()?;
    let crumb = std::env::var(CRUMB_ENV).ok()?;
    let session = Session::new(cookie, crumb);
    session.is_complete().then_some(session)
}

/// Extracts the leading `name=value` pair of a `Set-Cookie` header.
pub(crate) fn parse_set_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name.trim().is_empty() || value.trim().is_empty() {
        return None;
    }
    Some(pair.to_string())
}

/// Accepts a crumb body only if it looks like a token rather than a page.
pub(crate) fn validate_crumb(body: &str) -> Option<&str> {
    let crumb = body.trim();
    let is_page = crumb.contains("<html") || crumb.contains("<!DOCTYPE");
    let is_throttled = crumb.to_ascii_lowercase().contains("too many requests");
    if crumb.is_empty()
        || crumb.len() >= MAX_CRUMB_LEN
        || crumb.contains(char::is_whitespace)
        || is_page
        || is_throttled
    {
        return None;
    }
    Some(crumb)
}
