#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance quote provider.
//!
//! This crate provides the primary provider of the market banner. It
//! implements [`MarketProvider`] and [`QuoteProvider`] from `market-core`.
//!
//! # Features
//!
//! - Cookie/crumb session bootstrap, cached across fetch cycles
//! - One v7 quote request for all twelve global indicators
//! - Symbol-keyed extraction with per-field failure isolation
//! - Market open/closed flag from the Dow's `marketState`
//!
//! # Example
//!
//! ```no_run
//! use market_yahoo::YahooProvider;
//! use market_core::QuoteProvider;
//!
//! # async fn example() -> market_core::Result<()> {
//! let provider = YahooProvider::new();
//! let batch = provider.fetch_quotes().await?;
//! println!("Fetched {} records", batch.records.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use market_cache::InMemorySessionCache;
use market_core::{
    Instrument, MarketError, MarketProvider, QuoteBatch, QuoteProvider, Result, Session,
    SessionCache,
};
use reqwest::{Client, StatusCode, Url, header};
use tracing::{debug, instrument, warn};

/// Structured extraction of quote responses.
pub mod extract;
/// Session bootstrap.
pub mod session;

pub use extract::{QUOTE_INSTRUMENTS, QUOTE_SYMBOLS, SymbolMapping, extract_quotes, symbol_list};
pub use session::{SessionBootstrap, session_from_env};

/// Yahoo Finance v7 quote API URL.
const QUOTE_API_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Provider name, also used as the session cache key.
pub(crate) const PROVIDER_NAME: &str = "Yahoo Finance";

/// User agent for HTTP requests.
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Fixed query parameters appended after `crumb` and `symbols`.
const QUOTE_QUERY_PARTS: [(&str, &str); 7] = [
    ("range", "1d"),
    ("interval", "5m"),
    ("indicators", "close"),
    ("includeTimestamps", "false"),
    ("includePrePost", "false"),
    ("corsDomain", "finance.yahoo.com"),
    (".tsrc", "finance"),
];

/// Yahoo Finance quote provider.
///
/// Implements [`MarketProvider`] and [`QuoteProvider`]. Each fetch issues a
/// single quote request; sessions come from a fixed override, the session
/// cache, or a fresh bootstrap, in that order.
pub struct YahooProvider {
    client: Client,
    bootstrap: SessionBootstrap,
    cache: Arc<dyn SessionCache>,
    fixed_session: Option<Session>,
    quote_url: String,
}

impl std::fmt::Debug for YahooProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooProvider")
            .field("quote_url", &self.quote_url)
            .field("fixed_session", &self.fixed_session.is_some())
            .finish()
    }
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// Sessions are cached in memory for one hour.
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self::with_client(client)
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            bootstrap: SessionBootstrap::new(client.clone()),
            client,
            cache: Arc::new(InMemorySessionCache::new()),
            fixed_session: None,
            quote_url: QUOTE_API_URL.to_string(),
        }
    }

    /// Replace the session cache.
    #[must_use]
    pub fn with_session_cache(mut self, cache: Arc<dyn SessionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Use a pre-obtained session instead of bootstrapping one.
    ///
    /// A session missing its cookie or crumb is ignored and the provider keeps
    /// bootstrapping its own.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        if session.is_complete() {
            self.fixed_session = Some(session);
        } else {
            warn!("Ignoring incomplete session override");
        }
        self
    }

    /// Use the session from `YAHOO_COOKIE`/`YAHOO_CRUMB` when both are set.
    #[must_use]
    pub fn with_env_session(self) -> Self {
        match session_from_env() {
            Some(session) => {
                debug!("Using session from environment");
                self.with_session(session)
            }
            None => self,
        }
    }

    /// Point the provider at different quote and bootstrap endpoints.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        quote_url: impl Into<String>,
        cookie_url: impl Into<String>,
        crumb_url: impl Into<String>,
    ) -> Self {
        self.quote_url = quote_url.into();
        self.bootstrap = SessionBootstrap::with_urls(self.client.clone(), cookie_url, crumb_url);
        self
    }

    /// Build the quote URL for a crumb.
    fn build_quote_url(&self, crumb: &str) -> Result<Url> {
        let symbols = symbol_list();
        let params = [("crumb", crumb), ("symbols", symbols.as_str())]
            .into_iter()
            .chain(QUOTE_QUERY_PARTS);
        Url::parse_with_params(&self.quote_url, params)
            .map_err(|e| MarketError::InvalidParameter(format!("quote url: {e}")))
    }

    /// Returns a usable session, bootstrapping one on a cache miss.
    async fn session(&self) -> Result<Session> {
        if let Some(session) = &self.fixed_session {
            return Ok(session.clone());
        }

        if let Some(session) = self.cache.get(PROVIDER_NAME).await? {
            if session.is_complete() {
                return Ok(session);
            }
        }

        let session = self.bootstrap.acquire_session().await?;
        self.cache.put(PROVIDER_NAME, &session).await?;
        Ok(session)
    }

    /// Issue the quote request and return the raw body.
    async fn fetch_body(&self, url: Url, session: &Session) -> Result<String> {
        debug!("Fetching quotes: {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "*/*")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, session.cookie())
            .header(header::ORIGIN, "https://finance.yahoo.com")
            .header(header::REFERER, "https://finance.yahoo.com")
            .header("Sec-Fetch-Dest", "empty")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "same-site")
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MarketError::AuthenticationFailed(PROVIDER_NAME.to_string()));
        }
        if !status.is_success() {
            return Err(MarketError::Network(format!(
                "HTTP {status} from {PROVIDER_NAME}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Yahoo Finance quotes for global indices, treasury yield, commodities and currencies"
    }

    fn instruments(&self) -> &[Instrument] {
        &QUOTE_INSTRUMENTS
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    #[instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn fetch_quotes(&self) -> Result<QuoteBatch> {
        let session = self.session().await?;
        let url = self.build_quote_url(session.crumb())?;

        match self.fetch_body(url, &session).await {
            Ok(body) => extract_quotes(&body),
            Err(e) => {
                if e.is_auth_rejection() && self.fixed_session.is_none() {
                    warn!(error = %e, "Session rejected, dropping cached crumb");
                    self.cache.invalidate(PROVIDER_NAME).await?;
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_cache::NoopSessionCache;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const QUOTE_BODY: &str = r#"{"quoteResponse":{"result":[
        {"symbol":"^DJI","marketState":"REGULAR","regularMarketPrice":39112.16,
         "regularMarketChange":201.74,"regularMarketChangePercent":0.52},
        {"symbol":"CL=F","regularMarketPrice":78.1,
         "regularMarketChange":-1.5,"regularMarketChangePercent":-2.3}
    ],"error":null}}"#;

    /// Local HTTP server answering by path prefix and recording request paths.
    struct StubServer {
        base: String,
        paths: Arc<Mutex<Vec<String>>>,
    }

    impl StubServer {
        async fn start(routes: Vec<(&'static str, String)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let paths = Arc::new(Mutex::new(Vec::new()));
            let seen = Arc::clone(&paths);

            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let text = String::from_utf8_lossy(&request);
                    let path = text.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let response = routes
                        .iter()
                        .find(|(prefix, _)| path.starts_with(prefix))
                        .map_or_else(|| reply("404 Not Found", "", ""), |(_, r)| r.clone());
                    seen.lock().unwrap().push(path);
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            Self { base, paths }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base)
        }

        fn hits(&self, prefix: &str) -> usize {
            self.paths
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.starts_with(prefix))
                .count()
        }

        fn provider(&self) -> YahooProvider {
            let client = Client::builder().no_proxy().build().unwrap();
            YahooProvider::with_client(client).with_endpoints(
                self.url("/quote"),
                self.url("/cookie"),
                self.url("/crumb"),
            )
        }
    }

    fn reply(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\n{headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn bootstrap_routes() -> Vec<(&'static str, String)> {
        vec![
            (
                "/cookie",
                reply("404 Not Found", "Set-Cookie: A3=d=AQABBK; Path=/; Secure\r\n", ""),
            ),
            ("/crumb", reply("200 OK", "", "Xy7.abc")),
        ]
    }

    #[test]
    fn test_build_quote_url() {
        let provider = YahooProvider::new();
        let url = provider.build_quote_url("Xy7.abc").unwrap();
        let query = url.query().unwrap();

        assert!(url.as_str().starts_with(QUOTE_API_URL));
        assert!(query.starts_with("crumb=Xy7.abc&symbols="));
        assert!(query.contains("%5EDJI%2C%5EIXIC"));
        assert!(query.contains("GC%3DF"));
        assert!(query.ends_with("corsDomain=finance.yahoo.com&.tsrc=finance"));
    }

    #[test]
    fn test_provider_info() {
        let provider = YahooProvider::new();

        assert_eq!(provider.name(), "Yahoo Finance");
        assert_eq!(provider.instruments().len(), 12);
        assert!(!provider.instruments().contains(&Instrument::SseComposite));
    }

    #[test]
    fn test_debug_hides_session() {
        let provider = YahooProvider::new().with_session(Session::new("A3=secret", "crumb123"));
        let debug_str = format!("{provider:?}");
        assert!(!debug_str.contains("secret"));
        assert!(!debug_str.contains("crumb123"));
    }

    #[tokio::test]
    async fn test_fixed_session_skips_bootstrap() {
        let provider = YahooProvider::new()
            .with_session_cache(Arc::new(NoopSessionCache::new()))
            .with_session(Session::new("A3=d=AQABBK", "Xy7.abc"))
            .with_endpoints(
                "http://127.0.0.1:9/v7/finance/quote",
                "http://127.0.0.1:9/cookie",
                "http://127.0.0.1:9/crumb",
            );

        // The quote request itself fails, not the bootstrap.
        let err = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, MarketError::Network(_)));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_is_session_error() {
        let provider = YahooProvider::new()
            .with_session_cache(Arc::new(NoopSessionCache::new()))
            .with_endpoints(
                "http://127.0.0.1:9/v7/finance/quote",
                "http://127.0.0.1:9/cookie",
                "http://127.0.0.1:9/crumb",
            );

        let err = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, MarketError::Session { .. }));
    }

    #[tokio::test]
    async fn test_cached_session_is_reused() {
        let cache = Arc::new(InMemorySessionCache::new());
        cache
            .put(PROVIDER_NAME, &Session::new("A3=cached", "cachedcrumb"))
            .await
            .unwrap();
        let provider = YahooProvider::new()
            .with_session_cache(cache)
            .with_endpoints(
                "http://127.0.0.1:9/v7/finance/quote",
                "http://127.0.0.1:9/cookie",
                "http://127.0.0.1:9/crumb",
            );

        let session = provider.session().await.unwrap();
        assert_eq!(session.crumb(), "cachedcrumb");
    }

    #[tokio::test]
    async fn test_incomplete_fixed_session_bootstraps() {
        let provider = YahooProvider::new()
            .with_session_cache(Arc::new(NoopSessionCache::new()))
            .with_session(Session::new("", "Xy7.abc"))
            .with_endpoints(
                "http://127.0.0.1:9/v7/finance/quote",
                "http://127.0.0.1:9/cookie",
                "http://127.0.0.1:9/crumb",
            );

        assert!(format!("{provider:?}").contains("fixed_session: false"));
        let err = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, MarketError::Session { .. }));
    }

    #[tokio::test]
    async fn test_second_fetch_reuses_cached_session() {
        let mut routes = bootstrap_routes();
        routes.push((
            "/quote",
            reply("200 OK", "Content-Type: application/json\r\n", QUOTE_BODY),
        ));
        let server = StubServer::start(routes).await;
        let provider = server.provider();

        let first = provider.fetch_quotes().await.unwrap();
        let second = provider.fetch_quotes().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.records[&Instrument::Oil].change(), Some("-2.30%"));
        assert_eq!(first.market_closed, Some(false));
        assert_eq!(server.hits("/cookie"), 1);
        assert_eq!(server.hits("/crumb"), 1);
        assert_eq!(server.hits("/quote"), 2);
    }

    #[tokio::test]
    async fn test_rejected_crumb_is_dropped_from_cache() {
        let mut routes = bootstrap_routes();
        routes.push(("/quote", reply("401 Unauthorized", "", "")));
        let server = StubServer::start(routes).await;
        let provider = server.provider();

        let err = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, MarketError::AuthenticationFailed(_)));
        assert!(err.is_auth_rejection());

        // The rejected session is gone, so the next cycle bootstraps again.
        let _ = provider.fetch_quotes().await.unwrap_err();
        assert_eq!(server.hits("/crumb"), 2);
    }

    #[tokio::test]
    async fn test_server_error_keeps_cached_session() {
        let mut routes = bootstrap_routes();
        routes.push(("/quote", reply("503 Service Unavailable", "", "")));
        let server = StubServer::start(routes).await;
        let provider = server.provider();

        let err = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, MarketError::Network(_)));
        assert!(!err.is_auth_rejection());

        let _ = provider.fetch_quotes().await.unwrap_err();
        assert_eq!(server.hits("/crumb"), 1);
    }
}
