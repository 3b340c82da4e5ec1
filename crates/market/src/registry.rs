//! Provider registry running one fetch cycle per call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future;
use tracing::{debug, instrument, warn};

use market_core::{FetchStatus, MarketError, QuoteBatch, QuoteProvider, Result, Snapshot, Vendor};

use crate::vendor::{AuxiliarySource, OverlayPlan, overlay_for};

/// Registry holding the primary quote provider and the auxiliary overlay sources.
///
/// [`fetch`](Self::fetch) never fails: a cycle whose primary fetch fails yields
/// an empty snapshot carrying the error banner, and an auxiliary failure only
/// skips that overlay.
///
/// # Example
///
/// ```rust,ignore
/// use market::{MarketRegistry, Vendor};
///
/// let registry = MarketRegistry::new().with_yahoo().with_qq()?;
/// let snapshot = registry.fetch(Vendor::Qq).await;
/// let (ok, message) = snapshot.ok();
/// ```
#[derive(Default)]
pub struct MarketRegistry {
    primary: Option<Arc<dyn QuoteProvider>>,
    auxiliaries: HashMap<AuxiliarySource, Arc<dyn QuoteProvider>>,
    last_status: Mutex<FetchStatus>,
}

impl std::fmt::Debug for MarketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketRegistry")
            .field("primary", &self.primary.as_ref().map(|p| p.name()))
            .field(
                "auxiliaries",
                &self
                    .auxiliaries
                    .iter()
                    .map(|(source, p)| (*source, p.name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl MarketRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary provider, replacing any previous one.
    pub fn register_primary(&mut self, provider: Arc<dyn QuoteProvider>) {
        debug!(provider = provider.name(), "Registering primary provider");
        self.primary = Some(provider);
    }

    /// Register the provider behind an auxiliary source.
    pub fn register_auxiliary(&mut self, source: AuxiliarySource, provider: Arc<dyn QuoteProvider>) {
        debug!(provider = provider.name(), ?source, "Registering auxiliary provider");
        self.auxiliaries.insert(source, provider);
    }

    /// Runs one fetch cycle for a vendor and returns the consolidated snapshot.
    ///
    /// The primary and auxiliary requests are issued concurrently. The
    /// resulting status is also retained for [`status`](Self::status).
    #[instrument(skip_all, fields(vendor = %vendor))]
    pub async fn fetch(&self, vendor: Vendor) -> Snapshot {
        let snapshot = match self.assemble(vendor).await {
            Ok(batch) => Snapshot::from_batch(vendor, batch),
            Err(e) => {
                warn!(error = %e, "Fetch cycle failed");
                Snapshot::failed(vendor, &e)
            }
        };

        *self
            .last_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = snapshot.status().clone();

        snapshot
    }

    /// Returns whether the last cycle succeeded and its error text.
    ///
    /// Before the first cycle this reports success with an empty message.
    pub fn status(&self) -> (bool, String) {
        let status = self
            .last_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        (status.is_ok(), status.message().to_string())
    }

    async fn assemble(&self, vendor: Vendor) -> Result<QuoteBatch> {
        let primary = self.primary.as_ref().ok_or_else(|| {
            MarketError::ProviderNotConfigured("No primary provider registered".to_string())
        })?;

        let overlay = overlay_for(vendor).and_then(|plan| match self.auxiliaries.get(&plan.source) {
            Some(provider) => Some((plan, provider)),
            None => {
                warn!(source = ?plan.source, "No provider for overlay source, skipping");
                None
            }
        });

        let Some((plan, auxiliary)) = overlay else {
            debug!(provider = primary.name(), "Fetching primary quotes");
            return primary.fetch_quotes().await;
        };

        debug!(
            provider = primary.name(),
            auxiliary = auxiliary.name(),
            "Fetching primary and auxiliary quotes"
        );
        let (primary_result, auxiliary_result) =
            future::join(primary.fetch_quotes(), auxiliary.fetch_quotes()).await;

        let mut batch = primary_result?;
        apply_overlay(&mut batch, auxiliary.name(), auxiliary_result, plan);
        Ok(batch)
    }

    /// Register the Yahoo Finance provider as primary.
    ///
    /// A session from `YAHOO_COOKIE`/`YAHOO_CRUMB` is used when both are set.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo(mut self) -> Self {
        let provider = Arc::new(market_yahoo::YahooProvider::new().with_env_session());
        self.register_primary(provider);
        self
    }

    /// Register the Tencent market page as the CN-market overlay source.
    #[cfg(feature = "cn")]
    pub fn with_qq(mut self) -> Result<Self> {
        let provider = Arc::new(market_cn::HtmlScrapeProvider::qq()?);
        self.register_auxiliary(AuxiliarySource::CnMarket, provider);
        Ok(self)
    }
}

fn apply_overlay(
    batch: &mut QuoteBatch,
    auxiliary: &str,
    result: Result<QuoteBatch>,
    plan: OverlayPlan,
) {
    match result {
        Ok(aux) => {
            let replaced = batch.overlay(aux, plan.instruments);
            debug!(provider = auxiliary, replaced, "Applied overlay");
        }
        Err(e) => {
            warn!(provider = auxiliary, error = %e, "Auxiliary provider failed, keeping primary records");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_core::{Instrument, MarketProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const YAHOO_BODY: &str = r#"{"quoteResponse":{"result":[
        {"symbol":"^DJI","regularMarketPrice":39112.16,"regularMarketChange":201.74,"regularMarketChangePercent":0.5185,"marketState":"REGULAR"},
        {"symbol":"^IXIC","regularMarketPrice":16340.87,"regularMarketChange":-12.3,"regularMarketChangePercent":-0.0752},
        {"symbol":"^GSPC","regularMarketPrice":5214.08,"regularMarketChange":5.1,"regularMarketChangePercent":0.0979},
        {"symbol":"^N225","regularMarketPrice":38820.49,"regularMarketChange":-150.2,"regularMarketChangePercent":-0.3852},
        {"symbol":"^HSI","regularMarketPrice":17201.27,"regularMarketChange":88.1,"regularMarketChangePercent":0.5148},
        {"symbol":"^FTSE","regularMarketPrice":8139.83,"regularMarketChange":3.2,"regularMarketChangePercent":0.0393},
        {"symbol":"^GDAXI","regularMarketPrice":18001.6,"regularMarketChange":-40.0,"regularMarketChangePercent":-0.2217},
        {"symbol":"^TNX","regularMarketPrice":4.42,"regularMarketChange":0.03,"regularMarketChangePercent":0.6834},
        {"symbol":"CL=F","regularMarketPrice":78.1,"regularMarketChange":-1.84,"regularMarketChangePercent":-2.3},
        {"symbol":"JPY=X","regularMarketPrice":151.62,"regularMarketChange":0.11,"regularMarketChangePercent":0.0725},
        {"symbol":"EUR=X","regularMarketPrice":0.9241,"regularMarketChange":-0.001,"regularMarketChangePercent":-0.1081},
        {"symbol":"GC=F","regularMarketPrice":2338.4,"regularMarketChange":12.5,"regularMarketChangePercent":0.5374}
    ],"error":null}}"#;

    const QQ_PAGE: &str = r#"
        <tr><td><span>上证指数</span></td><td><span>+0.62%</span></td>
            <td><span>3,088.64</span></td><td><span>+19.02</span></td></tr>
        <tr><td><span>深证成指</span></td><td><span>-0.15%</span></td>
            <td><span>9,512.33</span></td><td><span>-14.27</span></td></tr>
        <tr><td><span>沪深300</span></td><td><span>+0.40%</span></td>
            <td><span>3,590.10</span></td><td><span>+14.31</span></td></tr>
        <tr><td><span>创业板指</span></td><td><span>-0.91%</span></td>
            <td><span>1,802.55</span></td><td><span>-16.56</span></td></tr>
    "#;

    type Source = Box<dyn Fn() -> Result<QuoteBatch> + Send + Sync>;

    /// Provider replaying a fixed body through the real extractors.
    struct FixtureProvider {
        name: &'static str,
        source: Source,
        calls: AtomicUsize,
    }

    impl FixtureProvider {
        fn new(name: &'static str, source: Source) -> Arc<Self> {
            Arc::new(Self {
                name,
                source,
                calls: AtomicUsize::new(0),
            })
        }

        fn yahoo(body: &'static str) -> Arc<Self> {
            Self::new("Yahoo fixture", Box::new(move || market_yahoo::extract_quotes(body)))
        }

        fn qq(page: &'static str) -> Arc<Self> {
            Self::new(
                "QQ fixture",
                Box::new(move || market_cn::HtmlScrapeProvider::qq()?.parse_page(page)),
            )
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Self::new(
                name,
                Box::new(|| Err(MarketError::Network("connection refused".to_string()))),
            )
        }
    }

    impl std::fmt::Debug for FixtureProvider {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FixtureProvider").field("name", &self.name).finish()
        }
    }

    impl MarketProvider for FixtureProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "test fixture"
        }

        fn instruments(&self) -> &[Instrument] {
            &[]
        }
    }

    #[async_trait]
    impl QuoteProvider for FixtureProvider {
        async fn fetch_quotes(&self) -> Result<QuoteBatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.source)()
        }
    }

    fn registry(primary: Arc<FixtureProvider>, auxiliary: Arc<FixtureProvider>) -> MarketRegistry {
        let mut registry = MarketRegistry::new();
        registry.register_primary(primary);
        registry.register_auxiliary(AuxiliarySource::CnMarket, auxiliary);
        registry
    }

    #[tokio::test]
    async fn test_primary_only_vendor() {
        let auxiliary = FixtureProvider::qq(QQ_PAGE);
        let registry = registry(FixtureProvider::yahoo(YAHOO_BODY), auxiliary.clone());

        let snapshot = registry.fetch(Vendor::Yahoo).await;

        assert_eq!(snapshot.vendor(), Vendor::Yahoo);
        assert_eq!(snapshot.ok(), (true, ""));
        assert_eq!(snapshot.records().len(), 12);
        assert!(!snapshot.is_closed());
        assert_eq!(auxiliary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlay_leaves_other_records_untouched() {
        let registry = registry(FixtureProvider::yahoo(YAHOO_BODY), FixtureProvider::qq(QQ_PAGE));

        let plain = registry.fetch(Vendor::Yahoo).await;
        let merged = registry.fetch(Vendor::Qq).await;

        assert!(merged.ok().0);
        assert_eq!(merged.records().len(), 16);
        for (instrument, record) in plain.records() {
            assert_eq!(merged.get(*instrument), Some(record), "{instrument}");
        }
        assert_eq!(
            merged.get(Instrument::Csi300).and_then(|r| r.latest()),
            Some("3590.10")
        );
    }

    #[tokio::test]
    async fn test_netease_overlays_exchanges_only() {
        let registry = registry(FixtureProvider::yahoo(YAHOO_BODY), FixtureProvider::qq(QQ_PAGE));

        let snapshot = registry.fetch(Vendor::Netease).await;

        assert!(snapshot.get(Instrument::SseComposite).is_some());
        assert!(snapshot.get(Instrument::SzseComponent).is_some());
        assert!(snapshot.get(Instrument::Csi300).is_none());
        assert!(snapshot.get(Instrument::ChiNext).is_none());
        assert_eq!(snapshot.records().len(), 14);
    }

    #[tokio::test]
    async fn test_auxiliary_failure_keeps_primary() {
        let auxiliary = FixtureProvider::failing("broken page");
        let registry = registry(FixtureProvider::yahoo(YAHOO_BODY), auxiliary.clone());

        let snapshot = registry.fetch(Vendor::Eastmoney).await;
        let primary_only = registry.fetch(Vendor::Yahoo).await;

        assert_eq!(snapshot.ok(), (true, ""));
        assert_eq!(snapshot.vendor(), Vendor::Eastmoney);
        assert_eq!(snapshot.records(), primary_only.records());
        assert!(snapshot.get(Instrument::SseComposite).is_none());
        assert_eq!(auxiliary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.status(), (true, String::new()));
    }

    #[tokio::test]
    async fn test_auxiliary_layout_change_keeps_primary() {
        let page = "<html><body>maintenance</body></html>";
        let registry = registry(FixtureProvider::yahoo(YAHOO_BODY), FixtureProvider::qq(page));

        let snapshot = registry.fetch(Vendor::Qq).await;

        assert!(snapshot.ok().0);
        assert!(snapshot.get(Instrument::SseComposite).is_none());
    }

    #[tokio::test]
    async fn test_malformed_primary_fails_cycle() {
        let registry = registry(FixtureProvider::yahoo("<html>"), FixtureProvider::qq(QQ_PAGE));

        let snapshot = registry.fetch(Vendor::Qq).await;
        let (ok, message) = snapshot.ok();

        assert!(!ok);
        assert_eq!(snapshot.vendor(), Vendor::Qq);
        assert!(message.starts_with("Error fetching market data...\n"));
        assert!(snapshot.records().is_empty());
        assert!(!registry.status().0);
    }

    #[tokio::test]
    async fn test_status_tracks_latest_cycle() {
        let mut registry = registry(FixtureProvider::failing("down"), FixtureProvider::qq(QQ_PAGE));

        registry.fetch(Vendor::Yahoo).await;
        let (ok, message) = registry.status();
        assert!(!ok);
        assert!(message.contains("connection refused"));

        registry.register_primary(FixtureProvider::yahoo(YAHOO_BODY));
        registry.fetch(Vendor::Yahoo).await;
        assert_eq!(registry.status(), (true, String::new()));
    }

    #[tokio::test]
    async fn test_fetch_is_idempotent() {
        let registry = registry(FixtureProvider::yahoo(YAHOO_BODY), FixtureProvider::qq(QQ_PAGE));

        let first = registry.fetch(Vendor::Sina).await;
        let second = registry.fetch(Vendor::Sina).await;

        assert_eq!(first.records(), second.records());
        assert_eq!(first.status(), second.status());
    }

    #[tokio::test]
    async fn test_missing_primary_is_reported() {
        let registry = MarketRegistry::new();

        let snapshot = registry.fetch(Vendor::Yahoo).await;

        assert!(!snapshot.ok().0);
        assert!(snapshot.ok().1.contains("No primary provider registered"));
    }

    #[tokio::test]
    async fn test_missing_auxiliary_skips_overlay() {
        let mut registry = MarketRegistry::new();
        registry.register_primary(FixtureProvider::yahoo(YAHOO_BODY));

        let snapshot = registry.fetch(Vendor::Qq).await;

        assert!(snapshot.ok().0);
        assert_eq!(snapshot.records().len(), 12);
    }

    #[test]
    fn test_debug_lists_providers() {
        let registry = registry(FixtureProvider::yahoo(YAHOO_BODY), FixtureProvider::qq(QQ_PAGE));
        let debug_str = format!("{registry:?}");
        assert!(debug_str.contains("Yahoo fixture"));
        assert!(debug_str.contains("QQ fixture"));
    }
}
