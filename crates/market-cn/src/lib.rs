#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! HTML-scraping providers for CN-market indices.
//!
//! # Usage
//!
//! ```rust,ignore
//! use market_cn::HtmlScrapeProvider;
//! use market_core::QuoteProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = HtmlScrapeProvider::qq()?;
//!     let batch = provider.fetch_quotes().await?;
//!     println!("{:?}", batch.records);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::Encoding;
use market_core::{Instrument, MarketError, MarketProvider, QuoteBatch, QuoteProvider, Result};
use reqwest::{Client, header};
use tracing::{debug, instrument};

/// Composite scrape patterns.
pub mod pattern;

pub use pattern::{Capture, CompositePattern, Layout, ScrapeRule};

/// Tencent market overview page listing the CN indices.
pub const QQ_MARKET_URL: &str = "https://stockapp.finance.qq.com/mstats/";

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Describes one scraped page.
#[derive(Clone, Debug)]
pub struct PageSpec {
    /// Provider name used in logs and errors.
    pub name: String,
    /// Page URL.
    pub url: String,
    /// Referer/origin the vendor expects.
    pub referer: String,
    /// Text encoding of the page body.
    pub encoding: &'static Encoding,
    /// One rule per instrument, in page order.
    pub rules: Vec<ScrapeRule>,
}

impl PageSpec {
    /// The Tencent market overview page with all four CN indices.
    #[must_use]
    pub fn qq() -> Self {
        Self {
            name: "Tencent Finance".to_string(),
            url: QQ_MARKET_URL.to_string(),
            referer: "https://stockapp.finance.qq.com/".to_string(),
            encoding: encoding_rs::GBK,
            rules: vec![
                ScrapeRule::new(Instrument::SseComposite, "上证指数", Layout::PercentPriceChange),
                ScrapeRule::new(Instrument::SzseComponent, "深证成指", Layout::PercentPriceChange),
                ScrapeRule::new(Instrument::Csi300, "沪深300", Layout::PercentPriceChange),
                ScrapeRule::new(Instrument::ChiNext, "创业板指", Layout::PercentPriceChange),
            ],
        }
    }
}

/// Provider that scrapes one page with a composite pattern.
///
/// Implements [`MarketProvider`] and [`QuoteProvider`].
#[derive(Debug, Clone)]
pub struct HtmlScrapeProvider {
    client: Client,
    spec: PageSpec,
    pattern: CompositePattern,
    instruments: Vec<Instrument>,
}

impl HtmlScrapeProvider {
    /// Create a provider for a page, compiling its composite pattern.
    pub fn new(spec: PageSpec) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self::with_client(client, spec)
    }

    /// Create a provider with a custom HTTP client.
    pub fn with_client(client: Client, spec: PageSpec) -> Result<Self> {
        let pattern = CompositePattern::build(spec.rules.clone())?;
        let instruments = spec.rules.iter().map(|rule| rule.instrument).collect();
        Ok(Self {
            client,
            spec,
            pattern,
            instruments,
        })
    }

    /// Create the Tencent market page provider.
    pub fn qq() -> Result<Self> {
        Self::new(PageSpec::qq())
    }

    /// Extracts a batch from an already decoded page.
    pub fn parse_page(&self, page: &str) -> Result<QuoteBatch> {
        let records = self.pattern.extract(&self.spec.name, page)?;
        debug!(records = records.len(), "Scraped page records");
        Ok(QuoteBatch::new(records))
    }

    /// Decodes a raw body using the page's encoding.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _, had_errors) = self.spec.encoding.decode(bytes);
        if had_errors {
            debug!(encoding = self.spec.encoding.name(), "Page contained malformed sequences");
        }
        text.into_owned()
    }
}

impl MarketProvider for HtmlScrapeProvider {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        "Scraped CN-market index quotes"
    }

    fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }
}

#[async_trait]
impl QuoteProvider for HtmlScrapeProvider {
    #[instrument(skip(self), fields(provider = %self.spec.name))]
    async fn fetch_quotes(&self) -> Result<QuoteBatch> {
        debug!("Fetching page: {}", self.spec.url);

        let response = self
            .client
            .get(&self.spec.url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .header(header::REFERER, &self.spec.referer)
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MarketError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                self.spec.name
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        self.parse_page(&self.decode(&bytes))
    }
}
