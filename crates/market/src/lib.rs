#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Unified market indicator interface.
//!
//! This crate re-exports the core types and provider implementations, and
//! provides a [`MarketRegistry`] that runs fetch cycles and merges the
//! auxiliary CN-market overlay into the primary quotes.
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance primary provider
//! - `cn` - Scraped CN-market overlay provider
//!
//! # Example
//!
//! ```rust,ignore
//! use market::{MarketRegistry, Vendor};
//!
//! #[tokio::main]
//! async fn main() -> market::Result<()> {
//!     let registry = MarketRegistry::new().with_yahoo().with_qq()?;
//!
//!     let snapshot = registry.fetch(Vendor::Qq).await;
//!     for (instrument, record) in snapshot.records() {
//!         println!("{instrument}: {:?}", record.latest());
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use market_core::*;

// Session caches
pub use market_cache::{InMemorySessionCache, NoopSessionCache};

// Providers
#[cfg(feature = "cn")]
pub use market_cn::{HtmlScrapeProvider, PageSpec};
#[cfg(feature = "yahoo")]
pub use market_yahoo::YahooProvider;

mod registry;
mod vendor;

pub use registry::MarketRegistry;
pub use vendor::{AuxiliarySource, OverlayPlan, VENDOR_TABLE, VendorProfile, overlay_for, profile};
