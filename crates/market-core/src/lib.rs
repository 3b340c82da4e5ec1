#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for market indicator providers.
//!
//! This crate provides the foundational abstractions shared by every provider:
//!
//! - [`MarketProvider`](provider::MarketProvider) - Base trait for all providers
//! - [`QuoteProvider`](provider::QuoteProvider) - Fetches one batch of indicator quotes
//! - [`SessionCache`](session::SessionCache) - Caching abstraction for session credentials
//! - [`Snapshot`](types::Snapshot) - The consolidated result of one fetch cycle

/// Error types for market data operations.
pub mod error;
/// Fixed-precision rendering of raw quote values.
pub mod format;
/// Provider traits for fetching indicator quotes.
pub mod provider;
/// Session credentials and the session cache trait.
pub mod session;
/// Core data types (Instrument, InstrumentRecord, Snapshot, etc.).
pub mod types;
/// Vendor identifiers.
pub mod vendor;

// Re-export commonly used items at crate root
pub use error::{MarketError, Result};
pub use format::{DECIMAL_PLACES, format_decimal, format_percent};
pub use provider::{MarketProvider, QuoteProvider};
pub use session::{Session, SessionCache};
pub use types::{FetchStatus, Field, Instrument, InstrumentRecord, QuoteBatch, RecordSet, Snapshot};
pub use vendor::Vendor;
