//! Provider traits for fetching indicator quotes.
//!
//! This module defines the core provider traits:
//!
//! - [`MarketProvider`] - Base trait for all providers
//! - [`QuoteProvider`] - Issues one request per fetch and returns extracted records

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{Instrument, QuoteBatch},
};

/// Base trait for all market data providers.
///
/// All providers implement this trait to describe themselves and the
/// instruments their responses cover.
pub trait MarketProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;

    /// Returns the instruments a successful fetch yields records for.
    fn instruments(&self) -> &[Instrument];
}

/// Provider of indicator quotes.
///
/// One call is one attempt: implementations issue a single request, never
/// retry, and convert every whole-response failure into an error. Per-field
/// decode failures are absorbed by leaving the field out of the record.
#[async_trait]
pub trait QuoteProvider: MarketProvider {
    /// Fetches and extracts the current quotes.
    async fn fetch_quotes(&self) -> Result<QuoteBatch>;
}
