//! Core data types for market indicator quotes.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Instrument`] - A market indicator shown on the banner (Dow, Gold, ...)
//! - [`Field`] - The named fields an instrument record may carry
//! - [`InstrumentRecord`] - One normalized quote
//! - [`QuoteBatch`] - The records a single provider returned for one fetch
//! - [`Snapshot`] - The consolidated, immutable result of one fetch cycle
//! - [`FetchStatus`] - Cycle-scoped ok/error state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::MarketError;
use crate::vendor::Vendor;

/// A market indicator tracked by the snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// Dow Jones Industrial Average.
    Dow,
    /// NASDAQ Composite.
    Nasdaq,
    /// S&P 500.
    Sp500,
    /// Nikkei 225.
    Tokyo,
    /// Hang Seng.
    HongKong,
    /// FTSE 100.
    London,
    /// DAX.
    Frankfurt,
    /// US 10-year treasury yield.
    Yield,
    /// Crude oil futures.
    Oil,
    /// USD/JPY.
    Yen,
    /// EUR/USD.
    Euro,
    /// Gold futures.
    Gold,
    /// Shanghai Stock Exchange Composite.
    SseComposite,
    /// Shenzhen Stock Exchange Component.
    SzseComponent,
    /// CSI 300.
    Csi300,
    /// ChiNext.
    ChiNext,
}

impl Instrument {
    /// The CN-market indices only auxiliary providers supply.
    pub const CN_MARKET: [Self; 4] = [
        Self::SseComposite,
        Self::SzseComponent,
        Self::Csi300,
        Self::ChiNext,
    ];

    /// Human readable label used by renderers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Dow => "Dow",
            Self::Nasdaq => "Nasdaq",
            Self::Sp500 => "S&P 500",
            Self::Tokyo => "Tokyo",
            Self::HongKong => "HK",
            Self::London => "London",
            Self::Frankfurt => "Frankfurt",
            Self::Yield => "10-Year Yield",
            Self::Oil => "Oil",
            Self::Yen => "Yen",
            Self::Euro => "Euro",
            Self::Gold => "Gold",
            Self::SseComposite => "SSE",
            Self::SzseComponent => "SZSE",
            Self::Csi300 => "CSI300",
            Self::ChiNext => "ChiNext",
        }
    }

    /// Returns true if the displayed change of this instrument is its percent move.
    ///
    /// Commodities and currencies show the percent move as their change and
    /// carry no separate `percent` field; indices and the yield show the
    /// absolute change and a separate percent.
    #[must_use]
    pub const fn change_as_percent(&self) -> bool {
        matches!(self, Self::Oil | Self::Yen | Self::Euro | Self::Gold)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named field of an [`InstrumentRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Latest price or level.
    Latest,
    /// Change since the previous close; percent-suffixed for change-as-percent instruments.
    Change,
    /// Percent change, present only when `change` holds the absolute move.
    Percent,
    /// Display name override.
    Name,
}

impl Field {
    /// Returns the wire name of the field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Change => "change",
            Self::Percent => "percent",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized quote: a mapping from [`Field`] to formatted text.
///
/// Records are assembled by an extractor through [`InstrumentRecord::with`]
/// and are read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentRecord(BTreeMap<Field, String>);

impl InstrumentRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record with `field` set to `value`.
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.0.insert(field, value.into());
        self
    }

    /// Returns the record with `field` set when a value is present.
    #[must_use]
    pub fn with_opt(self, field: Field, value: Option<String>) -> Self {
        match value {
            Some(value) => self.with(field, value),
            None => self,
        }
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Latest price.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.get(Field::Latest)
    }

    /// Change value.
    #[must_use]
    pub fn change(&self) -> Option<&str> {
        self.get(Field::Change)
    }

    /// Percent value.
    #[must_use]
    pub fn percent(&self) -> Option<&str> {
        self.get(Field::Percent)
    }

    /// Display name override.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get(Field::Name)
    }

    /// Number of fields present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Records keyed by instrument.
pub type RecordSet = BTreeMap<Instrument, InstrumentRecord>;

/// The records one provider returned for one fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBatch {
    /// Records keyed by instrument.
    pub records: RecordSet,
    /// Whether the provider reported its market as closed, if it reports that at all.
    pub market_closed: Option<bool>,
}

impl QuoteBatch {
    /// Creates a batch from extracted records.
    #[must_use]
    pub fn new(records: RecordSet) -> Self {
        Self {
            records,
            market_closed: None,
        }
    }

    /// Sets the market-closed flag.
    #[must_use]
    pub fn with_market_closed(mut self, closed: bool) -> Self {
        self.market_closed = Some(closed);
        self
    }

    /// Replaces the records of the listed instruments with those from `auxiliary`.
    ///
    /// Replacement is per record: an overlaid record is the auxiliary record as
    /// a whole, never a union with the primary one. Instruments the auxiliary
    /// batch does not carry keep their primary record. Returns the number of
    /// records replaced.
    pub fn overlay(&mut self, mut auxiliary: Self, instruments: &[Instrument]) -> usize {
        let mut replaced = 0;
        for instrument in instruments {
            if let Some(record) = auxiliary.records.remove(instrument) {
                self.records.insert(*instrument, record);
                replaced += 1;
            }
        }
        replaced
    }
}

/// Cycle-scoped error state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum FetchStatus {
    /// The cycle completed.
    #[default]
    Ok,
    /// The cycle failed; carries a message suitable for an error banner.
    Failed(String),
}

impl FetchStatus {
    /// Builds the failed status for an error that aborted a cycle.
    #[must_use]
    pub fn from_error(error: &MarketError) -> Self {
        Self::Failed(format!("Error fetching market data...\n{error}"))
    }

    /// Returns true if the cycle completed.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the error message, empty when ok.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Ok => "",
            Self::Failed(message) => message,
        }
    }
}

/// The consolidated result of one fetch cycle.
///
/// A snapshot is built once from the merged [`QuoteBatch`] and never mutated;
/// the next cycle produces a new one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    vendor: Vendor,
    records: RecordSet,
    is_closed: bool,
    fetched_at: DateTime<Utc>,
    status: FetchStatus,
}

impl Snapshot {
    /// Assembles a successful snapshot from a merged batch.
    #[must_use]
    pub fn from_batch(vendor: Vendor, batch: QuoteBatch) -> Self {
        Self {
            vendor,
            records: batch.records,
            is_closed: batch.market_closed.unwrap_or(false),
            fetched_at: Utc::now(),
            status: FetchStatus::Ok,
        }
    }

    /// Builds an empty snapshot for a cycle that failed.
    #[must_use]
    pub fn failed(vendor: Vendor, error: &MarketError) -> Self {
        Self {
            vendor,
            records: RecordSet::new(),
            is_closed: false,
            fetched_at: Utc::now(),
            status: FetchStatus::from_error(error),
        }
    }

    /// The vendor this snapshot was produced for.
    #[must_use]
    pub const fn vendor(&self) -> Vendor {
        self.vendor
    }

    /// Returns the record for an instrument.
    #[must_use]
    pub fn get(&self, instrument: Instrument) -> Option<&InstrumentRecord> {
        self.records.get(&instrument)
    }

    /// All records of this snapshot.
    #[must_use]
    pub const fn records(&self) -> &RecordSet {
        &self.records
    }

    /// True when the primary provider reported its market closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// When the snapshot was assembled.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// The cycle status.
    #[must_use]
    pub const fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// Returns whether the cycle succeeded and the error text, empty when it did.
    #[must_use]
    pub fn ok(&self) -> (bool, &str) {
        (self.status.is_ok(), self.status.message())
    }
}
