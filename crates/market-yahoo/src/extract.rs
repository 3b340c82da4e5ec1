//! Structured extraction of the v7 quote response.
//!
//! The request symbol list and the symbol-to-instrument mapping are the same
//! table ([`QUOTE_SYMBOLS`]), so the two cannot drift apart. Results are
//! matched to instruments by the `symbol` they report; only results that lack
//! a `symbol` key fall back to their position in the table.

use market_core::{
    Field, Instrument, InstrumentRecord, MarketError, QuoteBatch, RecordSet, Result,
    format_decimal, format_percent,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

/// Maps a requested Yahoo symbol to the instrument it feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolMapping {
    /// Yahoo ticker as sent in the `symbols` query parameter.
    pub symbol: &'static str,
    /// Instrument the result populates.
    pub instrument: Instrument,
    /// Optional display name stored in the record's `name` field.
    pub name: Option<&'static str>,
}

impl SymbolMapping {
    const fn new(symbol: &'static str, instrument: Instrument) -> Self {
        Self {
            symbol,
            instrument,
            name: None,
        }
    }

    const fn named(symbol: &'static str, instrument: Instrument, name: &'static str) -> Self {
        Self {
            symbol,
            instrument,
            name: Some(name),
        }
    }
}

/// Symbols requested from Yahoo, in request order.
pub static QUOTE_SYMBOLS: [SymbolMapping; 12] = [
    SymbolMapping::new("^DJI", Instrument::Dow),
    SymbolMapping::new("^IXIC", Instrument::Nasdaq),
    SymbolMapping::new("^GSPC", Instrument::Sp500),
    SymbolMapping::new("^N225", Instrument::Tokyo),
    SymbolMapping::new("^HSI", Instrument::HongKong),
    SymbolMapping::new("^FTSE", Instrument::London),
    SymbolMapping::new("^GDAXI", Instrument::Frankfurt),
    SymbolMapping::named("^TNX", Instrument::Yield, "10-year Yield"),
    SymbolMapping::new("CL=F", Instrument::Oil),
    SymbolMapping::new("JPY=X", Instrument::Yen),
    SymbolMapping::new("EUR=X", Instrument::Euro),
    SymbolMapping::new("GC=F", Instrument::Gold),
];

/// The instruments covered by [`QUOTE_SYMBOLS`].
pub static QUOTE_INSTRUMENTS: [Instrument; 12] = [
    Instrument::Dow,
    Instrument::Nasdaq,
    Instrument::Sp500,
    Instrument::Tokyo,
    Instrument::HongKong,
    Instrument::London,
    Instrument::Frankfurt,
    Instrument::Yield,
    Instrument::Oil,
    Instrument::Yen,
    Instrument::Euro,
    Instrument::Gold,
];

/// Comma separated symbol list for the `symbols` query parameter.
#[must_use]
pub fn symbol_list() -> String {
    QUOTE_SYMBOLS
        .iter()
        .map(|mapping| mapping.symbol)
        .collect::<Vec<_>>()
        .join(",")
}

/// Extracts a [`QuoteBatch`] from a v7 quote response body.
///
/// Fails only when the `{"quoteResponse":{"result":[...]}}` envelope is
/// absent or malformed. Missing results and missing or non-numeric fields
/// leave the corresponding instrument or field out of the batch.
pub fn extract_quotes(body: &str) -> Result<QuoteBatch> {
    let envelope: QuoteEnvelope =
        serde_json::from_str(body).map_err(|e| MarketError::Envelope(e.to_string()))?;

    let results = match envelope.quote_response.result {
        Some(results) => results,
        None => {
            let reason = envelope
                .quote_response
                .error
                .map(|error| error.to_string())
                .unwrap_or_else(|| "quoteResponse.result is null".to_string());
            return Err(MarketError::Envelope(reason));
        }
    };

    let mut records = RecordSet::new();
    let mut market_closed = None;

    for (position, entry) in results.iter().enumerate() {
        let Some(mapping) = resolve_mapping(entry, position) else {
            continue;
        };

        if mapping.instrument == Instrument::Dow {
            market_closed = entry
                .get("marketState")
                .and_then(Value::as_str)
                .map(|state| state != "REGULAR");
        }

        let record = assign(entry, mapping);
        if record.latest().is_none() && record.change().is_none() && record.percent().is_none() {
            debug!(symbol = mapping.symbol, "No numeric fields in quote result");
            continue;
        }
        records.insert(mapping.instrument, record);
    }

    debug!(
        results = results.len(),
        records = records.len(),
        "Extracted quote records"
    );

    let batch = QuoteBatch::new(records);
    Ok(match market_closed {
        Some(closed) => batch.with_market_closed(closed),
        None => batch,
    })
}

fn resolve_mapping(entry: &Value, position: usize) -> Option<&'static SymbolMapping> {
    match entry.get("symbol").and_then(Value::as_str) {
        Some(symbol) => {
            let mapping = QUOTE_SYMBOLS.iter().find(|m| m.symbol == symbol);
            if mapping.is_none() {
                trace!(symbol, "Ignoring unrequested symbol");
            }
            mapping
        }
        None => QUOTE_SYMBOLS.get(position),
    }
}

/// Builds the record for one result according to the instrument's
/// change-as-percent convention.
fn assign(entry: &Value, mapping: &SymbolMapping) -> InstrumentRecord {
    let price = numeric(entry, "regularMarketPrice");
    let change = numeric(entry, "regularMarketChange");
    let percent = numeric(entry, "regularMarketChangePercent");

    let record = InstrumentRecord::new().with_opt(Field::Latest, price.and_then(format_decimal));

    let record = if mapping.instrument.change_as_percent() {
        record.with_opt(Field::Change, percent.and_then(format_percent))
    } else {
        record
            .with_opt(Field::Change, change.and_then(format_decimal))
            .with_opt(Field::Percent, percent.and_then(format_decimal))
    };

    record.with_opt(Field::Name, mapping.name.map(str::to_string))
}

/// Reads a numeric field, accepting both plain numbers and `{"raw": n}` objects.
fn numeric(entry: &Value, key: &str) -> Option<f64> {
    match entry.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::Object(object) => object.get("raw").and_then(Value::as_f64),
        _ => None,
    }
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// v7 quote API response.
#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<Value>,
}
