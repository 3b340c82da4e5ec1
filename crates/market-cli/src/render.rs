//! Text and JSON rendering of snapshots.

use std::fmt::Write as _;

use market::{Instrument, InstrumentRecord, Snapshot};

/// Clears the terminal and homes the cursor.
pub(crate) const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const US_LINE: [Instrument; 3] = [Instrument::Dow, Instrument::Nasdaq, Instrument::Sp500];

const REGIONAL_LINE: [Instrument; 4] = [
    Instrument::Tokyo,
    Instrument::HongKong,
    Instrument::London,
    Instrument::Frankfurt,
];

const MACRO_LINE: [Instrument; 5] = [
    Instrument::Yield,
    Instrument::Oil,
    Instrument::Yen,
    Instrument::Euro,
    Instrument::Gold,
];

/// Renders the banner, or the error banner when the cycle failed.
pub(crate) fn render_text(snapshot: &Snapshot) -> String {
    let (ok, message) = snapshot.ok();
    if !ok {
        return format!("{message}\n");
    }

    let mut out = String::new();
    let state = if snapshot.is_closed() { "closed" } else { "open" };
    let _ = writeln!(
        out,
        "Markets {state} as of {}",
        snapshot.fetched_at().format("%Y-%m-%d %H:%M:%S UTC")
    );

    let lines: [&[Instrument]; 4] = [&US_LINE, &REGIONAL_LINE, &MACRO_LINE, &Instrument::CN_MARKET];
    for line in lines {
        if let Some(text) = render_line(snapshot, line) {
            out.push_str(&text);
            out.push('\n');
        }
    }
    out
}

/// Renders a snapshot as pretty JSON.
pub(crate) fn render_json(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(snapshot)
}

/// Joins the cells of one banner line, skipping instruments without a record.
fn render_line(snapshot: &Snapshot, instruments: &[Instrument]) -> Option<String> {
    let cells: Vec<String> = instruments
        .iter()
        .filter_map(|instrument| {
            snapshot
                .get(*instrument)
                .map(|record| render_cell(*instrument, record))
        })
        .collect();

    (!cells.is_empty()).then(|| cells.join("  "))
}

/// Renders one cell, preferring the record's display name over the default label.
fn render_cell(instrument: Instrument, record: &InstrumentRecord) -> String {
    let label = record.name().unwrap_or(instrument.label());
    let latest = record.latest().unwrap_or("-");
    let change = record.change().unwrap_or("-");
    if instrument.change_as_percent() {
        format!("{label} {latest} ({change})")
    } else {
        let percent = record.percent().map_or_else(|| "-".to_string(), |p| format!("{p}%"));
        format!("{label} {latest} ({change}, {percent})")
    }
}
