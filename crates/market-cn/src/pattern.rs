//! Composite pattern construction and capture mapping.

use market_core::{
    Field, Instrument, InstrumentRecord, MarketError, RecordSet, Result, format_decimal,
    format_percent,
};
use regex::Regex;
use tracing::debug;

/// Lazily skips arbitrary markup between two anchors.
const ANY: &str = r"\s*(?:.+?)";
/// Signed change inside a closing span.
const CHANGE: &str = r">([\+\-]?[\d\.,]+)</span>";
/// Unsigned price inside a closing span.
const PRICE: &str = r">([\d\.,]+)</span>";
/// Signed percentage, optionally suffixed.
const PERCENT: &str = r">([\+\-]?[\d\.,]+%?)<";

/// A value a rule captures from the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capture {
    /// Percent move.
    Percent,
    /// Latest price.
    Price,
    /// Absolute change.
    Change,
}

impl Capture {
    const fn pattern(self) -> &'static str {
        match self {
            Self::Percent => PERCENT,
            Self::Price => PRICE,
            Self::Change => CHANGE,
        }
    }
}

/// Order and meaning of the captures following an instrument's header marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Percent, price, then change: percent lands in `percent`, unsuffixed.
    PercentPriceChange,
    /// Percent then price, no change cell: percent lands in `change`, suffixed.
    PercentPrice,
    /// Price then percent: percent lands in `change`, suffixed.
    PricePercent,
}

impl Layout {
    const fn captures(self) -> &'static [Capture] {
        match self {
            Self::PercentPriceChange => &[Capture::Percent, Capture::Price, Capture::Change],
            Self::PercentPrice => &[Capture::Percent, Capture::Price],
            Self::PricePercent => &[Capture::Price, Capture::Percent],
        }
    }

    const fn has_change(self) -> bool {
        matches!(self, Self::PercentPriceChange)
    }
}

/// Locates one instrument on a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeRule {
    /// Instrument the captures populate.
    pub instrument: Instrument,
    /// Header text shown right before the instrument's cells.
    pub marker: String,
    /// Capture order following the marker.
    pub layout: Layout,
}

impl ScrapeRule {
    /// Create a rule.
    #[must_use]
    pub fn new(instrument: Instrument, marker: impl Into<String>, layout: Layout) -> Self {
        Self {
            instrument,
            marker: marker.into(),
            layout,
        }
    }

    /// The marker followed by each capture, with markup skipped in between.
    fn sub_pattern(&self) -> String {
        let mut pattern = format!(">{}<", regex::escape(&self.marker));
        for capture in self.layout.captures() {
            pattern.push_str(ANY);
            pattern.push_str(capture.pattern());
        }
        pattern
    }
}

/// All rules of a page joined into one regular expression.
#[derive(Clone, Debug)]
pub struct CompositePattern {
    regex: Regex,
    rules: Vec<ScrapeRule>,
}

impl CompositePattern {
    /// Joins the rules, in order, into a single dot-matches-newline pattern.
    ///
    /// Nothing is required after the last capture, so a page may end right
    /// behind the final cell.
    pub fn build(rules: Vec<ScrapeRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(MarketError::InvalidParameter(
                "a page needs at least one scrape rule".to_string(),
            ));
        }

        let body = rules
            .iter()
            .map(ScrapeRule::sub_pattern)
            .collect::<Vec<_>>()
            .join(ANY);
        let regex = Regex::new(&format!("(?s){body}"))
            .map_err(|e| MarketError::InvalidParameter(format!("scrape pattern: {e}")))?;

        Ok(Self { regex, rules })
    }

    /// Matches the page once and maps the capture groups onto records.
    ///
    /// A page that does not match is a provider-level failure. Individual
    /// captures that are not valid numbers only leave their field absent, and
    /// an instrument whose captures all failed is left out.
    pub fn extract(&self, provider: &str, page: &str) -> Result<RecordSet> {
        let captures = self
            .regex
            .captures(page)
            .ok_or_else(|| MarketError::PatternMismatch {
                provider: provider.to_string(),
            })?;

        let mut groups = captures.iter().skip(1);
        let mut records = RecordSet::new();

        for rule in &self.rules {
            let mut record = InstrumentRecord::new();
            for capture in rule.layout.captures() {
                let raw = groups.next().flatten().map(|m| m.as_str());
                let Some(value) = raw.and_then(parse_number) else {
                    debug!(instrument = %rule.instrument, ?capture, "Unparseable capture");
                    continue;
                };
                let (field, text) = match capture {
                    Capture::Price => (Field::Latest, format_decimal(value)),
                    Capture::Change => (Field::Change, format_decimal(value)),
                    Capture::Percent if rule.layout.has_change() => {
                        (Field::Percent, format_decimal(value))
                    }
                    Capture::Percent => (Field::Change, format_percent(value)),
                };
                record = record.with_opt(field, text);
            }
            if record.is_empty() {
                debug!(instrument = %rule.instrument, "No parseable captures");
                continue;
            }
            records.insert(rule.instrument, record);
        }

        Ok(records)
    }
}

/// Parses scraped numeric text such as `+1,234.5` or `-0.35%`.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && *c != '+')
        .collect();
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="idx"><span class="name">Dow</span>
          <span class="pct">+0.52%</span>
          <span class="px">39,112.16</span>
          <span class="chg">+201.74</span></div>
        <div class="idx"><span class="name">Oil</span>
          <span class="px">78.10</span>
          <span class="pct">-2.3%</span></div>
    "#;

    fn rules() -> Vec<ScrapeRule> {
        vec![
            ScrapeRule::new(Instrument::Dow, "Dow", Layout::PercentPriceChange),
            ScrapeRule::new(Instrument::Oil, "Oil", Layout::PricePercent),
        ]
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("+1,234.5"), Some(1234.5));
        assert_eq!(parse_number("-0.35%"), Some(-0.35));
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_sub_pattern_escapes_marker() {
        let rule = ScrapeRule::new(Instrument::Tokyo, "Nikkei (225)", Layout::PercentPrice);
        let pattern = rule.sub_pattern();
        assert!(pattern.starts_with(r">Nikkei \(225\)<"));
        assert!(pattern.ends_with(PRICE));
    }

    #[test]
    fn test_page_may_end_after_last_cell() {
        let pattern = CompositePattern::build(rules()).unwrap();
        let end = PAGE.rfind("</span>").unwrap() + "</span>".len();
        let records = pattern.extract("test", &PAGE[..end]).unwrap();
        assert_eq!(records[&Instrument::Oil].change(), Some("-2.30%"));
    }

    #[test]
    fn test_unparseable_captures_drop_instrument() {
        let rules = vec![
            ScrapeRule::new(Instrument::SseComposite, "SSE", Layout::PercentPriceChange),
            ScrapeRule::new(Instrument::Dow, "Dow", Layout::PercentPriceChange),
        ];
        let pattern = CompositePattern::build(rules).unwrap();
        let page = r#"
            <span>SSE</span><span>...%</span><span>...</span><span>,</span>
            <span>Dow</span><span>+0.52%</span><span>39,112.16</span><span>+201.74</span>
        "#;

        let records = pattern.extract("test", page).unwrap();

        assert!(!records.contains_key(&Instrument::SseComposite));
        assert_eq!(records[&Instrument::Dow].latest(), Some("39112.16"));
    }

    #[test]
    fn test_extract_maps_layouts() {
        let pattern = CompositePattern::build(rules()).unwrap();
        let records = pattern.extract("test", PAGE).unwrap();

        let dow = &records[&Instrument::Dow];
        assert_eq!(dow.latest(), Some("39112.16"));
        assert_eq!(dow.change(), Some("201.74"));
        assert_eq!(dow.percent(), Some("0.52"));

        let oil = &records[&Instrument::Oil];
        assert_eq!(oil.latest(), Some("78.10"));
        assert_eq!(oil.change(), Some("-2.30%"));
        assert!(oil.percent().is_none());
    }

    #[test]
    fn test_changed_layout_is_pattern_mismatch() {
        let pattern = CompositePattern::build(rules()).unwrap();
        let page = PAGE.replace("Oil", "Crude");
        let err = pattern.extract("test", &page).unwrap_err();
        assert_eq!(
            err,
            MarketError::PatternMismatch {
                provider: "test".to_string()
            }
        );
    }

    #[test]
    fn test_rules_must_not_be_empty() {
        assert!(CompositePattern::build(Vec::new()).is_err());
    }
}
