//! Fixed-precision rendering of raw quote values.
//!
//! Records never hold raw floats: every numeric field is stored as the plain
//! decimal text produced here, with no thousands separators or currency symbols.

/// Number of decimal places every quote value is rendered with.
pub const DECIMAL_PLACES: usize = 2;

/// Renders a raw value as fixed-precision decimal text.
///
/// Returns `None` for NaN and infinite values so callers can treat them as a
/// per-field decode failure. Negative zero renders as `0.00`.
#[must_use]
pub fn format_decimal(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    // -0.0 == 0.0, and rounding small negatives must not print "-0.00"
    let rounded = format!("{value:.DECIMAL_PLACES$}");
    if rounded.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        return Some(format!("{:.DECIMAL_PLACES$}", 0.0_f64));
    }
    Some(rounded)
}

/// Renders a raw percentage value with a trailing `%`.
#[must_use]
pub fn format_percent(value: f64) -> Option<String> {
    format_decimal(value).map(|text| text + "%")
}
