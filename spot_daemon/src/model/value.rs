//! Turning located page text into a quote value.
//!
//! Parsing strips presentation (thousands separators, currency signs, spaces), restores
//! an implied decimal point for sources that drop it, and reads an `f64`. Validation then
//! decides whether that number may be published at all: it must be finite, positive and
//! inside the key's plausible range. Nothing here touches the cache.

use spot_common::config::PlausibleRange;
use spot_common::{ParseError, ValidationError};

/// Parse raw value text such as `"2,935.50"` or `"$4.15"`.
///
/// With `implied_decimals = Some(n)`, text without a `.` and longer than `n + 1` digits
/// gets a decimal point inserted before its last `n` digits (`"293550"` -> `2935.50`).
pub fn parse_value(raw: &str, implied_decimals: Option<u32>) -> Result<f64, ParseError> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$') && !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Err(ParseError::ContentMissing);
    }
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
    {
        return Err(ParseError::Malformed(raw.to_string()));
    }

    if let Some(decimals) = implied_decimals.map(|d| d as usize) {
        let digits = cleaned.trim_start_matches(['-', '+']).len();
        if decimals > 0 && !cleaned.contains('.') && digits > decimals + 1 {
            cleaned.insert(cleaned.len() - decimals, '.');
        }
    }

    cleaned
        .parse::<f64>()
        .map_err(|_| ParseError::Malformed(raw.to_string()))
}

/// Accept `value` only if it is positive, finite and within `range`.
pub fn validate_value(value: f64, range: &PlausibleRange) -> Result<f64, ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::NotPositive(value));
    }
    if !range.contains(value) {
        return Err(ValidationError::OutOfRange {
            value,
            min: range.min,
            max: range.max,
        });
    }
    Ok(value)
}
