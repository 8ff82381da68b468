//! Locale-aware numeric and date normalization.
//!
//! Receipts processed here are mostly German: prices use a comma decimal
//! separator ("13,5 €", "1.234,56€") and dates are often day-first
//! ("10.12.25"). These pure functions convert both into canonical forms.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::str::FromStr;

use crate::models::bill::PriceValue;

/// Extract a decimal value from a price string with currency decoration.
///
/// Whitespace, currency glyphs and every other character that is not a
/// digit, comma or minus are discarded; periods fall away here too, as
/// they only ever mark thousands in this locale. The remaining comma is
/// the decimal separator.
///
/// - `"13,5 €"` → `13.5`
/// - `"1.234,56€"` → `1234.56`
/// - `"-42,99 EUR"` → `-42.99`
///
/// Returns `None` when no parseable digits remain.
pub fn normalize_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '-'))
        .collect();

    Decimal::from_str(&cleaned.replace(',', ".")).ok()
}

/// Day-first formats tried after ISO parsing fails. Two-digit years come
/// first so chrono does not read "25" as the year 25 AD via `%Y`.
const DAY_FIRST_FORMATS: [&str; 6] = [
    "%d.%m.%y", "%d.%m.%Y", "%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y",
];

/// Parse a date string into a calendar date.
///
/// Attempts strict ISO-8601 first (a trailing `Z` is tolerated, full
/// RFC 3339 timestamps are reduced to their date part), then falls back
/// to day-first European formats such as `"10.12.25"` → 2025-12-10.
///
/// Returns `None` for empty or unparseable input; an absent date is a
/// soft validation failure for callers, never an error.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let iso = value.strip_suffix('Z').unwrap_or(value);
    if let Ok(date) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Some(stamp.date_naive());
    }

    DAY_FIRST_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Coerce a wire price value to a decimal.
///
/// Numbers pass through directly; text is trimmed and a comma decimal
/// separator converted before parsing. Unlike [`normalize_price`] this
/// does not strip currency glyphs - it is meant for values already
/// expected to be clean numbers or simple comma-decimals.
pub fn coerce_numeric(value: &PriceValue) -> Option<Decimal> {
    match value {
        PriceValue::Number(n) => Decimal::from_f64(*n),
        PriceValue::Text(s) => Decimal::from_str(&s.trim().replace(',', ".")).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_price_comma_decimal() {
        assert_eq!(
            normalize_price("13,5 €"),
            Some(Decimal::from_str("13.5").unwrap())
        );
        assert_eq!(
            normalize_price("1.234,56€"),
            Some(Decimal::from_str("1234.56").unwrap())
        );
        assert_eq!(
            normalize_price("-42,99 EUR"),
            Some(Decimal::from_str("-42.99").unwrap())
        );
    }

    #[test]
    fn test_normalize_price_no_digits() {
        assert_eq!(normalize_price(""), None);
        assert_eq!(normalize_price("EUR"), None);
        assert_eq!(normalize_price("- €"), None);
    }

    #[test]
    fn test_normalize_date_iso() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 19).unwrap();
        assert_eq!(normalize_date("2025-12-19"), Some(expected));
        assert_eq!(normalize_date("2025-12-19Z"), Some(expected));
        assert_eq!(normalize_date("2025-12-19T08:30:00+01:00"), Some(expected));
    }

    #[test]
    fn test_normalize_date_day_first() {
        assert_eq!(
            normalize_date("10.12.25"),
            Some(NaiveDate::from_ymd_opt(2025, 12, 10).unwrap())
        );
        assert_eq!(
            normalize_date("10.12.2025"),
            Some(NaiveDate::from_ymd_opt(2025, 12, 10).unwrap())
        );
        assert_eq!(
            normalize_date("10/12/2025"),
            Some(NaiveDate::from_ymd_opt(2025, 12, 10).unwrap())
        );
    }

    #[test]
    fn test_normalize_date_unparseable() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("   "), None);
        assert_eq!(normalize_date("yesterday"), None);
        assert_eq!(normalize_date("99.99.99"), None);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(
            coerce_numeric(&PriceValue::Number(2.5)),
            Some(Decimal::from_str("2.5").unwrap())
        );
        assert_eq!(
            coerce_numeric(&PriceValue::Text("2,5".to_string())),
            Some(Decimal::from_str("2.5").unwrap())
        );
        assert_eq!(
            coerce_numeric(&PriceValue::Text("  3.75 ".to_string())),
            Some(Decimal::from_str("3.75").unwrap())
        );
        assert_eq!(coerce_numeric(&PriceValue::Text("n/a".to_string())), None);
        // No currency stripping here - that is normalize_price territory.
        assert_eq!(coerce_numeric(&PriceValue::Text("2,5 €".to_string())), None);
    }
}
