//! Bill data models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The canonical extracted representation of one receipt.
///
/// Built once per successfully decoded extraction response and never
/// mutated afterwards; all locale normalization happens during decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillRecord {
    /// Merchant name.
    pub store: String,

    /// Spending category (e.g. "Groceries", "Restaurant").
    pub category: String,

    /// Purchase date, normalized to a calendar date.
    /// `None` when the source supplied nothing parseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Line items in extraction order.
    pub items: Vec<LineItem>,

    /// Declared total price. `None` when missing or not coercible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

/// One purchased item line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description. May carry a multiplier prefix ("4x Bread") or a
    /// weight suffix; both are opaque to validation.
    pub name: String,

    /// Item price. Negative for returned deposits. `None` when the wire
    /// value could not be coerced to a number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// A price as it appears on the wire: the extraction service emits either
/// a JSON number or a locale-formatted string ("2,50").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    /// Plain JSON number.
    Number(f64),
    /// Textual price, possibly with a comma decimal separator.
    Text(String),
}

/// Output of the bill validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// True iff the item sum matches the declared total within tolerance.
    pub is_valid: bool,

    /// Sum of all item prices, rounded to 2 decimal places.
    pub calculated_sum: Decimal,

    /// Declared total, rounded to 2 decimal places.
    pub declared_total: Decimal,

    /// Absolute difference, rounded to 2 decimal places.
    pub difference: Decimal,

    /// Human-readable status summary.
    pub message: String,
}
