//! Decoding of extraction-service responses into typed bill records.
//!
//! The upstream service answers in free-form text: the JSON payload may
//! arrive bare, fenced in a markdown code block, or surrounded by prose.
//! The contract is therefore "well-formed JSON somewhere in the text",
//! never "exact shape guaranteed".

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::DecodeError;
use crate::models::bill::{BillRecord, LineItem, PriceValue};
use crate::normalize::{coerce_numeric, normalize_date, normalize_price};

/// Literal reply the extraction service gives for non-receipt documents.
pub const NOT_A_BILL_SENTINEL: &str = "error";

lazy_static! {
    /// Fenced code block with an optional language tag.
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)\r?\n?```").unwrap();
}

/// Payload shape as promised by the extraction prompt.
#[derive(Debug, Deserialize)]
struct RawResponse {
    store: String,
    category: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    items: Vec<RawItem>,
    #[serde(default)]
    total: Option<PriceValue>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    item_name: String,
    #[serde(default)]
    item_price: Option<PriceValue>,
}

/// Decode a raw extraction-service reply into a [`BillRecord`].
///
/// The not-a-bill sentinel is detected before any JSON parsing and maps
/// to [`DecodeError::NotABill`]; everything else that fails to yield a
/// bill is [`DecodeError::Malformed`].
pub fn decode(response_text: &str) -> Result<BillRecord, DecodeError> {
    if response_text.trim() == NOT_A_BILL_SENTINEL {
        return Err(DecodeError::NotABill);
    }

    let candidate = FENCED_BLOCK
        .captures(response_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response_text)
        .trim();

    // The model occasionally fences even the sentinel.
    if candidate == NOT_A_BILL_SENTINEL {
        return Err(DecodeError::NotABill);
    }

    let raw: RawResponse =
        serde_json::from_str(candidate).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    project(raw)
}

/// Project the loosely-typed wire payload into the strict internal model.
/// All normalization happens here, once; downstream components only ever
/// see typed data.
fn project(raw: RawResponse) -> Result<BillRecord, DecodeError> {
    if raw.store.trim().is_empty() {
        return Err(DecodeError::Malformed("empty store name".to_string()));
    }
    if raw.category.trim().is_empty() {
        return Err(DecodeError::Malformed("empty category".to_string()));
    }

    let items = raw
        .items
        .into_iter()
        .map(|item| LineItem {
            name: item.item_name,
            price: item.item_price.as_ref().and_then(coerce_price),
        })
        .collect();

    Ok(BillRecord {
        store: raw.store.trim().to_string(),
        category: raw.category.trim().to_string(),
        date: raw.date.as_deref().and_then(normalize_date),
        items,
        total: raw.total.as_ref().and_then(coerce_price),
    })
}

/// Coerce a wire price, falling back to full currency stripping for
/// strings like "2,50 €" that plain coercion rejects.
fn coerce_price(value: &PriceValue) -> Option<rust_decimal::Decimal> {
    coerce_numeric(value).or_else(|| match value {
        PriceValue::Text(s) => normalize_price(s),
        PriceValue::Number(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const PAYLOAD: &str = r#"{"store":"REWE","category":"Lebensmittel","date":"2025-12-19","items":[{"item_name":"Brot","item_price":2.5}],"total":2.5}"#;

    #[test]
    fn test_decode_fenced_payload() {
        let text = format!("```json\n{}\n```", PAYLOAD);
        let bill = decode(&text).unwrap();

        assert_eq!(bill.store, "REWE");
        assert_eq!(bill.category, "Lebensmittel");
        assert_eq!(bill.date, NaiveDate::from_ymd_opt(2025, 12, 19));
        assert_eq!(bill.items.len(), 1);
        assert_eq!(bill.items[0].name, "Brot");
        assert_eq!(bill.items[0].price, Some(Decimal::from_str("2.5").unwrap()));
        assert_eq!(bill.total, Some(Decimal::from_str("2.5").unwrap()));
    }

    #[test]
    fn test_decode_bare_payload() {
        let bill = decode(PAYLOAD).unwrap();
        assert_eq!(bill.store, "REWE");
    }

    #[test]
    fn test_decode_payload_in_prose() {
        let text = format!(
            "Here is the extracted data:\n\n```json\n{}\n```\n\nLet me know if you need more.",
            PAYLOAD
        );
        let bill = decode(&text).unwrap();
        assert_eq!(bill.items.len(), 1);
    }

    #[test]
    fn test_decode_fence_without_language_tag() {
        let text = format!("```\n{}\n```", PAYLOAD);
        assert_eq!(decode(&text).unwrap().store, "REWE");
    }

    #[test]
    fn test_decode_sentinel() {
        assert!(matches!(decode("error"), Err(DecodeError::NotABill)));
        assert!(matches!(decode("  error\n"), Err(DecodeError::NotABill)));
        assert!(matches!(
            decode("```\nerror\n```"),
            Err(DecodeError::NotABill)
        ));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode("I could not read this document."),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode("```json\n{\"store\": \"REWE\"\n```"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_missing_store_is_malformed() {
        let text = r#"{"category":"Lebensmittel","items":[],"total":0}"#;
        assert!(matches!(decode(text), Err(DecodeError::Malformed(_))));

        let empty = r#"{"store":"  ","category":"Lebensmittel","items":[],"total":0}"#;
        assert!(matches!(decode(empty), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_price_variants() {
        let text = r#"{
            "store": "Edeka",
            "category": "Lebensmittel",
            "date": "10.12.25",
            "items": [
                {"item_name": "4x Semmel", "item_price": "2,00"},
                {"item_name": "Bananen 1,2kg", "item_price": "1,99 €"},
                {"item_name": "Pfand", "item_price": -0.75},
                {"item_name": "Unleserlich", "item_price": "???"}
            ],
            "total": "3,24"
        }"#;
        let bill = decode(text).unwrap();

        assert_eq!(bill.date, NaiveDate::from_ymd_opt(2025, 12, 10));
        assert_eq!(
            bill.items[0].price,
            Some(Decimal::from_str("2.00").unwrap())
        );
        assert_eq!(
            bill.items[1].price,
            Some(Decimal::from_str("1.99").unwrap())
        );
        assert_eq!(
            bill.items[2].price,
            Some(Decimal::from_str("-0.75").unwrap())
        );
        assert_eq!(bill.items[3].price, None);
        assert_eq!(bill.total, Some(Decimal::from_str("3.24").unwrap()));
    }

    #[test]
    fn test_decode_optional_fields_absent() {
        let text = r#"{"store":"REWE","category":"Lebensmittel"}"#;
        let bill = decode(text).unwrap();
        assert_eq!(bill.date, None);
        assert!(bill.items.is_empty());
        assert_eq!(bill.total, None);
    }
}
