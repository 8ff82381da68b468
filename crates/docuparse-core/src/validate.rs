//! Arithmetic validation of bill records.

use rust_decimal::Decimal;

use crate::models::bill::{BillRecord, ValidationVerdict};

/// Reconcile the line items of a bill against its declared total.
///
/// Returns `None` - validation cannot be performed, which is not the
/// same as invalid - when the bill has no items, no declared total, or
/// any line item whose price could not be coerced during decode.
///
/// Otherwise the verdict carries the item sum, the declared total and
/// their absolute difference, each rounded to 2 decimal places. The
/// tolerance is strict: a difference of exactly 0.01 is a mismatch.
pub fn validate(bill: &BillRecord) -> Option<ValidationVerdict> {
    if bill.items.is_empty() {
        return None;
    }
    let declared_total = bill.total?;

    let mut calculated_sum = Decimal::ZERO;
    for item in &bill.items {
        // Returned deposits carry negative prices and subtract normally.
        calculated_sum += item.price?;
    }

    let tolerance = Decimal::new(1, 2);
    let difference = (calculated_sum - declared_total).abs();
    let is_valid = difference < tolerance;

    Some(ValidationVerdict {
        is_valid,
        calculated_sum: calculated_sum.round_dp(2),
        declared_total: declared_total.round_dp(2),
        difference: difference.round_dp(2),
        message: if is_valid {
            "✓ Valid total".to_string()
        } else {
            "⚠ Price mismatch".to_string()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bill::LineItem;
    use std::str::FromStr;

    fn bill(prices: &[&str], total: Option<&str>) -> BillRecord {
        BillRecord {
            store: "REWE".to_string(),
            category: "Lebensmittel".to_string(),
            date: None,
            items: prices
                .iter()
                .enumerate()
                .map(|(i, p)| LineItem {
                    name: format!("Artikel {}", i + 1),
                    price: Decimal::from_str(p).ok(),
                })
                .collect(),
            total: total.map(|t| Decimal::from_str(t).unwrap()),
        }
    }

    #[test]
    fn test_matching_total_is_valid() {
        let verdict = validate(&bill(&["4.50", "3.00", "2.50"], Some("10.00"))).unwrap();

        assert!(verdict.is_valid);
        assert_eq!(verdict.calculated_sum, Decimal::from_str("10.00").unwrap());
        assert_eq!(verdict.declared_total, Decimal::from_str("10.00").unwrap());
        assert_eq!(verdict.difference, Decimal::from_str("0.00").unwrap());
        assert_eq!(verdict.message, "✓ Valid total");
    }

    #[test]
    fn test_mismatch_is_invalid() {
        let verdict = validate(&bill(&["4.50", "3.00", "2.50"], Some("10.02"))).unwrap();

        assert!(!verdict.is_valid);
        assert_eq!(verdict.difference, Decimal::from_str("0.02").unwrap());
        assert_eq!(verdict.message, "⚠ Price mismatch");
    }

    #[test]
    fn test_exact_tolerance_is_invalid() {
        // Strict less-than: 0.01 off is already a mismatch.
        let verdict = validate(&bill(&["10.00"], Some("10.01"))).unwrap();
        assert!(!verdict.is_valid);
        assert_eq!(verdict.difference, Decimal::from_str("0.01").unwrap());
    }

    #[test]
    fn test_returned_deposit_subtracts() {
        let verdict = validate(&bill(&["5.00", "-0.75"], Some("4.25"))).unwrap();
        assert!(verdict.is_valid);
        assert_eq!(verdict.calculated_sum, Decimal::from_str("4.25").unwrap());
    }

    #[test]
    fn test_empty_items_not_validatable() {
        assert!(validate(&bill(&[], Some("10.00"))).is_none());
    }

    #[test]
    fn test_missing_total_not_validatable() {
        assert!(validate(&bill(&["1.00"], None)).is_none());
    }

    #[test]
    fn test_uncoercible_price_not_validatable() {
        assert!(validate(&bill(&["1.00", "nope"], Some("1.00"))).is_none());
    }
}
