//! Quote arithmetic.
//!
//! `QuoteTotals` stores only the three inputs (gross total, discount %, tax %);
//! every derived amount is recomputed on access so the figures can never drift
//! apart. Nothing here rounds: rounding happens once, when a value is formatted.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::error::QuoteError;
use crate::model::LineItem;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteTotals {
    gross_total: Decimal,
    discount_percent: Decimal,
    tax_percent: Decimal,
}

impl QuoteTotals {
    pub fn gross_total(&self) -> Decimal {
        self.gross_total
    }

    pub fn discount_percent(&self) -> Decimal {
        self.discount_percent
    }

    pub fn tax_percent(&self) -> Decimal {
        self.tax_percent
    }

    pub fn discount_value(&self) -> Decimal {
        self.gross_total * self.discount_percent / HUNDRED
    }

    /// Taxable base: gross total minus discount.
    pub fn net_amount(&self) -> Decimal {
        self.gross_total - self.discount_value()
    }

    pub fn tax_value(&self) -> Decimal {
        self.net_amount() * self.tax_percent / HUNDRED
    }

    pub fn final_total(&self) -> Decimal {
        self.net_amount() + self.tax_value()
    }
}

#[derive(Serialize)]
struct TotalsView {
    gross_total: Decimal,
    discount_percent: Decimal,
    discount_value: Decimal,
    net_amount: Decimal,
    tax_percent: Decimal,
    tax_value: Decimal,
    final_total: Decimal,
}

impl Serialize for QuoteTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TotalsView {
            gross_total: self.gross_total,
            discount_percent: self.discount_percent,
            discount_value: self.discount_value(),
            net_amount: self.net_amount(),
            tax_percent: self.tax_percent,
            tax_value: self.tax_value(),
            final_total: self.final_total(),
        }
        .serialize(serializer)
    }
}

/// Computes the totals of a quote.
///
/// Percentages must already be inside `[0, 100]` (see [`clamp_percent`]);
/// negative prices or quantities are rejected rather than corrected, and so
/// are amounts too large for the derived figures to be computed exactly.
pub fn compute_totals(
    items: &[LineItem],
    discount_percent: Decimal,
    tax_percent: Decimal,
) -> Result<QuoteTotals, QuoteError> {
    check_percent("discount", discount_percent)?;
    check_percent("tax", tax_percent)?;

    let mut gross_total = Decimal::ZERO;
    for item in items {
        if item.unit_price < Decimal::ZERO {
            return Err(QuoteError::InvalidInput(format!(
                "negative unit price {} for '{}'",
                item.unit_price, item.name
            )));
        }
        if item.quantity < 0 {
            return Err(QuoteError::InvalidInput(format!(
                "negative quantity {} for '{}'",
                item.quantity, item.name
            )));
        }
        gross_total = item
            .checked_subtotal()
            .and_then(|subtotal| gross_total.checked_add(subtotal))
            .ok_or_else(|| too_large(&item.name))?;
    }

    // The accessors multiply by at most two percentages.
    if gross_total
        .checked_mul(HUNDRED)
        .and_then(|g| g.checked_mul(HUNDRED))
        .is_none()
    {
        return Err(QuoteError::InvalidInput(format!(
            "gross total {gross_total} is too large"
        )));
    }

    Ok(QuoteTotals {
        gross_total,
        discount_percent,
        tax_percent,
    })
}

fn too_large(name: &str) -> QuoteError {
    QuoteError::InvalidInput(format!("amount too large for '{name}'"))
}

fn check_percent(label: &str, value: Decimal) -> Result<(), QuoteError> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(QuoteError::InvalidInput(format!(
            "{label} percentage {value} is outside 0..=100"
        )));
    }
    Ok(())
}

/// Bounds a user-entered percentage to `[0, 100]`.
pub fn clamp_percent(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::money;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn sample_items() -> Vec<LineItem> {
        vec![
            LineItem::new("Widget", dec!(10.00), 3),
            LineItem::new("Gadget", dec!(25.50), 1),
        ]
    }

    #[test]
    fn widget_and_gadget_scenario() {
        let totals = compute_totals(&sample_items(), dec!(10), dec!(22)).unwrap();

        assert_eq!(totals.gross_total(), dec!(55.50));
        assert_eq!(totals.discount_value(), dec!(5.55));
        assert_eq!(totals.net_amount(), dec!(49.95));
        assert_eq!(totals.tax_value(), dec!(10.989));
        assert_eq!(money(totals.tax_value()), "10.99");
        assert_eq!(money(totals.final_total()), "60.94");
    }

    #[test]
    fn empty_list_is_all_zero() {
        let totals = compute_totals(&[], dec!(0), dec!(22)).unwrap();
        assert!(totals.gross_total().is_zero());
        assert!(totals.discount_value().is_zero());
        assert!(totals.net_amount().is_zero());
        assert!(totals.tax_value().is_zero());
        assert!(totals.final_total().is_zero());
    }

    #[test]
    fn full_discount_zeroes_everything_downstream() {
        let totals = compute_totals(&sample_items(), dec!(100), dec!(22)).unwrap();
        assert_eq!(totals.discount_value(), dec!(55.50));
        assert!(totals.net_amount().is_zero());
        assert!(totals.tax_value().is_zero());
        assert!(totals.final_total().is_zero());
    }

    #[test]
    fn rejects_negative_inputs() {
        let items = vec![LineItem::new("Refund", dec!(-1), 1)];
        assert!(matches!(
            compute_totals(&items, dec!(0), dec!(0)),
            Err(QuoteError::InvalidInput(_))
        ));

        let items = vec![LineItem::new("Widget", dec!(1), -2)];
        assert!(compute_totals(&items, dec!(0), dec!(0)).is_err());

        assert!(compute_totals(&[], dec!(-5), dec!(0)).is_err());
        assert!(compute_totals(&[], dec!(0), dec!(-1)).is_err());
        assert!(compute_totals(&[], dec!(100.5), dec!(0)).is_err());
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let items = vec![LineItem::new("X", dec!(100000000000), 1_000_000_000_000_000_000)];
        assert!(matches!(
            compute_totals(&items, dec!(0), dec!(22)),
            Err(QuoteError::InvalidInput(_))
        ));

        // Fits as a gross total, but not once tax is applied.
        let huge = Decimal::from_i128_with_scale(10i128.pow(28), 0);
        let items = vec![LineItem::new("X", huge, 1)];
        assert!(compute_totals(&items, dec!(0), dec!(22)).is_err());

        let items = vec![
            LineItem::new("X", huge / dec!(10000000), 1),
            LineItem::new("Y", huge / dec!(10000000), 1),
        ];
        let totals = compute_totals(&items, dec!(100), dec!(100)).unwrap();
        assert!(totals.final_total().is_zero());
        let totals = compute_totals(&items, dec!(0), dec!(100)).unwrap();
        assert_eq!(totals.final_total(), huge / dec!(2500000));
    }

    #[test]
    fn clamp_bounds_percentages() {
        assert_eq!(clamp_percent(dec!(-3)), dec!(0));
        assert_eq!(clamp_percent(dec!(150)), dec!(100));
        assert_eq!(clamp_percent(dec!(12.5)), dec!(12.5));
    }

    #[test]
    fn serializes_derived_fields() {
        let totals = compute_totals(&sample_items(), dec!(10), dec!(22)).unwrap();
        let json = serde_json::to_value(totals).unwrap();
        let field = |name: &str| -> Decimal { json[name].as_str().unwrap().parse().unwrap() };
        assert_eq!(field("net_amount"), dec!(49.95));
        assert_eq!(field("discount_value"), dec!(5.55));
        assert_eq!(field("final_total"), dec!(60.939));
    }

    fn arb_item() -> impl Strategy<Value = LineItem> {
        (0i64..10_000_000, 1i64..=100)
            .prop_map(|(cents, qty)| LineItem::new("Item", Decimal::new(cents, 2), qty))
    }

    fn arb_percent() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000).prop_map(|bp| Decimal::new(bp, 2))
    }

    proptest! {
        #[test]
        fn gross_is_sum_of_subtotals(items in prop::collection::vec(arb_item(), 0..20)) {
            let totals = compute_totals(&items, Decimal::ZERO, Decimal::ZERO).unwrap();
            let expected: Decimal = items.iter().map(|i| i.unit_price * Decimal::from(i.quantity)).sum();
            prop_assert_eq!(totals.gross_total(), expected);
        }

        #[test]
        fn final_total_matches_closed_form(
            items in prop::collection::vec(arb_item(), 0..10),
            discount in arb_percent(),
            tax in arb_percent(),
        ) {
            let totals = compute_totals(&items, discount, tax).unwrap();
            let closed_form = totals.gross_total()
                * (Decimal::ONE - discount / HUNDRED)
                * (Decimal::ONE + tax / HUNDRED);
            prop_assert!((totals.final_total() - closed_form).abs() <= dec!(0.01));
        }

        #[test]
        fn same_inputs_same_totals(
            items in prop::collection::vec(arb_item(), 0..10),
            discount in arb_percent(),
            tax in arb_percent(),
        ) {
            let first = compute_totals(&items, discount, tax).unwrap();
            let second = compute_totals(&items, discount, tax).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
