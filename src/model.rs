use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One catalog entry selected for the quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, unit_price: Decimal, quantity: i64) -> Self {
        Self {
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// `None` when the product does not fit in a `Decimal`.
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    // Edits produce a new item; the list handed to the calculator is never mutated.
    pub fn with_quantity(&self, quantity: i64) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }

    pub fn with_unit_price(&self, unit_price: Decimal) -> Self {
        Self {
            unit_price,
            ..self.clone()
        }
    }
}

/// Tax rate applied to the whole quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TaxRate {
    Ordinary,
    Reduced,
    Minimum,
    Exempt,
    Custom(Decimal),
}

impl TaxRate {
    pub const PRESETS: [TaxRate; 4] = [
        TaxRate::Ordinary,
        TaxRate::Reduced,
        TaxRate::Minimum,
        TaxRate::Exempt,
    ];

    pub fn percent(&self) -> Decimal {
        match self {
            TaxRate::Ordinary => Decimal::from(22),
            TaxRate::Reduced => Decimal::from(10),
            TaxRate::Minimum => Decimal::from(4),
            TaxRate::Exempt => Decimal::ZERO,
            TaxRate::Custom(p) => *p,
        }
    }

    /// Matches a preset name ("ordinary", "reduced", ...) or a bare percentage ("22", "8.5").
    pub fn parse(raw: &str) -> Option<TaxRate> {
        let raw = raw.trim().trim_end_matches('%');
        match raw.to_lowercase().as_str() {
            "ordinary" => return Some(TaxRate::Ordinary),
            "reduced" => return Some(TaxRate::Reduced),
            "minimum" => return Some(TaxRate::Minimum),
            "exempt" => return Some(TaxRate::Exempt),
            _ => {}
        }
        let percent: Decimal = raw.parse().ok()?;
        Some(
            Self::PRESETS
                .into_iter()
                .find(|p| p.percent() == percent)
                .unwrap_or(TaxRate::Custom(percent)),
        )
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxRate::Ordinary => write!(f, "VAT 22% (Ordinary)"),
            TaxRate::Reduced => write!(f, "VAT 10% (Reduced)"),
            TaxRate::Minimum => write!(f, "VAT 4% (Minimum)"),
            TaxRate::Exempt => write!(f, "VAT 0% (Exempt)"),
            TaxRate::Custom(p) => write!(f, "VAT {}% (Custom)", p.normalize()),
        }
    }
}

/// Header fields of the printed quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub seller_info: String,
    pub buyer_info: String,
    pub bank_iban: String,
    pub valid_until: NaiveDate,
    pub issue_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn subtotal_is_price_times_quantity() {
        let item = LineItem::new("Widget", dec!(10.00), 3);
        assert_eq!(item.subtotal(), dec!(30.00));
    }

    #[test]
    fn edits_return_new_items() {
        let item = LineItem::new("Widget", dec!(10.00), 3);
        let edited = item.with_quantity(5).with_unit_price(dec!(9.50));
        assert_eq!(item.quantity, 3);
        assert_eq!(edited.quantity, 5);
        assert_eq!(edited.unit_price, dec!(9.50));
        assert_eq!(edited.name, "Widget");
    }

    #[test]
    fn tax_rate_parses_presets_and_custom_values() {
        assert_eq!(TaxRate::parse("reduced"), Some(TaxRate::Reduced));
        assert_eq!(TaxRate::parse("22"), Some(TaxRate::Ordinary));
        assert_eq!(TaxRate::parse("4%"), Some(TaxRate::Minimum));
        assert_eq!(TaxRate::parse("8.5"), Some(TaxRate::Custom(dec!(8.5))));
        assert_eq!(TaxRate::parse("abc"), None);
    }

    #[test]
    fn tax_rate_labels() {
        assert_eq!(TaxRate::Ordinary.to_string(), "VAT 22% (Ordinary)");
        assert_eq!(TaxRate::Custom(dec!(8.50)).to_string(), "VAT 8.5% (Custom)");
    }
}
