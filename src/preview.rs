//! Terminal preview of the cart and the running total.

use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};
use serde::Serialize;
use tera::{Context, Tera};

use crate::calculator::QuoteTotals;
use crate::catalog::Catalog;
use crate::format;
use crate::model::LineItem;

const PREVIEW_TEMPLATE: &str = include_str!("../templates/preview.tera");

#[derive(Serialize)]
struct PreviewContext {
    currency: String,
    gross_total: String,
    has_discount: bool,
    discount_percent: String,
    discount_value: String,
    net_amount: String,
    tax_percent: String,
    tax_value: String,
    final_total: String,
}

/// The whole price list, as loaded.
pub fn catalog_table(catalog: &Catalog) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Item").add_attribute(Attribute::Bold),
        Cell::new("Unit price").add_attribute(Attribute::Bold),
        Cell::new("Default qty").add_attribute(Attribute::Bold),
    ]);
    for entry in catalog.entries() {
        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(format::price(entry.unit_price)).set_alignment(CellAlignment::Right),
            Cell::new(entry.default_quantity).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// The cart as a table: one row per item plus the gross total.
pub fn cart_table(items: &[LineItem], totals: &QuoteTotals) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Item"),
        Cell::new("Unit price"),
        Cell::new("Qty"),
        Cell::new("Subtotal"),
    ]);

    for item in items {
        let price = Cell::new(format::price(item.unit_price)).set_alignment(CellAlignment::Right);
        let price = if item.unit_price.is_zero() {
            price.fg(Color::Rgb { r: 185, g: 28, b: 28 })
        } else {
            price
        };
        table.add_row(vec![
            Cell::new(&item.name),
            price,
            Cell::new(item.quantity).set_alignment(CellAlignment::Right),
            Cell::new(format::money(item.subtotal())).set_alignment(CellAlignment::Right),
        ]);
    }

    table.add_row(vec![
        Cell::new("Gross total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format::money(totals.gross_total()))
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);
    table
}

/// The big running-total box shown before generating the document.
pub fn totals_summary(totals: &QuoteTotals, currency: &str) -> Result<String, tera::Error> {
    let data = PreviewContext {
        currency: currency.to_string(),
        gross_total: format::money(totals.gross_total()),
        has_discount: !totals.discount_percent().is_zero(),
        discount_percent: format::percent(totals.discount_percent()),
        discount_value: format::money(totals.discount_value()),
        net_amount: format::money(totals.net_amount()),
        tax_percent: format::percent(totals.tax_percent()),
        tax_value: format::money(totals.tax_value()),
        final_total: format::money(totals.final_total()),
    };

    let mut tera = Tera::default();
    tera.add_raw_template("preview", PREVIEW_TEMPLATE)?;
    tera.render("preview", &Context::from_serialize(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::compute_totals;
    use rust_decimal_macros::dec;

    fn items() -> Vec<LineItem> {
        vec![
            LineItem::new("Widget", dec!(10.00), 3),
            LineItem::new("Gadget", dec!(25.50), 1),
        ]
    }

    #[test]
    fn summary_shows_rounded_totals() {
        let totals = compute_totals(&items(), dec!(10), dec!(22)).unwrap();
        let text = totals_summary(&totals, "€").unwrap();

        assert!(text.contains("60.94 €"));
        assert!(text.contains("Taxable: 49.95 €"));
        assert!(text.contains("Tax (22%): 10.99 €"));
        assert!(text.contains("Discount (10%): -5.55 €"));
    }

    #[test]
    fn summary_hides_zero_discount() {
        let totals = compute_totals(&items(), dec!(0), dec!(4)).unwrap();
        let text = totals_summary(&totals, "€").unwrap();
        assert!(!text.contains("Discount"));
        assert!(text.contains("Tax (4%)"));
    }

    #[test]
    fn catalog_table_lists_entries() {
        let catalog =
            Catalog::from_csv_reader("Prodotto,Prezzo,Quantità\nWidget,10,4\n".as_bytes()).unwrap();
        let rendered = catalog_table(&catalog).to_string();
        assert!(rendered.contains("Widget"));
        assert!(rendered.contains("Default qty"));
        assert!(rendered.contains('4'));
    }

    #[test]
    fn cart_lists_every_item() {
        let totals = compute_totals(&items(), dec!(0), dec!(22)).unwrap();
        let rendered = cart_table(&items(), &totals).to_string();
        assert!(rendered.contains("Widget"));
        assert!(rendered.contains("30.00"));
        assert!(rendered.contains("55.50"));
    }
}
