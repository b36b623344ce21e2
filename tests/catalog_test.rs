use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;

use quote_maker::Catalog;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn loads_xlsx_price_list() {
    let catalog = Catalog::load(&fixture("listino.xlsx")).unwrap();

    assert_eq!(catalog.names(), vec!["Widget", "Gadget", "Cavo HDMI"]);

    let widget = catalog.find("Widget").unwrap();
    assert_eq!(widget.unit_price, dec!(10));
    assert_eq!(widget.default_quantity, 3);

    let gadget = catalog.find("Gadget").unwrap();
    assert_eq!(gadget.unit_price, dec!(25.5));
    assert_eq!(gadget.default_quantity, 1);

    // Text in the price column is coerced to zero.
    let cable = catalog.find("Cavo HDMI").unwrap();
    assert_eq!(cable.unit_price, Decimal::ZERO);
    assert_eq!(cable.default_quantity, 2);
}

#[test]
fn xlsx_items_feed_the_calculator() {
    let catalog = Catalog::load(&fixture("listino.xlsx")).unwrap();
    let items = catalog.line_items(&["Gadget".to_string(), "Widget".to_string()]);
    let totals = quote_maker::compute_totals(&items, dec!(10), dec!(22)).unwrap();

    // 10 x 3 + 25.5 x 1
    assert_eq!(totals.gross_total(), dec!(55.5));
    assert_eq!(quote_maker::format::money(totals.final_total()), "60.94");
}
