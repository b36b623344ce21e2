use anyhow::{Context, Result, bail};
use chrono::{Duration, Local};
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, DateSelect, MultiSelect, Select, Text};
use rust_decimal::Decimal;
use std::path::PathBuf;

use quote_maker::catalog::Catalog;
use quote_maker::config::{AppSettings, SellerConfig, expand_home_dir, load_seller_config};
use quote_maker::preview::{cart_table, totals_summary};
use quote_maker::workflow::QuoteJob;
use quote_maker::{DocumentHeader, LineItem, StyleProfile, TaxRate, clamp_percent};

use crate::open_and_reveal;

const CUSTOM_TAX_OPT: &str = "✏️  Custom rate";

/// Interactive quote: price list -> cart -> discount/tax -> header -> PDF.
pub fn new_quote(settings: &AppSettings, catalog_path: Option<PathBuf>) -> Result<()> {
    settings.ensure_layout()?;
    let seller = load_seller_config(&settings.root())?;

    let catalog_path = match catalog_path {
        Some(path) => path,
        None => {
            let raw = Text::new("Price list (CSV or Excel):").prompt()?;
            PathBuf::from(expand_home_dir(raw.trim()))
        }
    };
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("Cannot load price list {}", catalog_path.display()))?;
    if catalog.is_empty() {
        bail!("Price list {} has no items", catalog_path.display());
    }
    println!("📦 Loaded {} items from {}", catalog.len(), catalog_path.display());

    let selected = MultiSelect::new("Search and select products:", catalog.names())
        .with_page_size(15)
        .prompt()?;
    if selected.is_empty() {
        println!("❌ No items selected. Aborting.");
        return Ok(());
    }
    let items = edit_items(catalog.line_items(&selected))?;

    let client = Text::new("Client short name (file name):")
        .with_default("Final_Client")
        .prompt()?;
    let discount = CustomType::<Decimal>::new("Discount %:")
        .with_default(Decimal::ZERO)
        .with_error_message("Please type a number")
        .prompt()?;
    let discount = clamp_percent(discount);
    let tax = ask_for_tax()?;

    let job = QuoteJob {
        client,
        items,
        discount_percent: discount,
        tax,
        header: ask_header(&seller)?,
    };

    let totals = job.totals()?;
    println!("\n{}", cart_table(&job.items, &totals));
    println!("{}", totals_summary(&totals, "€")?);

    if !Confirm::new("Generate PDF?").with_default(true).prompt()? {
        println!("Operation cancelled.");
        return Ok(());
    }

    let style = StyleProfile::probe(&settings.assets_dir());
    let generated = job.generate(&settings.quotes_dir(), &style)?;
    println!(
        "✅ Quote saved: {} ({} pages)",
        generated.path.display(),
        generated.document.page_count()
    );
    open_and_reveal(&generated.path);
    Ok(())
}

fn edit_items(items: Vec<LineItem>) -> Result<Vec<LineItem>> {
    println!("\n--- Quantities ---");
    let mut edited = Vec::with_capacity(items.len());
    for item in items {
        let label = format!("Qty for {}:", item.name);
        let quantity = CustomType::<i64>::new(&label)
            .with_default(item.quantity.max(1))
            .with_error_message("Please type a whole number")
            .with_validator(|qty: &i64| {
                if *qty >= 1 {
                    Ok(Validation::Valid)
                } else {
                    Ok(Validation::Invalid("Quantity must be at least 1".into()))
                }
            })
            .prompt()?;
        edited.push(item.with_quantity(quantity));
    }

    let zero_priced = edited.iter().filter(|i| i.unit_price.is_zero()).count();
    if zero_priced > 0 {
        println!("⚠️  {zero_priced} item(s) have no price in the list.");
    }
    if !Confirm::new("Adjust unit prices?")
        .with_default(zero_priced > 0)
        .prompt()?
    {
        return Ok(edited);
    }

    edited
        .into_iter()
        .map(|item| -> Result<LineItem> {
            let label = format!("Unit price for {}:", item.name);
            let price = CustomType::<Decimal>::new(&label)
                .with_default(item.unit_price)
                .with_error_message("Please type a number")
                .with_validator(|p: &Decimal| {
                    if p.is_sign_negative() {
                        Ok(Validation::Invalid("Price cannot be negative".into()))
                    } else {
                        Ok(Validation::Valid)
                    }
                })
                .prompt()?;
            Ok(item.with_unit_price(price))
        })
        .collect()
}

fn ask_for_tax() -> Result<TaxRate> {
    let mut options: Vec<String> = TaxRate::PRESETS.iter().map(ToString::to_string).collect();
    options.push(CUSTOM_TAX_OPT.to_string());

    let choice = Select::new("Tax rate:", options).raw_prompt()?;
    if let Some(preset) = TaxRate::PRESETS.get(choice.index) {
        return Ok(*preset);
    }

    let rate = CustomType::<Decimal>::new("Tax rate %:")
        .with_error_message("Please type a number")
        .prompt()?;
    Ok(TaxRate::Custom(clamp_percent(rate)))
}

fn ask_header(seller: &SellerConfig) -> Result<DocumentHeader> {
    println!("\n--- Document ---");
    println!("💡 Tip: Use '\\n' for new lines.");

    let seller_info = Text::new("Seller:")
        .with_default(&escape_newlines(&seller.info))
        .prompt()?;
    let buyer_info = Text::new("Client details (name, address, VAT):").prompt()?;
    let bank_iban = Text::new("IBAN:").with_default(&seller.iban).prompt()?;

    let today = Local::now().date_naive();
    let valid_until = DateSelect::new("Valid until:")
        .with_default(today + Duration::days(seller.validity_days))
        .with_min_date(today)
        .prompt()?;

    Ok(DocumentHeader {
        seller_info: unescape_newlines(&seller_info),
        buyer_info: unescape_newlines(&buyer_info),
        bank_iban: bank_iban.trim().to_string(),
        valid_until,
        issue_date: today,
    })
}

fn escape_newlines(text: &str) -> String {
    text.trim_end().replace('\n', "\\n")
}

pub(crate) fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}
