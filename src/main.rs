mod wizard;

use anyhow::{Context, Result};
use chrono::{Duration, Local};
use clap::{Args, CommandFactory, Parser, Subcommand};
use inquire::{InquireError, Text};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use quote_maker::catalog::Catalog;
use quote_maker::config::{
    self, AppSettings, DEFAULT_DATA_ROOT, load_seller_config, load_settings, save_settings,
    settings_path,
};
use quote_maker::format;
use quote_maker::preview::{cart_table, catalog_table, totals_summary};
use quote_maker::workflow::{ItemSpec, QuoteJob, pick_items};
use quote_maker::{DocumentHeader, LineItem, StyleProfile, TaxRate, compute_totals};

#[derive(Parser)]
#[command(name = "quote-maker", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a new quote interactively
    New {
        /// Price list to pick items from (CSV or Excel)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Print a price list
    Catalog {
        /// Price list file (CSV or Excel)
        path: PathBuf,
    },
    /// Show the totals for a cart without writing anything
    Preview {
        #[command(flatten)]
        cart: CartArgs,
        /// Print the totals as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a quote PDF without prompts
    Generate {
        #[command(flatten)]
        cart: CartArgs,
        /// Client short name, used for the file name
        #[arg(long)]
        client: String,
        /// Client details printed on the quote ('\n' for new lines)
        #[arg(long, default_value = "")]
        buyer: String,
        /// Validity date as dd/mm/yyyy (defaults to today + validity_days)
        #[arg(long)]
        valid_until: Option<String>,
        /// Reveal the PDF when done
        #[arg(long)]
        open: bool,
    },
    /// Configure data directory
    Config,
    /// Open the quotes folder
    Open,
}

#[derive(Args)]
struct CartArgs {
    /// Price list (CSV or Excel)
    #[arg(long)]
    catalog: PathBuf,
    /// Item to quote, repeatable
    #[arg(long = "item", value_name = "NAME[=QTY]", required = true)]
    items: Vec<ItemSpec>,
    /// Discount percentage
    #[arg(long, default_value = "0")]
    discount: Decimal,
    /// Tax rate: ordinary, reduced, minimum, exempt or a percentage
    #[arg(long, default_value = "ordinary", value_parser = parse_tax)]
    tax: TaxRate,
}

impl CartArgs {
    fn line_items(&self) -> Result<Vec<LineItem>> {
        let catalog = Catalog::load(&self.catalog)
            .with_context(|| format!("Cannot load price list {}", self.catalog.display()))?;
        Ok(pick_items(&catalog, &self.items)?)
    }
}

fn parse_tax(raw: &str) -> Result<TaxRate, String> {
    TaxRate::parse(raw).ok_or_else(|| format!("unknown tax rate '{raw}'"))
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        return;
    };

    if let Err(e) = run(command) {
        if matches!(
            e.downcast_ref::<InquireError>(),
            Some(InquireError::OperationCanceled | InquireError::OperationInterrupted)
        ) {
            println!("Operation cancelled.");
            return;
        }
        eprintln!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,quote_maker=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Catalog { path } => {
            let catalog = Catalog::load(&path)
                .with_context(|| format!("Cannot load price list {}", path.display()))?;
            println!("{}", catalog_table(&catalog));
            println!("📦 {} items", catalog.len());
        }
        Commands::Preview { cart, json } => {
            let items = cart.line_items()?;
            let totals = compute_totals(&items, cart.discount, cart.tax.percent())?;
            if json {
                let out = serde_json::json!({
                    "items": items,
                    "tax": cart.tax.to_string(),
                    "totals": totals,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", cart_table(&items, &totals));
                println!("{}", totals_summary(&totals, "€")?);
            }
        }
        Commands::Config => {
            setup_config_wizard()?;
        }
        Commands::New { catalog } => {
            let settings = current_settings()?;
            wizard::new_quote(&settings, catalog)?;
        }
        Commands::Generate {
            cart,
            client,
            buyer,
            valid_until,
            open,
        } => {
            let settings = current_settings()?;
            settings.ensure_layout()?;
            let seller = load_seller_config(&settings.root())?;

            let today = Local::now().date_naive();
            let valid_until = match valid_until {
                Some(raw) => format::parse_validity_date(&raw)
                    .with_context(|| format!("Invalid date '{raw}', expected dd/mm/yyyy"))?,
                None => today + Duration::days(seller.validity_days),
            };

            let job = QuoteJob {
                client,
                items: cart.line_items()?,
                discount_percent: cart.discount,
                tax: cart.tax,
                header: DocumentHeader {
                    seller_info: seller.info.trim_end().to_string(),
                    buyer_info: wizard::unescape_newlines(&buyer),
                    bank_iban: seller.iban,
                    valid_until,
                    issue_date: today,
                },
            };
            let style = StyleProfile::probe(&settings.assets_dir());
            let generated = job.generate(&settings.quotes_dir(), &style)?;
            println!(
                "✅ Quote saved: {} ({} pages, total {} €)",
                generated.path.display(),
                generated.document.page_count(),
                format::money(generated.totals.final_total())
            );
            if open {
                open_and_reveal(&generated.path);
            }
        }
        Commands::Open => {
            let settings = current_settings()?;
            settings.ensure_layout()?;
            let quotes = settings.quotes_dir();
            println!("🚀 Opening: {}", quotes.display());
            open_folder(&quotes);
        }
    }
    Ok(())
}

/// Saved settings, or the setup wizard on first run.
fn current_settings() -> Result<AppSettings> {
    let path = settings_path();
    match load_settings(&path)? {
        Some(settings) => {
            debug!(path = %path.display(), root = %settings.data_root, "Loaded settings");
            Ok(settings)
        }
        None => setup_config_wizard(),
    }
}

fn setup_config_wizard() -> Result<AppSettings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let path = settings_path();
    let current = load_settings(&path).ok().flatten();
    let default_val = current
        .map(|s| s.data_root)
        .unwrap_or_else(|| DEFAULT_DATA_ROOT.to_string());

    println!("📂 Fonts and logo go in <root>/assets, quotes are written to <root>/quotes.");
    let new_root = Text::new("Root data directory:")
        .with_default(&default_val)
        .prompt()?;

    let settings = AppSettings {
        data_root: new_root.trim().to_string(),
    };
    save_settings(&path, &settings)?;
    settings.ensure_layout()?;
    println!(
        "✅ Settings saved ({}).",
        config::expand_home_dir(&settings.data_root)
    );
    Ok(settings)
}

fn open_folder(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}

/// Reveals the file in Finder/Explorer and opens it.
pub(crate) fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer")
        .arg(format!("/select,{}", path.to_string_lossy()))
        .spawn()
        .ok();

    #[cfg(target_os = "linux")]
    if let Some(parent) = path.parent() {
        Command::new("xdg-open").arg(parent).spawn().ok();
    }

    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_preview_cart() {
        let cli = Cli::try_parse_from([
            "quote-maker",
            "preview",
            "--catalog",
            "prices.csv",
            "--item",
            "Widget=3",
            "--item",
            "Gadget",
            "--discount",
            "10",
            "--tax",
            "reduced",
            "--json",
        ])
        .unwrap();

        let Some(Commands::Preview { cart, json }) = cli.command else {
            panic!("expected preview");
        };
        assert!(json);
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].quantity, Some(3));
        assert_eq!(cart.discount, Decimal::from(10));
        assert_eq!(cart.tax, TaxRate::Reduced);
    }

    #[test]
    fn cli_rejects_unknown_tax() {
        let parsed = Cli::try_parse_from([
            "quote-maker",
            "preview",
            "--catalog",
            "prices.csv",
            "--item",
            "Widget",
            "--tax",
            "luxury",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
