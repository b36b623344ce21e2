//! One quote from selected items to a PDF on disk.
//!
//! Both the interactive wizard and the scripted `generate` command end up
//! here with the same inputs the renderer needs.

use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::calculator::{compute_totals, QuoteTotals};
use crate::catalog::Catalog;
use crate::error::{CatalogError, GenerateError, QuoteError};
use crate::format;
use crate::model::{DocumentHeader, LineItem, TaxRate};
use crate::render::{write_quote, RenderedQuote, StyleProfile};

/// `NAME` or `NAME=QTY` as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpec {
    pub name: String,
    pub quantity: Option<i64>,
}

impl FromStr for ItemSpec {
    type Err = CatalogError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || CatalogError::InvalidItemSpec(raw.to_string());
        let (name, quantity) = match raw.rsplit_once('=') {
            Some((name, qty)) => {
                let qty: i64 = qty.trim().parse().map_err(|_| invalid())?;
                if qty < 1 {
                    return Err(invalid());
                }
                (name, Some(qty))
            }
            None => (raw, None),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            name: name.to_string(),
            quantity,
        })
    }
}

/// Looks the requested items up in the catalog, in the order given.
pub fn pick_items(catalog: &Catalog, specs: &[ItemSpec]) -> Result<Vec<LineItem>, CatalogError> {
    specs
        .iter()
        .map(|wanted| {
            let entry = catalog
                .find(&wanted.name)
                .ok_or_else(|| CatalogError::UnknownItem(wanted.name.clone()))?;
            Ok(LineItem::new(
                entry.name.clone(),
                entry.unit_price,
                wanted.quantity.unwrap_or(entry.default_quantity),
            ))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct QuoteJob {
    /// Short client name, used for the file name only.
    pub client: String,
    pub items: Vec<LineItem>,
    pub discount_percent: Decimal,
    pub tax: TaxRate,
    pub header: DocumentHeader,
}

#[derive(Debug)]
pub struct GeneratedQuote {
    pub path: PathBuf,
    pub totals: QuoteTotals,
    pub document: RenderedQuote,
}

impl QuoteJob {
    pub fn totals(&self) -> Result<QuoteTotals, QuoteError> {
        compute_totals(&self.items, self.discount_percent, self.tax.percent())
    }

    pub fn output_path(&self, quotes_dir: &Path) -> PathBuf {
        quotes_dir.join(format::quote_file_name(&self.client))
    }

    /// Computes the totals and writes the PDF into `quotes_dir`.
    pub fn generate(
        &self,
        quotes_dir: &Path,
        style: &StyleProfile,
    ) -> Result<GeneratedQuote, GenerateError> {
        let totals = self.totals()?;
        let path = self.output_path(quotes_dir);
        let document = write_quote(&path, style, &self.header, &self.items, &totals)?;
        Ok(GeneratedQuote {
            path,
            totals,
            document,
        })
    }
}
