//! Price list import.
//!
//! A catalog is a table with an item name column and a unit price column,
//! read from CSV or from the first sheet of a spreadsheet. Column headers are
//! matched case-insensitively against a few aliases (Italian and English).
//! Price cells that cannot be read as a number become 0; every such cell is
//! logged so a data-entry mistake does not go unnoticed.

use calamine::{open_workbook_auto, Data, Reader};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::model::LineItem;

const NAME_COLUMNS: &[&str] = &["prodotto", "product", "name", "item"];
const PRICE_COLUMNS: &[&str] = &["prezzo", "price", "unit price", "unit_price"];
const QUANTITY_COLUMNS: &[&str] = &["quantità", "quantita", "quantity", "qty"];

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub unit_price: Decimal,
    pub default_quantity: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

/// A cell normalised across CSV and spreadsheet sources.
#[derive(Debug, Clone)]
enum Cell {
    Text(String),
    Number(Decimal),
    Empty,
}

impl Cell {
    fn text(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(d) => d.normalize().to_string(),
            Cell::Empty => String::new(),
        }
    }

    fn decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Number(d) => Some(*d),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse().ok().or_else(|| Decimal::from_scientific(s).ok())
            }
            Cell::Empty => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(Decimal::from(*i)),
            Data::Float(f) => Decimal::from_f64(*f)
                .map(|d| Cell::Number(d.normalize()))
                .unwrap_or_else(|| Cell::Text(f.to_string())),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Empty => Cell::Empty,
            other => Cell::Text(other.to_string()),
        }
    }
}

struct Columns {
    name: usize,
    price: usize,
    quantity: Option<usize>,
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self, CatalogError> {
        let find = |aliases: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim_start_matches('\u{feff}').trim().to_lowercase();
                aliases.iter().any(|a| *a == h)
            })
        };
        Ok(Self {
            name: find(NAME_COLUMNS).ok_or(CatalogError::MissingColumn("Prodotto"))?,
            price: find(PRICE_COLUMNS).ok_or(CatalogError::MissingColumn("Prezzo"))?,
            quantity: find(QUANTITY_COLUMNS),
        })
    }
}

impl Catalog {
    /// Loads a price list, picking the parser from the file extension.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let catalog = match ext.as_str() {
            "csv" => {
                let file = File::open(path).map_err(|source| CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_csv_reader(file)?
            }
            "xlsx" | "xlsm" | "xls" | "ods" => Self::from_workbook(path)?,
            _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!(path = %path.display(), entries = catalog.len(), "Loaded price list");
        Ok(catalog)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            Cell::Empty
                        } else {
                            Cell::Text(field.to_string())
                        }
                    })
                    .collect(),
            );
        }
        Self::from_table(&headers, rows)
    }

    fn from_workbook(path: &Path) -> Result<Self, CatalogError> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| CatalogError::Spreadsheet(format!("{}: {e}", path.display())))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(CatalogError::EmptyWorkbook)?
            .map_err(|e| CatalogError::Spreadsheet(e.to_string()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or(CatalogError::MissingColumn("Prodotto"))?
            .iter()
            .map(|c| c.to_string())
            .collect();
        let body = rows.map(|row| row.iter().map(Cell::from).collect()).collect();
        Self::from_table(&headers, body)
    }

    fn from_table(headers: &[String], rows: Vec<Vec<Cell>>) -> Result<Self, CatalogError> {
        let columns = Columns::locate(headers)?;
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            // Header is row 1 in the user's editor.
            let line = idx + 2;
            let cell = |i: usize| row.get(i).cloned().unwrap_or(Cell::Empty);

            let name = cell(columns.name).text();
            if name.is_empty() {
                debug!(line, "Skipping price list row without a name");
                continue;
            }
            if !seen.insert(name.clone()) {
                warn!(line, name = %name, "Duplicate item in price list, keeping the first one");
                continue;
            }

            let raw_price = cell(columns.price);
            let unit_price = raw_price.decimal().unwrap_or_else(|| {
                warn!(line, name = %name, value = %raw_price.text(), "Unreadable price, using 0");
                Decimal::ZERO
            });

            let default_quantity = columns
                .quantity
                .and_then(|i| cell(i).decimal())
                .and_then(|q| q.trunc().to_i64())
                .filter(|q| *q >= 1)
                .unwrap_or(1);

            entries.push(CatalogEntry {
                name,
                unit_price,
                default_quantity,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Line items for the selected names, in catalog order.
    pub fn line_items(&self, selected: &[String]) -> Vec<LineItem> {
        self.entries
            .iter()
            .filter(|e| selected.iter().any(|s| s == &e.name))
            .map(|e| LineItem::new(e.name.clone(), e.unit_price, e.default_quantity))
            .collect()
    }
}
