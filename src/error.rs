//! Error types for the quote pipeline.
//!
//! Each stage owns one enum: the calculator rejects bad numbers, the catalog
//! import rejects unreadable price lists, the renderer reports I/O and PDF
//! failures. Missing assets (fonts, logo) are not errors and never show up here.

use std::path::PathBuf;
use thiserror::Error;

/// Rejected calculator input.
#[derive(Debug, Error, PartialEq)]
pub enum QuoteError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Price list import failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unsupported price list format: {0:?} (expected .csv, .xlsx, .xls or .ods)")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read price list {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Price list has no sheets")]
    EmptyWorkbook,

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Item '{0}' is not in the price list")]
    UnknownItem(String),

    #[error("Invalid item '{0}', expected NAME or NAME=QTY")]
    InvalidItemSpec(String),
}

/// Document generation failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Cannot write quote to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Settings and seller profile failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A quote that could not be produced.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
