//! Price quotations from a price list: cart totals with discount and tax,
//! exported as a paginated PDF.

pub mod calculator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod preview;
pub mod render;
pub mod workflow;

pub use calculator::{QuoteTotals, clamp_percent, compute_totals};
pub use catalog::{Catalog, CatalogEntry};
pub use error::{CatalogError, ConfigError, GenerateError, QuoteError, RenderError};
pub use model::{DocumentHeader, LineItem, TaxRate};
pub use render::{RenderedQuote, StyleProfile, render_quote, write_quote};
