//! Quote document rendering.
//!
//! ```text
//! page 1                         page n (last)
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │ [logo]  COMMERCIAL QUOTE │   │ [logo]  COMMERCIAL QUOTE │  header band (every page)
//! │            Issue date …  │   │            Issue date …  │
//! │ FROM:          DATE: …   │   │ ITEMS │ QTY │ … (repeat) │
//! │ seller…   VALID UNTIL: … │   │ row   │     │            │
//! │ ▒ CLIENT: ▒▒▒▒▒▒▒▒▒▒▒▒▒▒ │   │        NET AMOUNT:   …   │  totals
//! │ buyer…                   │   │        TAX (22%):    …   │
//! │ ITEMS │ QTY │ PRICE │ …  │   │        TOTAL:        …   │
//! │ row   │     │       │    │   │ ──────────────────────── │  bank footer
//! │ …                        │   │ IBAN: …                  │
//! │          Page 1          │   │          Page n          │  page number (every page)
//! └──────────────────────────┘   └──────────────────────────┘
//! ```

pub mod layout;
mod pdf;
pub mod style;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::calculator::QuoteTotals;
use crate::error::RenderError;
use crate::model::{DocumentHeader, LineItem};
use pdf::QuoteWriter;
pub use style::StyleProfile;

/// What ended up on one page of the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSummary {
    pub number: usize,
    pub header_band: bool,
    pub page_number: bool,
    pub bank_footer: bool,
    /// Seller and client text lines drawn on this page.
    pub text_lines: usize,
    /// Indices into the item list, in drawing order.
    pub rows: Vec<usize>,
}

/// A finished quote document.
#[derive(Debug, Clone)]
pub struct RenderedQuote {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageSummary>,
}

impl RenderedQuote {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Lays out the whole quote and returns the PDF bytes.
pub fn render_quote(
    style: &StyleProfile,
    header: &DocumentHeader,
    items: &[LineItem],
    totals: &QuoteTotals,
) -> Result<RenderedQuote, RenderError> {
    let mut writer = QuoteWriter::new(style, header)?;
    writer.party_block();
    writer.buyer_block();
    writer.item_table(items, totals.tax_percent());
    writer.totals_block(totals);
    writer.bank_footer();
    writer.finish()
}

/// Renders the quote and writes it to `path`.
///
/// The document goes to a sibling `.part` file first and is renamed into place
/// only once it is completely written, so a failed run never leaves a
/// truncated PDF under the final name.
pub fn write_quote(
    path: &Path,
    style: &StyleProfile,
    header: &DocumentHeader,
    items: &[LineItem],
    totals: &QuoteTotals,
) -> Result<RenderedQuote, RenderError> {
    let rendered = render_quote(style, header, items, totals)?;

    let partial = partial_path(path);
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };

    let written = File::create(&partial).and_then(|file| {
        let mut out = BufWriter::new(file);
        out.write_all(&rendered.bytes)?;
        out.flush()?;
        out.get_ref().sync_all()
    });
    if let Err(e) = written.and_then(|_| fs::rename(&partial, path)) {
        let _ = fs::remove_file(&partial);
        return Err(io_err(e));
    }

    info!(
        path = %path.display(),
        pages = rendered.page_count(),
        bytes = rendered.bytes.len(),
        "Quote written"
    );
    Ok(rendered)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}
