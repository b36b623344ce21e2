//! Paginated quote writer on top of printpdf.
//!
//! printpdf draws at absolute coordinates and has no notion of flowing
//! content, so this writer owns pagination: every block asks the cursor for
//! room first, and a page break runs the page-end hook (page number) on the
//! old page and the page-start hook (header band) on the new one.

use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Polygon, Rgb,
};
use printpdf::xobject::ImageXObject;
use rust_decimal::Decimal;
use std::io::{BufWriter, Cursor};
use tracing::{debug, warn};

use super::layout::{
    pt_to_mm, text_width, truncate_to_width, wrap_text, Align, LayoutCursor, Mark, BANK_FOOTER_TOP,
    BODY_BOTTOM, CONTENT_WIDTH, MARGIN_LEFT, MARGIN_TOP, PAGE_HEIGHT, PAGE_NUMBER_TOP, PAGE_WIDTH,
};
use super::style::{FontSource, StyleProfile};
use super::{PageSummary, RenderedQuote};
use crate::calculator::QuoteTotals;
use crate::error::RenderError;
use crate::format;
use crate::model::{DocumentHeader, LineItem};

const TITLE: &str = "COMMERCIAL QUOTE";
const CELL_PADDING: f32 = 1.0;
const LOGO_WIDTH: f32 = 30.0;
const LOGO_TOP: f32 = 8.0;
const LOGO_DPI: f32 = 300.0;

const LINE_HEIGHT: f32 = 5.0;
const FOOTER_LINE_HEIGHT: f32 = 4.0;

const SELLER_COLUMN: f32 = 100.0;
/// How far the validity line is pulled back up next to the seller block.
const VALIDITY_OFFSET: f32 = 15.0;

const TABLE_HEADER_HEIGHT: f32 = 10.0;
const TABLE_ROW_HEIGHT: f32 = 8.0;
const TABLE_COLUMNS: [(&str, f32, Align); 5] = [
    ("ITEMS/SERVICES", 70.0, Align::Left),
    ("QUANTITY", 25.0, Align::Right),
    ("UNIT PRICE", 30.0, Align::Right),
    ("SUBTOTAL", 35.0, Align::Right),
    ("TAX", 30.0, Align::Right),
];

const TOTALS_LABEL_WIDTH: f32 = 135.0;
const TOTALS_VALUE_WIDTH: f32 = 55.0;

// DejaVu Sans runs noticeably wider than Helvetica.
const DEJAVU_WIDTH_FACTOR: f32 = 1.1;

const BLACK: (u8, u8, u8) = (0, 0, 0);
const CLIENT_FILL: (u8, u8, u8) = (230, 230, 250);
const TABLE_HEADER_FILL: (u8, u8, u8) = (240, 255, 240);
const TOTAL_ACCENT: (u8, u8, u8) = (46, 204, 113);
const SEPARATOR: (u8, u8, u8) = (200, 200, 200);

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn pdf_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf(e.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    width_factor: f32,
    currency: &'static str,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, source: &FontSource) -> Result<Self, RenderError> {
        if let FontSource::Embedded { regular, bold } = source {
            let regular = doc.add_external_font(Cursor::new(regular.as_slice()));
            let bold = doc.add_external_font(Cursor::new(bold.as_slice()));
            match (regular, bold) {
                (Ok(regular), Ok(bold)) => {
                    return Ok(Self {
                        regular,
                        bold,
                        width_factor: DEJAVU_WIDTH_FACTOR,
                        currency: "€",
                    });
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "Embedded font rejected, falling back to Helvetica");
                }
            }
        }

        Ok(Self {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
            width_factor: 1.0,
            // The base-14 encoding has no reliable euro glyph.
            currency: "EUR",
        })
    }

    fn pick(&self, bold: bool) -> &IndirectFontRef {
        if bold { &self.bold } else { &self.regular }
    }
}

/// Text style of one cell.
#[derive(Clone, Copy)]
struct TextStyle {
    size: f32,
    bold: bool,
    align: Align,
}

impl TextStyle {
    const fn new(size: f32, bold: bool, align: Align) -> Self {
        Self { size, bold, align }
    }
}

pub(crate) struct QuoteWriter<'a> {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    /// Decoded once; each page gets its own copy.
    logo: Option<ImageXObject>,
    header: &'a DocumentHeader,
    cursor: LayoutCursor,
    /// Where body content starts on the current page, below the header band.
    body_top: Mark,
    pages: Vec<PageSummary>,
}

impl<'a> QuoteWriter<'a> {
    pub(crate) fn new(style: &'a StyleProfile, header: &'a DocumentHeader) -> Result<Self, RenderError> {
        let (doc, page, layer) =
            PdfDocument::new("Commercial quote", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let fonts = Fonts::load(&doc, &style.fonts)?;

        let logo = style.logo.as_deref().and_then(|bytes| match decode_logo(bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(error = %e, "Logo is not a readable PNG, skipping it");
                None
            }
        });

        let cursor = LayoutCursor::new(MARGIN_TOP, BODY_BOTTOM);
        let mut writer = Self {
            doc,
            layer,
            fonts,
            logo,
            header,
            body_top: cursor.mark(),
            cursor,
            pages: Vec::new(),
        };
        writer.begin_page();
        Ok(writer)
    }

    // ------------------------------------------------------------------
    // Page hooks
    // ------------------------------------------------------------------

    fn begin_page(&mut self) {
        self.pages.push(PageSummary {
            number: self.pages.len() + 1,
            ..PageSummary::default()
        });
        self.cursor.reset(MARGIN_TOP);
        self.header_band();
        self.body_top = self.cursor.mark();
        if let Some(page) = self.pages.last_mut() {
            page.header_band = true;
        }
    }

    fn end_page(&mut self) {
        let number = self.pages.len();
        self.cell(
            MARGIN_LEFT,
            PAGE_NUMBER_TOP,
            CONTENT_WIDTH,
            10.0,
            &format!("Page {number}"),
            TextStyle::new(8.0, false, Align::Center),
        );
        if let Some(page) = self.pages.last_mut() {
            page.page_number = true;
        }
    }

    fn new_page(&mut self) {
        self.end_page();
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.begin_page();
        debug!(page = self.pages.len(), "Page break");
    }

    /// Breaks the page unless `height` still fits. Returns true on a break.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.cursor.fits(height) {
            return false;
        }
        self.new_page();
        true
    }

    /// Moves a block that would fit on an empty page to a new page instead of
    /// splitting it. Taller blocks start where they are and flow.
    fn keep_together(&mut self, height: f32) {
        if height <= BODY_BOTTOM - self.body_top.y() {
            self.ensure_space(height);
        }
    }

    // ------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------

    fn header_band(&mut self) {
        if self.logo.is_some() {
            self.draw_logo();
            self.cursor.advance(10.0);
        }

        let y = self.cursor.y();
        self.cell(MARGIN_LEFT, y, CONTENT_WIDTH, 10.0, TITLE, TextStyle::new(16.0, true, Align::Center));
        self.cursor.advance(10.0);

        let issued = format!("Issue date: {}", format::date(self.header.issue_date));
        let y = self.cursor.y();
        self.cell(MARGIN_LEFT, y, CONTENT_WIDTH, 5.0, &issued, TextStyle::new(9.0, false, Align::Right));
        self.cursor.advance(5.0 + 10.0);
    }

    /// Seller block on the left, validity date pulled up beside it on the right.
    pub(crate) fn party_block(&mut self) {
        let body = TextStyle::new(10.0, false, Align::Left);
        let lines = self.wrap(&self.header.seller_info, SELLER_COLUMN, body);
        self.keep_together(6.0 + LINE_HEIGHT * lines.len().max(1) as f32);
        self.ensure_space(6.0 + LINE_HEIGHT);

        let y = self.cursor.y();
        let heading = TextStyle::new(12.0, true, Align::Left);
        self.cell(MARGIN_LEFT, y, SELLER_COLUMN, 6.0, "FROM:", heading);
        let date = format!("DATE: {}", format::date(self.header.issue_date));
        self.cell(
            MARGIN_LEFT + SELLER_COLUMN,
            y,
            CONTENT_WIDTH - SELLER_COLUMN,
            6.0,
            &date,
            TextStyle::new(12.0, true, Align::Right),
        );
        self.cursor.advance(6.0);

        let mut top = self.cursor.mark();
        if self.flow_lines(&lines, SELLER_COLUMN, body) {
            // The seller block started on an earlier page.
            top = self.body_top;
        }
        let seller_end = self.cursor.mark();

        self.cursor.move_up(VALIDITY_OFFSET, top);
        let validity = format!("VALID UNTIL: {}", format::date(self.header.valid_until));
        let y = self.cursor.y();
        self.cell(MARGIN_LEFT, y, CONTENT_WIDTH, LINE_HEIGHT, &validity, TextStyle::new(10.0, false, Align::Right));
        self.cursor.advance(LINE_HEIGHT);
        let validity_end = self.cursor.mark();

        self.cursor.resume_below(&[seller_end, validity_end]);
        self.cursor.advance(10.0);
    }

    pub(crate) fn buyer_block(&mut self) {
        let body = TextStyle::new(10.0, false, Align::Left);
        let lines = self.wrap(&self.header.buyer_info, CONTENT_WIDTH, body);
        self.keep_together(8.0 + LINE_HEIGHT * lines.len().max(1) as f32);
        self.ensure_space(8.0 + LINE_HEIGHT);

        let y = self.cursor.y();
        self.fill_rect(MARGIN_LEFT, y, CONTENT_WIDTH, 8.0, CLIENT_FILL, false);
        self.cell(MARGIN_LEFT, y, CONTENT_WIDTH, 8.0, "CLIENT:", TextStyle::new(10.0, true, Align::Left));
        self.cursor.advance(8.0);

        self.flow_lines(&lines, CONTENT_WIDTH, body);
        self.cursor.advance(10.0);
    }

    /// Draws text lines one under the other, breaking the page whenever the
    /// next line would cross the body bottom. Returns true if it broke.
    fn flow_lines(&mut self, lines: &[String], width: f32, style: TextStyle) -> bool {
        let mut broke = false;
        for line in lines {
            broke |= self.ensure_space(LINE_HEIGHT);
            let y = self.cursor.y();
            self.cell(MARGIN_LEFT, y, width, LINE_HEIGHT, line, style);
            self.cursor.advance(LINE_HEIGHT);
            if let Some(page) = self.pages.last_mut() {
                page.text_lines += 1;
            }
        }
        broke
    }

    fn table_header(&mut self) {
        let y = self.cursor.y();
        let mut x = MARGIN_LEFT;
        for (label, width, _) in TABLE_COLUMNS {
            self.fill_rect(x, y, width, TABLE_HEADER_HEIGHT, TABLE_HEADER_FILL, true);
            self.cell(x, y, width, TABLE_HEADER_HEIGHT, label, TextStyle::new(9.0, true, Align::Center));
            x += width;
        }
        self.cursor.advance(TABLE_HEADER_HEIGHT);
    }

    /// One bordered row per item; rows never grow, long names are cut.
    pub(crate) fn item_table(&mut self, items: &[LineItem], tax_percent: Decimal) {
        self.ensure_space(TABLE_HEADER_HEIGHT + TABLE_ROW_HEIGHT);
        self.table_header();

        let tax = format::percent(tax_percent);
        for (idx, item) in items.iter().enumerate() {
            if self.ensure_space(TABLE_ROW_HEIGHT) {
                self.table_header();
            }

            let values = [
                item.name.clone(),
                item.quantity.to_string(),
                format::price(item.unit_price),
                format::price(item.subtotal()),
                tax.clone(),
            ];

            let y = self.cursor.y();
            let mut x = MARGIN_LEFT;
            for ((_, width, align), value) in TABLE_COLUMNS.iter().zip(values.iter()) {
                self.stroke_rect(x, y, *width, TABLE_ROW_HEIGHT);
                let style = TextStyle::new(9.0, false, *align);
                let text = truncate_to_width(
                    value,
                    width - 2.0 * CELL_PADDING,
                    style.size,
                    self.fonts.width_factor,
                );
                self.cell(x, y, *width, TABLE_ROW_HEIGHT, &text, style);
                x += width;
            }

            if let Some(page) = self.pages.last_mut() {
                page.rows.push(idx);
            }
            self.cursor.advance(TABLE_ROW_HEIGHT);
        }
    }

    pub(crate) fn totals_block(&mut self, totals: &QuoteTotals) {
        // Kept together on one page.
        self.ensure_space(10.0 + 8.0 + 8.0 + 2.0 + 12.0);
        self.cursor.advance(10.0);

        let currency = self.fonts.currency;
        let regular = TextStyle::new(10.0, false, Align::Right);
        self.totals_row(
            "NET AMOUNT:",
            &format::money_with_currency(totals.net_amount(), currency),
            8.0,
            regular,
        );
        self.totals_row(
            &format!("TAX ({}):", format::percent(totals.tax_percent())),
            &format::money_with_currency(totals.tax_value(), currency),
            8.0,
            regular,
        );
        self.cursor.advance(2.0);

        self.layer.set_fill_color(rgb(TOTAL_ACCENT));
        self.totals_row(
            "TOTAL:",
            &format::money_with_currency(totals.final_total(), currency),
            12.0,
            TextStyle::new(14.0, true, Align::Right),
        );
        self.layer.set_fill_color(rgb(BLACK));
    }

    fn totals_row(&mut self, label: &str, value: &str, height: f32, style: TextStyle) {
        let y = self.cursor.y();
        self.cell(MARGIN_LEFT, y, TOTALS_LABEL_WIDTH, height, label, style);
        self.cell(MARGIN_LEFT + TOTALS_LABEL_WIDTH, y, TOTALS_VALUE_WIDTH, height, value, style);
        self.cursor.advance(height);
    }

    /// Separator and bank coordinates at a fixed height on the last page.
    pub(crate) fn bank_footer(&mut self) {
        if self.cursor.y() > BANK_FOOTER_TOP {
            self.new_page();
        }

        self.layer.set_outline_color(rgb(SEPARATOR));
        self.hline(MARGIN_LEFT, MARGIN_LEFT + CONTENT_WIDTH, BANK_FOOTER_TOP);
        self.layer.set_outline_color(rgb(BLACK));

        // Exactly two lines, so the footer never reaches the page number.
        let style = TextStyle::new(8.0, true, Align::Left);
        let iban = self.header.bank_iban.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut y = BANK_FOOTER_TOP;
        for line in ["Bank details:".to_string(), format!("IBAN: {iban}")] {
            let text = truncate_to_width(
                &line,
                CONTENT_WIDTH - 2.0 * CELL_PADDING,
                style.size,
                self.width_factor(style.bold),
            );
            self.cell(MARGIN_LEFT, y, CONTENT_WIDTH, FOOTER_LINE_HEIGHT, &text, style);
            y += FOOTER_LINE_HEIGHT;
        }
        self.cursor.reset(y);

        if let Some(page) = self.pages.last_mut() {
            page.bank_footer = true;
        }
    }

    pub(crate) fn finish(mut self) -> Result<RenderedQuote, RenderError> {
        self.end_page();

        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc.save(&mut writer).map_err(pdf_err)?;
        let bytes = writer.into_inner().map_err(pdf_err)?;

        Ok(RenderedQuote {
            bytes,
            pages: self.pages,
        })
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    fn wrap(&self, text: &str, width: f32, style: TextStyle) -> Vec<String> {
        wrap_text(
            text,
            width - 2.0 * CELL_PADDING,
            style.size,
            self.width_factor(style.bold),
        )
    }

    fn width_factor(&self, bold: bool) -> f32 {
        if bold {
            self.fonts.width_factor * 1.06
        } else {
            self.fonts.width_factor
        }
    }

    /// Writes `text` inside the box at (`x`, `y`) sized `w` x `h`, vertically centred.
    fn cell(&self, x: f32, y: f32, w: f32, h: f32, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        let width = text_width(text, style.size, self.width_factor(style.bold));
        let text_x = match style.align {
            Align::Left => x + CELL_PADDING,
            Align::Center => x + (w - width) / 2.0,
            Align::Right => x + w - CELL_PADDING - width,
        };
        let baseline = y + h / 2.0 + 0.35 * pt_to_mm(style.size);
        self.layer.use_text(
            text,
            style.size,
            Mm(text_x),
            Mm(PAGE_HEIGHT - baseline),
            self.fonts.pick(style.bold),
        );
    }

    fn corners(x: f32, y: f32, w: f32, h: f32) -> Vec<(Point, bool)> {
        let (top, bottom) = (PAGE_HEIGHT - y, PAGE_HEIGHT - y - h);
        vec![
            (Point::new(Mm(x), Mm(top)), false),
            (Point::new(Mm(x + w), Mm(top)), false),
            (Point::new(Mm(x + w), Mm(bottom)), false),
            (Point::new(Mm(x), Mm(bottom)), false),
        ]
    }

    fn fill_rect(&self, x: f32, y: f32, w: f32, h: f32, fill: (u8, u8, u8), border: bool) {
        self.layer.set_fill_color(rgb(fill));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_polygon(Polygon {
            rings: vec![Self::corners(x, y, w, h)],
            mode: if border { PaintMode::FillStroke } else { PaintMode::Fill },
            winding_order: WindingOrder::NonZero,
        });
        self.layer.set_fill_color(rgb(BLACK));
    }

    fn stroke_rect(&self, x: f32, y: f32, w: f32, h: f32) {
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: Self::corners(x, y, w, h),
            is_closed: true,
        });
    }

    fn hline(&self, x1: f32, x2: f32, y: f32) {
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(PAGE_HEIGHT - y)), false),
                (Point::new(Mm(x2), Mm(PAGE_HEIGHT - y)), false),
            ],
            is_closed: false,
        });
    }

    fn draw_logo(&self) {
        let Some(xobject) = &self.logo else {
            return;
        };

        let px_width = xobject.width.0 as f32;
        let px_height = xobject.height.0 as f32;
        if px_width <= 0.0 {
            return;
        }
        let natural_width = px_width / LOGO_DPI * 25.4;
        let scale = LOGO_WIDTH / natural_width;
        let height = LOGO_WIDTH * px_height / px_width;

        Image::from(xobject.clone()).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_LEFT)),
                translate_y: Some(Mm(PAGE_HEIGHT - LOGO_TOP - height)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(LOGO_DPI),
                ..Default::default()
            },
        );
    }
}

fn decode_logo(bytes: &[u8]) -> Result<ImageXObject, RenderError> {
    let decoder = PngDecoder::new(Cursor::new(bytes)).map_err(pdf_err)?;
    ImageXObject::try_from(decoder).map_err(pdf_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn header(seller_lines: usize, buyer_lines: usize) -> DocumentHeader {
        let lines = |prefix: &str, n: usize| {
            (1..=n).map(|i| format!("{prefix} line {i}")).collect::<Vec<_>>().join("\n")
        };
        DocumentHeader {
            seller_info: lines("Seller", seller_lines),
            buyer_info: lines("Client", buyer_lines),
            bank_iban: "IT60X0542811101000000123456".to_string(),
            valid_until: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            issue_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    fn drawn_lines(writer: &QuoteWriter<'_>) -> usize {
        writer.pages.iter().map(|p| p.text_lines).sum()
    }

    #[test]
    fn short_blocks_stay_on_the_first_page() {
        let style = StyleProfile::builtin();
        let header = header(3, 2);
        let mut writer = QuoteWriter::new(&style, &header).unwrap();
        writer.party_block();
        writer.buyer_block();

        assert_eq!(writer.pages.len(), 1);
        assert_eq!(drawn_lines(&writer), 5);
    }

    #[test]
    fn tall_blocks_flow_across_pages() {
        let style = StyleProfile::builtin();
        let header = header(45, 75);
        let mut writer = QuoteWriter::new(&style, &header).unwrap();

        writer.party_block();
        assert!(writer.cursor.y() <= BODY_BOTTOM + 10.0);
        writer.buyer_block();
        assert!(writer.cursor.y() <= BODY_BOTTOM + 10.0);

        // Every line made it onto some page and no page was left empty.
        assert_eq!(drawn_lines(&writer), 45 + 75);
        assert!(writer.pages.len() >= 3);
        assert!(writer.pages.iter().all(|p| p.text_lines > 0));
        assert!(writer.pages.iter().all(|p| p.header_band));
    }

    #[test]
    fn block_too_tall_for_any_page_starts_in_place() {
        let style = StyleProfile::builtin();
        let header = header(1, 70);
        let mut writer = QuoteWriter::new(&style, &header).unwrap();
        writer.party_block();
        writer.buyer_block();

        assert!(writer.pages[0].text_lines > 1, "client block should start on page 1");
        assert_eq!(drawn_lines(&writer), 71);
    }

    #[test]
    fn long_iban_stays_above_the_page_number() {
        let style = StyleProfile::builtin();
        let mut header = header(1, 1);
        header.bank_iban = "IT60 X054 2811 1010 0000 0123 456 ".repeat(20);
        let mut writer = QuoteWriter::new(&style, &header).unwrap();
        writer.bank_footer();

        assert!(writer.cursor.y() <= PAGE_NUMBER_TOP);
        assert!(writer.pages[0].bank_footer);
    }
}
