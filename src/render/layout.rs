//! Page geometry and a top-down layout cursor.
//!
//! All positions are millimetres measured from the top-left corner of an A4
//! page; the PDF writer flips them to PDF's bottom-up space at draw time.

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN_LEFT: f32 = 10.0;
pub const MARGIN_TOP: f32 = 10.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_LEFT;

/// Body content never goes below this line; the page number lives underneath.
pub const BODY_BOTTOM: f32 = PAGE_HEIGHT - 20.0;

/// Top of the bank details footer on the last page.
pub const BANK_FOOTER_TOP: f32 = PAGE_HEIGHT - 40.0;

/// Top of the page number cell.
pub const PAGE_NUMBER_TOP: f32 = PAGE_HEIGHT - 15.0;

const PT_TO_MM: f32 = 0.352_778;

/// Horizontal alignment inside a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A remembered vertical position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark(f32);

impl Mark {
    pub fn y(&self) -> f32 {
        self.0
    }
}

/// Tracks the vertical position of the next block on the current page.
#[derive(Debug, Clone)]
pub struct LayoutCursor {
    y: f32,
    bottom: f32,
}

impl LayoutCursor {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { y: top, bottom }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn advance(&mut self, height: f32) {
        self.y += height;
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.bottom
    }

    pub fn mark(&self) -> Mark {
        Mark(self.y)
    }

    /// Moves back up by `offset`, never above `floor`.
    pub fn move_up(&mut self, offset: f32, floor: Mark) {
        self.y = (self.y - offset).max(floor.0);
    }

    /// Continues below the lowest of the given block ends.
    pub fn resume_below(&mut self, ends: &[Mark]) {
        self.y = ends.iter().fold(self.y, |acc, m| acc.max(m.0));
    }

    pub fn reset(&mut self, top: f32) {
        self.y = top;
    }
}

/// Approximate advance width of `text` in millimetres.
///
/// The built-in PDF fonts carry no metrics in printpdf, so widths come from a
/// small Helvetica table (in em units); `factor` widens it for other faces.
pub fn text_width(text: &str, size_pt: f32, factor: f32) -> f32 {
    let em: f32 = text.chars().map(glyph_em).sum();
    em * factor * size_pt * PT_TO_MM
}

fn glyph_em(c: char) -> f32 {
    match c {
        '0'..='9' | '$' | '€' | '_' => 0.556,
        ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' | 'i' | 'j' | 'l' => 0.278,
        '(' | ')' | '-' | '/' | 'f' | 't' | 'r' | 'I' => 0.333,
        'm' | 'M' => 0.833,
        'w' | 'W' => 0.75,
        '%' => 0.889,
        '@' => 1.015,
        c if c.is_uppercase() => 0.667,
        _ => 0.556,
    }
}

/// Font size in points to a line-box offset in millimetres.
pub fn pt_to_mm(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM
}

/// Shortens `text` with a trailing `...` until it fits `max_width`.
pub fn truncate_to_width(text: &str, max_width: f32, size_pt: f32, factor: f32) -> String {
    if text_width(text, size_pt, factor) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if text_width(&candidate, size_pt, factor) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Greedy word wrap of multi-line text into lines no wider than `max_width`.
///
/// Explicit newlines are kept; a single word wider than the column is split
/// by characters.
pub fn wrap_text(text: &str, max_width: f32, size_pt: f32, factor: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, size_pt, factor) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if text_width(&current, size_pt, factor) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        lines.push(current);
    }
    lines
}
