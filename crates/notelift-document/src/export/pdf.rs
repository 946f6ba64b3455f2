// SPDX-License-Identifier: MIT
//
// PDF output via `printpdf` 0.8.
//
// printpdf 0.8 is data-oriented: a document is a list of `PdfPage` structs
// each holding a `Vec<Op>` operation list, serialised with
// `PdfDocument::save()`. Text is laid out here in a simple top-to-bottom
// flow in the built-in Helvetica font, with automatic page breaks.

use notelift_core::types::PageText;
use notelift_core::Result;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, instrument};

use super::DocumentWriter;

/// Page size in millimetres.
#[derive(Debug, Clone, Copy)]
struct PaperSize {
    width_mm: f32,
    height_mm: f32,
}

const A4: PaperSize = PaperSize {
    width_mm: 210.0,
    height_mm: 297.0,
};

const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_PT: f32 = 14.0;
const MARGIN_MM: f32 = 20.0;

/// Renders recognized pages as a text PDF.
pub struct PdfWriter {
    paper: PaperSize,
}

impl PdfWriter {
    pub fn a4() -> Self {
        Self { paper: A4 }
    }

    /// Flatten the page records into the line sequence to lay out.
    fn compose_lines(title: &str, pages: &[PageText], max_width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(title.to_owned());
        lines.push(String::new());

        for page in pages {
            lines.push(page.label());
            lines.push("-".repeat(max_width.min(40)));
            let text = page.text.trim_end();
            if text.is_empty() {
                lines.push("(no text recognized)".to_owned());
            } else {
                lines.extend(wrap_text(text, max_width));
            }
            lines.push(String::new());
        }
        lines
    }
}

impl DocumentWriter for PdfWriter {
    #[instrument(skip_all, fields(pages = pages.len()))]
    fn render(&self, title: &str, pages: &[PageText]) -> Result<Vec<u8>> {
        let page_w = Mm(self.paper.width_mm);
        let page_h = Mm(self.paper.height_mm);
        let page_h_pt = page_h.into_pt().0;
        let margin_pt = Mm(MARGIN_MM).into_pt().0;

        // Approximate characters per line for Helvetica at 11pt: average
        // glyph width is roughly half the font size, 1pt = 0.3528mm.
        let usable_width_mm = self.paper.width_mm - 2.0 * MARGIN_MM;
        let avg_char_width_mm = 0.50 * FONT_SIZE_PT * 0.3528;
        let max_chars_per_line = (usable_width_mm / avg_char_width_mm) as usize;

        let lines = Self::compose_lines(title, pages, max_chars_per_line);
        let usable_height_pt = page_h_pt - 2.0 * margin_pt;
        let lines_per_page = (usable_height_pt / LINE_HEIGHT_PT) as usize;

        let mut doc = PdfDocument::new(title);
        let mut pdf_pages: Vec<PdfPage> = Vec::new();

        let mut line_iter = lines.iter().peekable();
        while line_iter.peek().is_some() {
            let mut ops: Vec<Op> = Vec::new();

            let mut line_idx = 0usize;
            while line_idx < lines_per_page {
                let line = match line_iter.next() {
                    Some(l) => l,
                    None => break,
                };
                let y_pt = page_h_pt - margin_pt - (line_idx as f32 * LINE_HEIGHT_PT);

                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point {
                        x: Pt(margin_pt),
                        y: Pt(y_pt),
                    },
                });
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(FONT_SIZE_PT),
                    font: BuiltinFont::Helvetica,
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(line.clone())],
                    font: BuiltinFont::Helvetica,
                });
                ops.push(Op::EndTextSection);

                line_idx += 1;
            }

            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        if pdf_pages.is_empty() {
            pdf_pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        doc.with_pages(pdf_pages);
        debug!(total_lines = lines.len(), pdf_pages = doc.pages.len(), "text layout complete");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }
}

/// Wrap a multi-line string so no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph.
/// Words longer than `max_width` are force-broken.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current = String::with_capacity(max_width);
        for word in words {
            if word.len() > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let mut remaining = word;
                while remaining.len() > max_width {
                    let (chunk, rest) = remaining.split_at(max_width);
                    result.push(chunk.to_string());
                    remaining = rest;
                }
                current.push_str(remaining);
            } else if current.is_empty() {
                current.push_str(word);
            } else if current.len() + 1 + word.len() <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }

    result
}
