use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::{EngineError, ResultEngine};

use super::{COLUMNS, Report, ReportRenderer};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 6.0;
const TITLE_SIZE: f32 = 16.0;
const HEADER_SIZE: f32 = 10.0;
const BODY_SIZE: f32 = 9.0;
/// Left edge of each column, in millimetres from the margin.
const COLUMN_OFFSETS: [f32; 6] = [0.0, 24.0, 46.0, 70.0, 105.0, 150.0];
/// Characters that fit in each column at body size.
const COLUMN_CHARS: [usize; 6] = [10, 9, 11, 16, 22, 14];

/// Printable A4 document with the table split across pages.
pub struct PdfRenderer;

impl ReportRenderer for PdfRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, report: &Report) -> ResultEngine<Vec<u8>> {
        let err = |e: printpdf::Error| EngineError::Report(format!("pdf: {e}"));

        let title = report.title();
        let (doc, page, layer) =
            PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(err)?;

        let mut cursor = Cursor {
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN,
        };

        cursor.line(&title, TITLE_SIZE, MARGIN, &bold);
        cursor.y -= LINE_HEIGHT;
        write_header(&mut cursor, &bold);

        for row in &report.rows {
            if cursor.y < MARGIN + LINE_HEIGHT {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                cursor = Cursor {
                    layer: doc.get_page(page).get_layer(layer),
                    y: PAGE_HEIGHT - MARGIN,
                };
                write_header(&mut cursor, &bold);
            }
            for ((cell, offset), width) in row
                .cells()
                .iter()
                .zip(COLUMN_OFFSETS)
                .zip(COLUMN_CHARS)
            {
                cursor.text(&truncate(cell, width), BODY_SIZE, MARGIN + offset, &regular);
            }
            cursor.y -= LINE_HEIGHT;
        }

        // Summary block: needs a heading and three lines.
        if cursor.y < MARGIN + LINE_HEIGHT * 5.0 {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            cursor = Cursor {
                layer: doc.get_page(page).get_layer(layer),
                y: PAGE_HEIGHT - MARGIN,
            };
        }
        cursor.y -= LINE_HEIGHT;
        cursor.line("Summary:", HEADER_SIZE, MARGIN, &bold);
        for (label, amount) in report.summary_lines() {
            cursor.line(&format!("{label}: {amount}"), BODY_SIZE, MARGIN, &regular);
        }

        doc.save_to_bytes().map_err(err)
    }
}

struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.text(text, size, x, font);
        self.y -= LINE_HEIGHT;
    }
}

fn write_header(cursor: &mut Cursor, font: &IndirectFontRef) {
    for (column, offset) in COLUMNS.iter().zip(COLUMN_OFFSETS) {
        cursor.text(column, HEADER_SIZE, MARGIN + offset, font);
    }
    cursor.y -= LINE_HEIGHT;
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn renders_pdf_document() {
        let bytes = PdfRenderer.render(&sample_report()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_reports_span_pages() {
        let mut report = sample_report();
        let row = report.rows[0].clone();
        report.rows = std::iter::repeat_n(row, 200).collect();
        let bytes = PdfRenderer.render(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn truncates_long_cells() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
