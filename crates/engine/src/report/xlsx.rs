use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::{EngineError, ResultEngine};

use super::{COLUMNS, Report, ReportRenderer};

/// Excel caps sheet names at 31 characters.
const MAX_SHEET_NAME: usize = 31;

/// Single-sheet workbook; amounts are numeric cells.
pub struct XlsxRenderer;

impl ReportRenderer for XlsxRenderer {
    fn content_type(&self) -> &'static str {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn render(&self, report: &Report) -> ResultEngine<Vec<u8>> {
        build_workbook(report).map_err(|e| EngineError::Report(format!("xlsx: {e}")))
    }
}

fn build_workbook(report: &Report) -> Result<Vec<u8>, XlsxError> {
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("0.00");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(&report.book_name))?;

    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.len()).collect();

    sheet.write_string_with_format(0, 0, report.title(), &bold)?;
    for (col, header) in (0u16..).zip(COLUMNS) {
        sheet.write_string_with_format(1, col, header, &bold)?;
    }

    let mut row_idx: u32 = 2;
    for row in &report.rows {
        let cells = row.cells();
        sheet.write_string(row_idx, 0, &cells[0])?;
        sheet.write_string(row_idx, 1, &cells[1])?;
        sheet.write_number_with_format(row_idx, 2, row.amount.as_major_f64(), &money)?;
        sheet.write_string(row_idx, 3, &cells[3])?;
        sheet.write_string(row_idx, 4, &cells[4])?;
        sheet.write_number_with_format(
            row_idx,
            5,
            row.running_balance.as_major_f64(),
            &money,
        )?;
        for (width, cell) in widths.iter_mut().zip(&cells) {
            *width = (*width).max(cell.chars().count());
        }
        row_idx += 1;
    }

    row_idx += 1;
    sheet.write_string_with_format(row_idx, 0, "Summary", &bold)?;
    for (label, amount) in report.summary_lines() {
        row_idx += 1;
        sheet.write_string(row_idx, 0, label)?;
        sheet.write_number_with_format(row_idx, 1, amount.as_major_f64(), &money)?;
    }

    set_widths(sheet, &widths)?;
    workbook.save_to_buffer()
}

fn set_widths(sheet: &mut Worksheet, widths: &[usize]) -> Result<(), XlsxError> {
    for (col, width) in (0u16..).zip(widths) {
        sheet.set_column_width(col, (*width + 2) as f64)?;
    }
    Ok(())
}

/// `{book} Report`, stripped of characters Excel refuses in sheet names.
fn sheet_name(book_name: &str) -> String {
    let cleaned: String = format!("{book_name} Report")
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .collect();
    // No leading or trailing apostrophe either, checked on the final length.
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME).collect();
    let trimmed = truncated.trim_matches(|c: char| c == '\'' || c.is_whitespace());
    if trimmed.is_empty() {
        "Report".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn renders_zip_container() {
        let bytes = XlsxRenderer.render(&sample_report()).unwrap();
        // xlsx files are zip archives.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn sheet_names_are_sanitized() {
        assert_eq!(sheet_name("Shop"), "Shop Report");
        assert_eq!(sheet_name("a/b:c"), "abc Report");
        assert_eq!(
            sheet_name("A very long book name that overflows").chars().count(),
            MAX_SHEET_NAME
        );
        assert_eq!(sheet_name("'quoted'"), "quoted' Report");
    }

    #[test]
    fn apostrophe_at_the_cut_is_trimmed() {
        let name = format!("{}'s shop", "a".repeat(30));
        assert_eq!(sheet_name(&name), "a".repeat(30));

        let mut report = sample_report();
        report.book_name = name;
        assert!(XlsxRenderer.render(&report).is_ok());
    }
}
