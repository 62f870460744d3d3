use ::csv::WriterBuilder;

use crate::{EngineError, ResultEngine};

use super::{COLUMNS, Report, ReportRenderer};

/// Plain CSV: title line, header, rows, blank line, summary.
pub struct CsvRenderer;

impl ReportRenderer for CsvRenderer {
    fn content_type(&self) -> &'static str {
        "text/csv"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, report: &Report) -> ResultEngine<Vec<u8>> {
        let err = |e: ::csv::Error| EngineError::Report(format!("csv: {e}"));

        // The title and summary lines are shorter than the table.
        let mut writer = WriterBuilder::new().flexible(true).from_writer(vec![]);
        writer.write_record([report.title()]).map_err(err)?;
        writer.write_record(COLUMNS).map_err(err)?;
        for row in &report.rows {
            writer.write_record(row.cells()).map_err(err)?;
        }
        writer.write_record([""]).map_err(err)?;
        writer.write_record(["Summary"]).map_err(err)?;
        for (label, amount) in report.summary_lines() {
            writer
                .write_record([label.to_string(), amount.to_string()])
                .map_err(err)?;
        }
        writer
            .into_inner()
            .map_err(|e| EngineError::Report(format!("csv: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn renders_rows_and_summary() {
        let bytes = CsvRenderer.render(&sample_report()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Cashbook Report - Shop (All Categories)");
        assert_eq!(lines[1], "Date,Type,Amount,Category,Remarks,Running Balance");
        assert_eq!(lines[2], "2024-01-01,Cash In,100.00,Sales,opening,100.00");
        assert_eq!(lines[3], "2024-01-02,Cash Out,30.00,N/A,N/A,70.00");
        assert!(lines.contains(&"Net Balance,70.00"));
    }
}
