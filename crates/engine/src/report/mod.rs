//! Book reports.
//!
//! A [`Report`] is built from every entry in scope, oldest first, with a
//! running balance over the whole set. A [`ReportRenderer`] turns it into a
//! downloadable document.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{EngineError, EntryKind, MoneyCents, ResultEngine, ledger::Totals};

mod csv;
mod pdf;
mod xlsx;

pub use self::csv::CsvRenderer;
pub use self::pdf::PdfRenderer;
pub use self::xlsx::XlsxRenderer;

/// Label used when the report is not restricted to one category.
pub const ALL_CATEGORIES: &str = "All Categories";
/// Placeholder for a missing category or empty remarks.
pub const NOT_AVAILABLE: &str = "N/A";
/// Column headers shared by every renderer.
pub const COLUMNS: [&str; 6] = [
    "Date",
    "Type",
    "Amount",
    "Category",
    "Remarks",
    "Running Balance",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Excel,
    Csv,
}

impl ReportFormat {
    pub fn renderer(self) -> Box<dyn ReportRenderer + Send + Sync> {
        match self {
            Self::Pdf => Box::new(PdfRenderer),
            Self::Excel => Box::new(XlsxRenderer),
            Self::Csv => Box::new(CsvRenderer),
        }
    }
}

impl TryFrom<&str> for ReportFormat {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "excel" | "xlsx" => Ok(Self::Excel),
            "csv" => Ok(Self::Csv),
            other => Err(EngineError::Validation(format!(
                "invalid report type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportScope {
    All,
    /// `None` when the category scope was chosen without a category; the
    /// report then covers every entry.
    Category(Option<Uuid>),
}

impl ReportScope {
    /// Scope name as it appears in the download file name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Category(_) => "category",
        }
    }

    pub fn category_id(self) -> Option<Uuid> {
        match self {
            Self::All => None,
            Self::Category(id) => id,
        }
    }
}

/// A validated report download request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportRequest {
    pub format: ReportFormat,
    pub scope: ReportScope,
}

impl ReportRequest {
    /// Validate raw request parameters. Both the format and the scope are
    /// required.
    pub fn parse(
        format: Option<&str>,
        scope: Option<&str>,
        category_id: Option<Uuid>,
    ) -> ResultEngine<Self> {
        let (Some(format), Some(scope)) = (
            format.map(str::trim).filter(|s| !s.is_empty()),
            scope.map(str::trim).filter(|s| !s.is_empty()),
        ) else {
            return Err(EngineError::Validation(
                "both report type and scope are required".to_string(),
            ));
        };
        let format = ReportFormat::try_from(format)?;
        let scope = match scope {
            "all" => ReportScope::All,
            "category" => ReportScope::Category(category_id),
            other => {
                return Err(EngineError::Validation(format!(
                    "invalid report scope: {other}"
                )));
            }
        };
        Ok(Self { format, scope })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub amount: MoneyCents,
    pub category: String,
    pub remarks: String,
    pub running_balance: MoneyCents,
}

impl ReportRow {
    /// Cells as text, in [`COLUMNS`] order.
    pub fn cells(&self) -> [String; 6] {
        [
            self.date.format("%Y-%m-%d").to_string(),
            self.kind.label().to_string(),
            self.amount.to_string(),
            self.category.clone(),
            self.remarks.clone(),
            self.running_balance.to_string(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub book_name: String,
    /// Category name or [`ALL_CATEGORIES`].
    pub scope_label: String,
    pub rows: Vec<ReportRow>,
    pub summary: Totals,
}

impl Report {
    pub fn title(&self) -> String {
        format!("Cashbook Report - {} ({})", self.book_name, self.scope_label)
    }

    /// `(label, amount)` lines printed after the table.
    pub fn summary_lines(&self) -> [(&'static str, MoneyCents); 3] {
        [
            ("Cash In", self.summary.cash_in),
            ("Cash Out", self.summary.cash_out),
            ("Net Balance", self.summary.net),
        ]
    }
}

/// Turns a [`Report`] into document bytes.
pub trait ReportRenderer {
    fn content_type(&self) -> &'static str;
    fn extension(&self) -> &'static str;
    fn render(&self, report: &Report) -> ResultEngine<Vec<u8>>;
}

/// A rendered document ready to be downloaded.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `cashbook_report_{book}_{scope}.{ext}`, with characters that are unsafe in
/// a `Content-Disposition` header replaced by `_`.
pub fn file_name(book_name: &str, scope: ReportScope, extension: &str) -> String {
    let book: String = book_name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '"' | '\\' | '/' | ';') {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("cashbook_report_{book}_{}.{extension}", scope.as_str())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_report() -> Report {
        let date = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        Report {
            book_name: "Shop".to_string(),
            scope_label: ALL_CATEGORIES.to_string(),
            rows: vec![
                ReportRow {
                    date: date(1),
                    kind: EntryKind::In,
                    amount: MoneyCents::new(10_000),
                    category: "Sales".to_string(),
                    remarks: "opening".to_string(),
                    running_balance: MoneyCents::new(10_000),
                },
                ReportRow {
                    date: date(2),
                    kind: EntryKind::Out,
                    amount: MoneyCents::new(3_000),
                    category: NOT_AVAILABLE.to_string(),
                    remarks: NOT_AVAILABLE.to_string(),
                    running_balance: MoneyCents::new(7_000),
                },
            ],
            summary: Totals::new(MoneyCents::new(10_000), MoneyCents::new(3_000)).unwrap(),
        }
    }

    #[test]
    fn request_requires_type_and_scope() {
        assert!(ReportRequest::parse(None, Some("all"), None).is_err());
        assert!(ReportRequest::parse(Some("pdf"), None, None).is_err());
        assert!(ReportRequest::parse(Some(" "), Some("all"), None).is_err());
        assert!(ReportRequest::parse(Some("docx"), Some("all"), None).is_err());
        assert!(ReportRequest::parse(Some("pdf"), Some("weekly"), None).is_err());

        let request = ReportRequest::parse(Some("excel"), Some("category"), None).unwrap();
        assert_eq!(request.format, ReportFormat::Excel);
        assert_eq!(request.scope.category_id(), None);
    }

    #[test]
    fn title_and_file_name() {
        let report = sample_report();
        assert_eq!(report.title(), "Cashbook Report - Shop (All Categories)");
        assert_eq!(
            file_name("Shop", ReportScope::All, "pdf"),
            "cashbook_report_Shop_all.pdf"
        );
        assert_eq!(
            file_name("a/b\"c", ReportScope::Category(None), "xlsx"),
            "cashbook_report_a_b_c_category.xlsx"
        );
    }

    #[test]
    fn row_cells() {
        let report = sample_report();
        assert_eq!(
            report.rows[1].cells(),
            [
                "2024-01-02".to_string(),
                "Cash Out".to_string(),
                "30.00".to_string(),
                "N/A".to_string(),
                "N/A".to_string(),
                "70.00".to_string(),
            ]
        );
    }
}
