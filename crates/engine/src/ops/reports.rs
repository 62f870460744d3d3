use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{
    Actor, CashEntry, ResultEngine, access, cash_entries,
    ledger::{Totals, running_balances},
    report::{
        self, ALL_CATEGORIES, NOT_AVAILABLE, RenderedReport, Report, ReportRequest, ReportRow,
    },
};

use super::{Engine, with_tx};

impl Engine {
    /// Every entry in scope, oldest first, with a running balance over the
    /// whole set.
    pub async fn build_report(
        &self,
        actor: &Actor,
        book_id: Uuid,
        request: &ReportRequest,
    ) -> ResultEngine<Report> {
        with_tx!(self, |db_tx| {
            let (book, _) = self
                .require_book(
                    &db_tx,
                    actor,
                    book_id,
                    access::can_generate_report,
                    "generate report",
                )
                .await?;

            let mut query = cash_entries::Entity::find()
                .filter(cash_entries::Column::BookId.eq(book_id.to_string()));
            let scope_label = match request.scope.category_id() {
                Some(category_id) => {
                    let category = self
                        .require_category_in_book(&db_tx, book_id, category_id)
                        .await?;
                    query = query
                        .filter(cash_entries::Column::CategoryId.eq(category_id.to_string()));
                    category.name
                }
                None => ALL_CATEGORIES.to_string(),
            };

            let entries = query
                .order_by_asc(cash_entries::Column::Date)
                .order_by_asc(cash_entries::Column::Time)
                .order_by_asc(cash_entries::Column::CreatedAt)
                .order_by_asc(cash_entries::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(CashEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let names = self
                .category_names(&db_tx, entries.iter().filter_map(|e| e.category_id))
                .await?;
            let summary = Totals::from_entries(&entries)?;
            let balances = running_balances(&entries)?;
            let rows = entries
                .into_iter()
                .zip(balances)
                .map(|(entry, running_balance)| ReportRow {
                    date: entry.date,
                    kind: entry.kind,
                    amount: entry.amount,
                    category: entry
                        .category_id
                        .and_then(|id| names.get(&id).cloned())
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    remarks: if entry.remarks.is_empty() {
                        NOT_AVAILABLE.to_string()
                    } else {
                        entry.remarks
                    },
                    running_balance,
                })
                .collect();

            Ok(Report {
                book_name: book.name,
                scope_label,
                rows,
                summary,
            })
        })
    }

    /// Report download from raw request parameters. Report rights are
    /// checked before the parameters are validated.
    pub async fn download_report(
        &self,
        actor: &Actor,
        book_id: Uuid,
        format: Option<&str>,
        scope: Option<&str>,
        category_id: Option<Uuid>,
    ) -> ResultEngine<RenderedReport> {
        self.require_report_access(actor, book_id).await?;
        let request = ReportRequest::parse(format, scope, category_id)?;
        self.generate_report(actor, book_id, &request).await
    }

    async fn require_report_access(&self, actor: &Actor, book_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_book(
                &db_tx,
                actor,
                book_id,
                access::can_generate_report,
                "generate report",
            )
            .await?;
            Ok(())
        })
    }

    /// Build and render a report in the requested format.
    pub async fn generate_report(
        &self,
        actor: &Actor,
        book_id: Uuid,
        request: &ReportRequest,
    ) -> ResultEngine<RenderedReport> {
        let report = self.build_report(actor, book_id, request).await?;
        let renderer = request.format.renderer();
        let bytes = renderer.render(&report)?;
        info!(
            actor = %actor.username,
            book = %book_id,
            format = renderer.extension(),
            rows = report.rows.len(),
            "report generated"
        );
        Ok(RenderedReport {
            file_name: report::file_name(&report.book_name, request.scope, renderer.extension()),
            content_type: renderer.content_type(),
            bytes,
        })
    }
}
