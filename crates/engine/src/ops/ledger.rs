use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Actor, CashEntry, EntryFilter, EntryKind, MoneyCents, ResultEngine, access, cash_entries,
    categories,
    ledger::{PAGE_SIZE, Totals, clamp_page, page_count, running_balances},
    util::parse_uuid,
};

use super::{Engine, with_tx};

/// An entry of the list with the running balance of its page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalancedEntry {
    pub entry: CashEntry,
    pub category_name: Option<String>,
    pub running_balance: MoneyCents,
}

/// One page of a book's entry list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPage {
    pub entries: Vec<BalancedEntry>,
    /// Totals over every filtered entry, not only this page.
    pub totals: Totals,
    pub total_count: u64,
    pub page: u64,
    pub total_pages: u64,
    /// Set when the requested date range was invalid and therefore ignored.
    pub date_filter_error: Option<String>,
}

/// Remarks match on their stored search key, amounts on their two decimal
/// rendering.
const SEARCH_SQL: &str = "(remarks_norm LIKE ? ESCAPE '\\' \
     OR printf('%d.%02d', amount_minor / 100, amount_minor % 100) LIKE ? ESCAPE '\\')";

trait ApplyEntryFilters: QueryFilter + Sized {
    fn apply_entry_filters(
        self,
        filter: &EntryFilter,
        bounds: Option<(NaiveDate, NaiveDate)>,
    ) -> Self;
}

impl<T> ApplyEntryFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_entry_filters(
        mut self,
        filter: &EntryFilter,
        bounds: Option<(NaiveDate, NaiveDate)>,
    ) -> Self {
        if let Some(date) = filter.date {
            self = self.filter(cash_entries::Column::Date.eq(date));
        }
        if let Some((start, end)) = bounds {
            self = self.filter(cash_entries::Column::Date.between(start, end));
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(cash_entries::Column::CategoryId.eq(category_id.to_string()));
        }
        if let Some(kind) = filter.kind {
            self = self.filter(cash_entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(pattern) = filter.search_pattern() {
            self = self.filter(Expr::cust_with_values(
                SEARCH_SQL,
                [pattern.clone(), pattern],
            ));
        }
        self
    }
}

impl Engine {
    /// Filtered, paginated entry list of a book, most recent first.
    ///
    /// The running balance restarts at zero on every page and follows page
    /// order. An invalid date range is reported in
    /// [`EntryPage::date_filter_error`] instead of failing the query.
    pub async fn query_entries(
        &self,
        actor: &Actor,
        book_id: Uuid,
        filter: &EntryFilter,
    ) -> ResultEngine<EntryPage> {
        let (bounds, date_filter_error) = filter.date_bounds(self.today());

        with_tx!(self, |db_tx| {
            self.require_book(&db_tx, actor, book_id, access::can_view_book, "view book")
                .await?;

            let query = cash_entries::Entity::find()
                .filter(cash_entries::Column::BookId.eq(book_id.to_string()))
                .apply_entry_filters(filter, bounds);

            let totals = self.sum_entries(&db_tx, query.clone()).await?;
            let total_count = query.clone().count(&db_tx).await?;
            let total_pages = page_count(total_count);
            let page = clamp_page(filter.page, total_pages);

            let models = query
                .order_by_desc(cash_entries::Column::Date)
                .order_by_desc(cash_entries::Column::Time)
                .order_by_desc(cash_entries::Column::CreatedAt)
                .order_by_desc(cash_entries::Column::Id)
                .offset((page - 1) * PAGE_SIZE)
                .limit(PAGE_SIZE)
                .all(&db_tx)
                .await?;
            let entries = models
                .into_iter()
                .map(CashEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let names = self
                .category_names(&db_tx, entries.iter().filter_map(|e| e.category_id))
                .await?;
            let balances = running_balances(&entries)?;
            let entries = entries
                .into_iter()
                .zip(balances)
                .map(|(entry, running_balance)| BalancedEntry {
                    category_name: entry.category_id.and_then(|id| names.get(&id).cloned()),
                    entry,
                    running_balance,
                })
                .collect();

            Ok(EntryPage {
                entries,
                totals,
                total_count,
                page,
                total_pages,
                date_filter_error,
            })
        })
    }

    /// Cash in and cash out over every row `query` selects.
    pub(super) async fn sum_entries(
        &self,
        db: &DatabaseTransaction,
        query: Select<cash_entries::Entity>,
    ) -> ResultEngine<Totals> {
        let sums: Vec<(String, i64)> = query
            .select_only()
            .column(cash_entries::Column::Kind)
            .column_as(Expr::col(cash_entries::Column::AmountMinor).sum(), "total")
            .group_by(cash_entries::Column::Kind)
            .into_tuple()
            .all(db)
            .await?;

        let mut cash_in = MoneyCents::ZERO;
        let mut cash_out = MoneyCents::ZERO;
        for (kind, total) in sums {
            match EntryKind::try_from(kind.as_str())? {
                EntryKind::In => cash_in = MoneyCents::new(total),
                EntryKind::Out => cash_out = MoneyCents::new(total),
            }
        }
        Totals::new(cash_in, cash_out)
    }

    /// Names of the given categories, keyed by id.
    pub(super) async fn category_names(
        &self,
        db: &DatabaseTransaction,
        ids: impl Iterator<Item = Uuid>,
    ) -> ResultEngine<HashMap<Uuid, String>> {
        let ids: HashSet<String> = ids.map(|id| id.to_string()).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = categories::Entity::find()
            .filter(categories::Column::Id.is_in(ids))
            .all(db)
            .await?;
        models
            .into_iter()
            .map(|model| Ok((parse_uuid(&model.id, "category")?, model.name)))
            .collect()
    }
}
