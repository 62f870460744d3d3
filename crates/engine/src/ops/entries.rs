use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{
    Actor, CashEntry, EngineError, EntryKind, MoneyCents, ResultEngine, access, cash_entries,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// Input for a new entry. Missing date and time default to now in the
/// engine timezone.
#[derive(Clone, Debug)]
pub struct NewEntry {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub kind: EntryKind,
    pub amount: MoneyCents,
    pub category_id: Option<Uuid>,
    pub remarks: Option<String>,
    pub image: Option<String>,
    pub extra: Option<String>,
}

/// Partial update of an entry. `None` leaves the field unchanged; the nested
/// options clear the field with `Some(None)`.
#[derive(Clone, Debug, Default)]
pub struct EntryChanges {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub kind: Option<EntryKind>,
    pub amount: Option<MoneyCents>,
    pub category_id: Option<Option<Uuid>>,
    pub remarks: Option<String>,
    pub image: Option<Option<String>>,
    pub extra: Option<Option<String>>,
}

impl Engine {
    pub async fn add_entry(
        &self,
        actor: &Actor,
        book_id: Uuid,
        input: NewEntry,
    ) -> ResultEngine<CashEntry> {
        let mut entry = CashEntry::new(
            book_id,
            actor.id,
            input.date.unwrap_or_else(|| self.today()),
            input.time.unwrap_or_else(|| self.now_time()),
            input.kind,
            input.amount,
            input.category_id,
            normalize_optional_text(input.remarks.as_deref()).unwrap_or_default(),
        )?;
        entry.image = normalize_optional_text(input.image.as_deref());
        entry.extra = normalize_optional_text(input.extra.as_deref());

        with_tx!(self, |db_tx| {
            self.require_book(
                &db_tx,
                actor,
                book_id,
                access::can_modify_entries,
                "modify entries",
            )
            .await?;
            if let Some(category_id) = entry.category_id {
                self.require_category_in_book(&db_tx, book_id, category_id)
                    .await?;
            }
            cash_entries::ActiveModel::from(&entry).insert(&db_tx).await?;
            info!(
                actor = %actor.username,
                book = %book_id,
                entry = %entry.id,
                kind = entry.kind.as_str(),
                amount = %entry.amount,
                "entry added"
            );
            Ok(entry)
        })
    }

    pub async fn update_entry(
        &self,
        actor: &Actor,
        book_id: Uuid,
        entry_id: Uuid,
        changes: EntryChanges,
    ) -> ResultEngine<CashEntry> {
        if let Some(amount) = changes.amount {
            cash_entries::validate_amount(amount)?;
        }

        with_tx!(self, |db_tx| {
            self.require_book(
                &db_tx,
                actor,
                book_id,
                access::can_modify_entries,
                "modify entries",
            )
            .await?;
            let mut entry = self.require_entry(&db_tx, book_id, entry_id).await?;

            if let Some(Some(category_id)) = changes.category_id {
                self.require_category_in_book(&db_tx, book_id, category_id)
                    .await?;
            }

            if let Some(date) = changes.date {
                entry.date = date;
            }
            if let Some(time) = changes.time {
                entry.time = time;
            }
            if let Some(kind) = changes.kind {
                entry.kind = kind;
            }
            if let Some(amount) = changes.amount {
                entry.amount = amount;
            }
            if let Some(category_id) = changes.category_id {
                entry.category_id = category_id;
            }
            if let Some(remarks) = changes.remarks.as_deref() {
                entry.remarks = normalize_optional_text(Some(remarks)).unwrap_or_default();
            }
            if let Some(image) = changes.image.as_ref() {
                entry.image = normalize_optional_text(image.as_deref());
            }
            if let Some(extra) = changes.extra.as_ref() {
                entry.extra = normalize_optional_text(extra.as_deref());
            }
            entry.updated_at = Utc::now();

            cash_entries::ActiveModel::from(&entry)
                .update(&db_tx)
                .await?;
            info!(actor = %actor.username, book = %book_id, entry = %entry_id, "entry updated");
            Ok(entry)
        })
    }

    /// Hard delete of one entry.
    pub async fn delete_entry(
        &self,
        actor: &Actor,
        book_id: Uuid,
        entry_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_book(
                &db_tx,
                actor,
                book_id,
                access::can_modify_entries,
                "modify entries",
            )
            .await?;
            self.require_entry(&db_tx, book_id, entry_id).await?;
            cash_entries::Entity::delete_by_id(entry_id.to_string())
                .exec(&db_tx)
                .await?;
            info!(actor = %actor.username, book = %book_id, entry = %entry_id, "entry deleted");
            Ok(())
        })
    }

    pub async fn get_entry(
        &self,
        actor: &Actor,
        book_id: Uuid,
        entry_id: Uuid,
    ) -> ResultEngine<CashEntry> {
        with_tx!(self, |db_tx| {
            self.require_book(&db_tx, actor, book_id, access::can_view_book, "view book")
                .await?;
            self.require_entry(&db_tx, book_id, entry_id).await
        })
    }

    /// Load an entry, `KeyNotFound` unless it belongs to `book_id`.
    async fn require_entry(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        entry_id: Uuid,
    ) -> ResultEngine<CashEntry> {
        cash_entries::Entity::find_by_id(entry_id.to_string())
            .filter(cash_entries::Column::BookId.eq(book_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("entry not exists".to_string()))
            .and_then(CashEntry::try_from)
    }
}
