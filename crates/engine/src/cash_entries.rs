//! Cash entries: a single cash in or cash out recorded in a book.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine,
    util::{parse_uuid, search_key},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    In,
    Out,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }

    /// Human readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::In => "Cash In",
            Self::Out => "Cash Out",
        }
    }

    /// Applies the sign of the kind to a non-negative amount.
    pub fn signed(self, amount: MoneyCents) -> MoneyCents {
        match self {
            Self::In => amount,
            Self::Out => -amount,
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            other => Err(EngineError::Validation(format!(
                "invalid entry type: {other}"
            ))),
        }
    }
}

/// Largest amount a single entry may carry: 99 999 999.99.
pub const MAX_AMOUNT: MoneyCents = MoneyCents::new(99_999_999_99);

/// Entry amounts are non-negative and at most [`MAX_AMOUNT`].
pub fn validate_amount(amount: MoneyCents) -> ResultEngine<()> {
    if amount.is_negative() {
        return Err(EngineError::Validation("amount must be >= 0".to_string()));
    }
    if amount > MAX_AMOUNT {
        return Err(EngineError::Validation(format!(
            "amount must be <= {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CashEntry {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kind: EntryKind,
    pub amount: MoneyCents,
    pub category_id: Option<Uuid>,
    pub remarks: String,
    pub image: Option<String>,
    pub extra: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CashEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        book_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        kind: EntryKind,
        amount: MoneyCents,
        category_id: Option<Uuid>,
        remarks: String,
    ) -> ResultEngine<Self> {
        validate_amount(amount)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            book_id,
            user_id,
            date,
            time,
            kind,
            amount,
            category_id,
            remarks,
            image: None,
            extra: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Amount with the sign of the entry kind (+IN, -OUT).
    pub fn signed_amount(&self) -> MoneyCents {
        self.kind.signed(self.amount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub book_id: String,
    pub user_id: String,
    pub date: Date,
    pub time: Time,
    pub kind: String,
    pub amount_minor: i64,
    pub category_id: Option<String>,
    pub remarks: String,
    /// Lowercased remarks, matched by the entry search.
    pub remarks_norm: String,
    pub image: Option<String>,
    pub extra: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::books::Entity",
        from = "Column::BookId",
        to = "super::books::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Book,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CashEntry> for ActiveModel {
    fn from(entry: &CashEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            book_id: ActiveValue::Set(entry.book_id.to_string()),
            user_id: ActiveValue::Set(entry.user_id.to_string()),
            date: ActiveValue::Set(entry.date),
            time: ActiveValue::Set(entry.time),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount.cents()),
            category_id: ActiveValue::Set(entry.category_id.map(|id| id.to_string())),
            remarks: ActiveValue::Set(entry.remarks.clone()),
            remarks_norm: ActiveValue::Set(search_key(&entry.remarks)),
            image: ActiveValue::Set(entry.image.clone()),
            extra: ActiveValue::Set(entry.extra.clone()),
            created_at: ActiveValue::Set(entry.created_at),
            updated_at: ActiveValue::Set(entry.updated_at),
        }
    }
}

impl TryFrom<Model> for CashEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "entry")?,
            book_id: parse_uuid(&model.book_id, "book")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            date: model.date,
            time: model.time,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
            category_id: model
                .category_id
                .as_deref()
                .map(|id| parse_uuid(id, "category"))
                .transpose()?,
            remarks: model.remarks,
            image: model.image,
            extra: model.extra,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn rejects_negative_amount() {
        let err = CashEntry::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            day(1),
            NaiveTime::MIN,
            EntryKind::In,
            MoneyCents::new(-1),
            None,
            String::new(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::Validation("amount must be >= 0".to_string()));
    }

    #[test]
    fn amounts_are_capped() {
        assert!(validate_amount(MAX_AMOUNT).is_ok());
        assert!(validate_amount(MoneyCents::ZERO).is_ok());
        assert!(matches!(
            validate_amount(MoneyCents::new(MAX_AMOUNT.cents() + 1)),
            Err(EngineError::Validation(_))
        ));
        assert!(validate_amount(MoneyCents::new(i64::MAX)).is_err());
    }

    #[test]
    fn signed_amount_follows_kind() {
        let mut entry = CashEntry::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            day(2),
            NaiveTime::MIN,
            EntryKind::Out,
            MoneyCents::new(3000),
            None,
            String::new(),
        )
        .unwrap();
        assert_eq!(entry.signed_amount(), MoneyCents::new(-3000));
        entry.kind = EntryKind::In;
        assert_eq!(entry.signed_amount(), MoneyCents::new(3000));
    }

    #[test]
    fn kind_parsing() {
        assert_eq!(EntryKind::try_from("in").unwrap(), EntryKind::In);
        assert_eq!(EntryKind::try_from("OUT").unwrap(), EntryKind::Out);
        assert!(EntryKind::try_from("transfer").is_err());
        assert_eq!(EntryKind::Out.label(), "Cash Out");
    }
}
