//! Categories are scoped to one book.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{normalize_key, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub book_id: Uuid,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(book_id: Uuid, name: String, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            name,
            created_by: Some(created_by),
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub book_id: String,
    pub name: String,
    /// Case and composition folded name, unique per book.
    pub name_norm: String,
    pub created_by: Option<String>,
    pub created_at: DateTimeUtc,
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
    #[sea_orm(has_many = "super::cash_entries::Entity")]
    Entries,
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::cash_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(value: &Category) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            book_id: ActiveValue::Set(value.book_id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(normalize_key(&value.name)),
            created_by: ActiveValue::Set(value.created_by.map(|id| id.to_string())),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "category")?,
            book_id: parse_uuid(&model.book_id, "book")?,
            name: model.name,
            created_by: model
                .created_by
                .as_deref()
                .map(|id| parse_uuid(id, "user"))
                .transpose()?,
            created_at: model.created_at,
        })
    }
}
