//! Users and their optional system role.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, SystemRole, util::parse_uuid};

/// A registered user, without the credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub system_role: Option<SystemRole>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, system_role: Option<SystemRole>, created_by: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            system_role,
            created_by,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub system_role: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book_members::Entity")]
    Memberships,
}

impl Related<super::book_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// Active model for a new user with an already hashed password.
    pub(crate) fn from_user(user: &User, password_hash: String) -> Self {
        Self {
            id: ActiveValue::Set(user.id.to_string()),
            username: ActiveValue::Set(user.username.clone()),
            password_hash: ActiveValue::Set(password_hash),
            system_role: ActiveValue::Set(user.system_role.map(|r| r.as_str().to_string())),
            created_by: ActiveValue::Set(user.created_by.map(|id| id.to_string())),
            created_at: ActiveValue::Set(user.created_at),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "user")?,
            username: model.username,
            system_role: model
                .system_role
                .as_deref()
                .map(SystemRole::try_from)
                .transpose()?,
            created_by: model
                .created_by
                .as_deref()
                .map(|id| parse_uuid(id, "user"))
                .transpose()?,
            created_at: model.created_at,
        })
    }
}
