use std::collections::HashMap;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    Actor, Book, BookRole, EngineError, EntryKind, MoneyCents, ResultEngine, access,
    book_members, books, cash_entries, users,
    util::{normalize_required_name, parse_uuid},
};

use super::{Engine, access::deny, with_tx};

/// A book visible to the actor, with its net balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookSummary {
    pub book: Book,
    pub member_role: Option<BookRole>,
    pub net_balance: MoneyCents,
}

/// A book as seen by one actor: their role and what they may do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookOverview {
    pub book: Book,
    pub member_role: Option<BookRole>,
    pub is_creator: bool,
    pub can_modify_entries: bool,
    pub can_generate_report: bool,
    pub can_manage_users: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    pub user_id: Uuid,
    pub username: String,
    pub role: BookRole,
    pub created_by: Option<Uuid>,
}

impl Engine {
    /// Create a book owned by `actor`, who also becomes its `admin` member.
    pub async fn create_book(&self, actor: &Actor, name: &str) -> ResultEngine<Book> {
        if !access::can_create_book(actor) {
            return Err(deny(actor, "partners cannot create books"));
        }
        let name = normalize_required_name(name, "book")?;
        let book = Book::new(name, actor.id);

        with_tx!(self, |db_tx| {
            books::ActiveModel::from(&book).insert(&db_tx).await?;
            book_members::ActiveModel {
                book_id: ActiveValue::Set(book.id.to_string()),
                user_id: ActiveValue::Set(actor.id.to_string()),
                role: ActiveValue::Set(BookRole::Admin.as_str().to_string()),
                created_by: ActiveValue::Set(Some(actor.id.to_string())),
            }
            .insert(&db_tx)
            .await?;
            info!(actor = %actor.username, book = %book.id, "book created");
            Ok(book)
        })
    }

    /// Books the actor created or is a member of, oldest first.
    pub async fn list_books(&self, actor: &Actor) -> ResultEngine<Vec<BookSummary>> {
        with_tx!(self, |db_tx| {
            let (models, memberships) = self.visible_books(&db_tx, actor).await?;

            let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
            let sums: Vec<(String, String, i64)> = cash_entries::Entity::find()
                .select_only()
                .column(cash_entries::Column::BookId)
                .column(cash_entries::Column::Kind)
                .column_as(Expr::col(cash_entries::Column::AmountMinor).sum(), "total")
                .filter(cash_entries::Column::BookId.is_in(ids))
                .group_by(cash_entries::Column::BookId)
                .group_by(cash_entries::Column::Kind)
                .into_tuple()
                .all(&db_tx)
                .await?;

            let mut nets: HashMap<String, MoneyCents> = HashMap::new();
            for (book_id, kind, total) in sums {
                let amount = EntryKind::try_from(kind.as_str())?.signed(total.into());
                let net = nets.entry(book_id).or_default();
                *net = net.checked_add(amount).ok_or_else(|| {
                    EngineError::Validation("balance out of range".to_string())
                })?;
            }

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let member_role = memberships
                    .get(&model.id)
                    .map(|role| BookRole::try_from(role.as_str()))
                    .transpose()?;
                let net_balance = nets.get(&model.id).copied().unwrap_or_default();
                out.push(BookSummary {
                    book: Book::try_from(model)?,
                    member_role,
                    net_balance,
                });
            }
            Ok(out)
        })
    }

    pub async fn book_overview(
        &self,
        actor: &Actor,
        book_id: Uuid,
    ) -> ResultEngine<BookOverview> {
        with_tx!(self, |db_tx| {
            let (book, ctx) = self
                .require_book(&db_tx, actor, book_id, access::can_view_book, "view book")
                .await?;
            Ok(BookOverview {
                book: Book::try_from(book)?,
                member_role: ctx.member_role,
                is_creator: ctx.created_by == actor.id,
                can_modify_entries: access::can_modify_entries(actor, &ctx),
                can_generate_report: access::can_generate_report(actor, &ctx),
                can_manage_users: access::can_manage_book_users(actor, &ctx),
            })
        })
    }

    /// Members of a book, ordered by username.
    pub async fn list_members(
        &self,
        actor: &Actor,
        book_id: Uuid,
    ) -> ResultEngine<Vec<MemberInfo>> {
        with_tx!(self, |db_tx| {
            self.require_book(
                &db_tx,
                actor,
                book_id,
                access::can_manage_book_users,
                "manage book users",
            )
            .await?;

            let rows = book_members::Entity::find()
                .filter(book_members::Column::BookId.eq(book_id.to_string()))
                .find_also_related(users::Entity)
                .order_by_asc(users::Column::Username)
                .all(&db_tx)
                .await?;

            let mut members = Vec::with_capacity(rows.len());
            for (member, user) in rows {
                let Some(user) = user else {
                    continue;
                };
                members.push(MemberInfo {
                    user_id: parse_uuid(&member.user_id, "user")?,
                    username: user.username,
                    role: BookRole::try_from(member.role.as_str())?,
                    created_by: member
                        .created_by
                        .as_deref()
                        .map(|id| parse_uuid(id, "user"))
                        .transpose()?,
                });
            }
            Ok(members)
        })
    }

    /// Books created by `actor` or where `actor` is a member, with the
    /// actor's membership roles keyed by book id.
    pub(super) async fn visible_books(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
    ) -> ResultEngine<(Vec<books::Model>, HashMap<String, String>)> {
        let memberships: HashMap<String, String> = book_members::Entity::find()
            .filter(book_members::Column::UserId.eq(actor.id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.book_id, m.role))
            .collect();

        let models = books::Entity::find()
            .filter(
                Condition::any()
                    .add(books::Column::CreatedBy.eq(actor.id.to_string()))
                    .add(books::Column::Id.is_in(memberships.keys().cloned())),
            )
            .order_by_asc(books::Column::CreatedAt)
            .order_by_asc(books::Column::Id)
            .all(db)
            .await?;
        Ok((models, memberships))
    }
}
