use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    Actor, Category, EngineError, ResultEngine, access, cash_entries, categories,
    util::{normalize_key, normalize_required_name, parse_uuid},
};

use super::{Engine, access::deny, with_tx};

impl Engine {
    /// Add a category to a book.
    ///
    /// Names are unique per book ignoring case and Unicode composition.
    pub async fn create_category(
        &self,
        actor: &Actor,
        book_id: Uuid,
        name: &str,
    ) -> ResultEngine<Category> {
        if actor.is_partner() {
            return Err(deny(actor, "partners cannot manage categories"));
        }
        let name = normalize_required_name(name, "category")?;

        with_tx!(self, |db_tx| {
            self.require_book(
                &db_tx,
                actor,
                book_id,
                access::can_modify_entries,
                "modify entries",
            )
            .await?;
            self.ensure_category_name_free(&db_tx, book_id, &name, None)
                .await?;

            let category = Category::new(book_id, name, actor.id);
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            info!(actor = %actor.username, book = %book_id, category = %category.id, "category created");
            Ok(category)
        })
    }

    /// Categories of one book, by name.
    pub async fn list_book_categories(
        &self,
        actor: &Actor,
        book_id: Uuid,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            self.require_book(&db_tx, actor, book_id, access::can_view_book, "view book")
                .await?;
            categories::Entity::find()
                .filter(categories::Column::BookId.eq(book_id.to_string()))
                .order_by_asc(categories::Column::NameNorm)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Category::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Categories of every book the actor created or belongs to.
    pub async fn list_categories(&self, actor: &Actor) -> ResultEngine<Vec<Category>> {
        if actor.is_partner() {
            return Err(deny(actor, "partners cannot manage categories"));
        }
        with_tx!(self, |db_tx| {
            let (books, _) = self.visible_books(&db_tx, actor).await?;
            let ids: Vec<String> = books.into_iter().map(|b| b.id).collect();
            categories::Entity::find()
                .filter(categories::Column::BookId.is_in(ids))
                .order_by_asc(categories::Column::BookId)
                .order_by_asc(categories::Column::NameNorm)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Category::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn rename_category(
        &self,
        actor: &Actor,
        category_id: Uuid,
        name: &str,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;

        with_tx!(self, |db_tx| {
            let model = self.require_manageable_category(&db_tx, actor, category_id).await?;
            let book_id = parse_uuid(&model.book_id, "book")?;
            self.ensure_category_name_free(&db_tx, book_id, &name, Some(category_id))
                .await?;

            let mut category = Category::try_from(model)?;
            category.name = name;
            let mut active: categories::ActiveModel = (&category).into();
            active.created_at = ActiveValue::NotSet;
            active.created_by = ActiveValue::NotSet;
            active.book_id = ActiveValue::NotSet;
            active.update(&db_tx).await?;
            info!(actor = %actor.username, category = %category_id, "category renamed");
            Ok(category)
        })
    }

    /// Delete a category. Refused with `Conflict` while any entry uses it.
    pub async fn delete_category(&self, actor: &Actor, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_manageable_category(&db_tx, actor, category_id).await?;

            let in_use = cash_entries::Entity::find()
                .filter(cash_entries::Column::CategoryId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if in_use > 0 {
                warn!(actor = %actor.username, category = %category_id, in_use, "category delete refused");
                return Err(EngineError::Conflict(format!(
                    "category '{}' is used by {in_use} entries",
                    model.name
                )));
            }

            categories::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            info!(actor = %actor.username, category = %category_id, "category deleted");
            Ok(())
        })
    }

    async fn require_manageable_category(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        let model = self.require_category_model(db, category_id).await?;
        let book_id = parse_uuid(&model.book_id, "book")?;
        let (_, ctx) = self.book_context(db, actor, book_id).await?;
        let created_by = model
            .created_by
            .as_deref()
            .map(|id| parse_uuid(id, "user"))
            .transpose()?;
        if !access::can_manage_category(actor, &ctx, created_by) {
            return Err(deny(actor, "manage category"));
        }
        Ok(model)
    }

    async fn ensure_category_name_free(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::BookId.eq(book_id.to_string()))
            .filter(categories::Column::NameNorm.eq(normalize_key(name)));
        if let Some(id) = except {
            query = query.filter(categories::Column::Id.ne(id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::Conflict(format!(
                "category '{name}' already exists"
            )));
        }
        Ok(())
    }
}
