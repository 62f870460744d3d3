use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use tracing::warn;
use uuid::Uuid;

use crate::{
    Actor, BookContext, BookRole, EngineError, ResultEngine, book_members, books, categories,
    users,
};

use super::Engine;

/// Signature shared by the book predicates of the evaluator.
pub(super) type BookCheck = fn(&Actor, &BookContext) -> bool;

/// Log a refused operation and build the error returned to the caller.
pub(super) fn deny(actor: &Actor, action: &str) -> EngineError {
    warn!(actor = %actor.username, action, "permission denied");
    EngineError::Forbidden(action.to_string())
}

impl Engine {
    pub(super) async fn require_book_model(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
    ) -> ResultEngine<books::Model> {
        books::Entity::find_by_id(book_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("book not exists".to_string()))
    }

    pub(super) async fn member_role(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Option<BookRole>> {
        book_members::Entity::find_by_id((book_id.to_string(), user_id.to_string()))
            .one(db)
            .await?
            .map(|model| BookRole::try_from(model.role.as_str()))
            .transpose()
    }

    /// Load the book and the actor's standing in it.
    pub(super) async fn book_context(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        book_id: Uuid,
    ) -> ResultEngine<(books::Model, BookContext)> {
        let book = self.require_book_model(db, book_id).await?;
        let created_by = crate::util::parse_uuid(&book.created_by, "user")?;
        let member_role = self.member_role(db, book_id, actor.id).await?;
        let ctx = BookContext {
            book_id,
            created_by,
            member_role,
        };
        Ok((book, ctx))
    }

    /// Load the book context and fail with `Forbidden` unless `check` holds.
    pub(super) async fn require_book(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        book_id: Uuid,
        check: BookCheck,
        action: &str,
    ) -> ResultEngine<(books::Model, BookContext)> {
        let (book, ctx) = self.book_context(db, actor, book_id).await?;
        if !check(actor, &ctx) {
            return Err(deny(actor, action));
        }
        Ok((book, ctx))
    }

    pub(super) async fn require_user_model(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_category_model(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    /// Ensure the category exists and belongs to `book_id`.
    pub(super) async fn require_category_in_book(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::BookId.eq(book_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    pub(super) async fn has_created_books(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<bool> {
        Ok(books::Entity::find()
            .filter(books::Column::CreatedBy.eq(user_id.to_string()))
            .one(db)
            .await?
            .is_some())
    }
}
