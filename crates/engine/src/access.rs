//! Authorization evaluator.
//!
//! Every predicate here is pure: callers load the [`BookContext`] from the
//! store inside the same transaction that performs the guarded operation and
//! abort with [`EngineError::Forbidden`](crate::EngineError::Forbidden) when a
//! predicate returns `false`.
//!
//! A missing membership never grants access on its own; only a system
//! `Admin`, the book creator, or an explicit membership does.

use uuid::Uuid;

use crate::{BookRole, SystemRole, User};

/// The authenticated user performing an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub system_role: Option<SystemRole>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.system_role == Some(SystemRole::Admin)
    }

    pub fn is_partner(&self) -> bool {
        self.system_role == Some(SystemRole::Partner)
    }
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            system_role: user.system_role,
        }
    }
}

/// What the evaluator needs to know about a book for a given actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookContext {
    pub book_id: Uuid,
    pub created_by: Uuid,
    /// Role of the actor in the book, if the actor is a member.
    pub member_role: Option<BookRole>,
}

impl BookContext {
    fn is_creator(&self, actor: &Actor) -> bool {
        self.created_by == actor.id
    }

    fn is_book_admin(&self) -> bool {
        self.member_role == Some(BookRole::Admin)
    }
}

pub fn can_view_book(actor: &Actor, book: &BookContext) -> bool {
    actor.is_admin() || book.is_creator(actor) || book.member_role.is_some()
}

pub fn can_modify_entries(actor: &Actor, book: &BookContext) -> bool {
    actor.is_admin()
        || book.is_creator(actor)
        || book.member_role.is_some_and(BookRole::can_write)
}

pub fn can_generate_report(actor: &Actor, book: &BookContext) -> bool {
    actor.is_admin()
        || actor.system_role == Some(SystemRole::Manager)
        || book.is_creator(actor)
        || book.is_book_admin()
}

pub fn can_manage_book_users(actor: &Actor, book: &BookContext) -> bool {
    actor.is_admin() || book.is_creator(actor) || book.is_book_admin()
}

/// `book` is the context of the book owning the category.
pub fn can_manage_category(
    actor: &Actor,
    book: &BookContext,
    category_created_by: Option<Uuid>,
) -> bool {
    actor.is_admin() || category_created_by == Some(actor.id) || book.is_book_admin()
}

pub fn can_create_book(actor: &Actor) -> bool {
    !actor.is_partner()
}

/// Edit rights over another user, system-wide (`book = None`) or inside a
/// book.
pub fn can_manage_user(actor: &Actor, book: Option<&BookContext>) -> bool {
    actor.is_admin() || book.is_some_and(|ctx| can_manage_book_users(actor, ctx))
}

/// Delete rights over `target`.
///
/// `target_created_books` is whether the target created any book at all; it
/// only matters for system-wide deletion.
pub fn can_delete_user(
    actor: &Actor,
    target: Uuid,
    target_created_books: bool,
    book: Option<&BookContext>,
) -> bool {
    if !can_manage_user(actor, book) {
        return false;
    }
    match book {
        Some(ctx) => ctx.created_by != target,
        None => !target_created_books,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Option<SystemRole>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            username: "someone".to_string(),
            system_role: role,
        }
    }

    fn book(created_by: Uuid, member_role: Option<BookRole>) -> BookContext {
        BookContext {
            book_id: Uuid::new_v4(),
            created_by,
            member_role,
        }
    }

    #[test]
    fn view_requires_admin_creator_or_membership() {
        let stranger = actor(Some(SystemRole::Manager));
        let other = Uuid::new_v4();

        assert!(!can_view_book(&stranger, &book(other, None)));
        assert!(can_view_book(&stranger, &book(stranger.id, None)));
        assert!(can_view_book(&stranger, &book(other, Some(BookRole::Partner))));
        assert!(can_view_book(&actor(Some(SystemRole::Admin)), &book(other, None)));
    }

    #[test]
    fn no_system_role_gets_no_extra_access() {
        let plain = actor(None);
        let other = Uuid::new_v4();
        assert!(!can_view_book(&plain, &book(other, None)));
        assert!(can_create_book(&plain));
    }

    #[test]
    fn entry_writes_need_manager_or_admin_membership() {
        let user = actor(None);
        let other = Uuid::new_v4();

        assert!(!can_modify_entries(&user, &book(other, Some(BookRole::Partner))));
        assert!(can_modify_entries(&user, &book(other, Some(BookRole::Manager))));
        assert!(can_modify_entries(&user, &book(other, Some(BookRole::Admin))));
        assert!(can_modify_entries(&user, &book(user.id, None)));
    }

    #[test]
    fn reports_allowed_for_system_managers() {
        let other = Uuid::new_v4();
        let manager = actor(Some(SystemRole::Manager));
        let partner = actor(Some(SystemRole::Partner));

        assert!(can_generate_report(&manager, &book(other, None)));
        assert!(!can_generate_report(&partner, &book(other, Some(BookRole::Manager))));
        assert!(can_generate_report(&partner, &book(other, Some(BookRole::Admin))));
    }

    #[test]
    fn category_management() {
        let user = actor(None);
        let other = Uuid::new_v4();
        let ctx = book(other, Some(BookRole::Manager));

        assert!(can_manage_category(&user, &ctx, Some(user.id)));
        assert!(!can_manage_category(&user, &ctx, Some(other)));
        assert!(!can_manage_category(&user, &ctx, None));
        assert!(can_manage_category(&user, &book(other, Some(BookRole::Admin)), Some(other)));
    }

    #[test]
    fn partners_cannot_create_books() {
        assert!(!can_create_book(&actor(Some(SystemRole::Partner))));
        assert!(can_create_book(&actor(Some(SystemRole::Manager))));
    }

    #[test]
    fn delete_user_rules() {
        let admin = actor(Some(SystemRole::Admin));
        let manager = actor(Some(SystemRole::Manager));
        let target = Uuid::new_v4();

        // system-wide
        assert!(can_delete_user(&admin, target, false, None));
        assert!(!can_delete_user(&admin, target, true, None));
        assert!(!can_delete_user(&manager, target, false, None));

        // book-scoped
        let owned = book(manager.id, None);
        assert!(can_delete_user(&manager, target, true, Some(&owned)));
        let target_owned = book(target, Some(BookRole::Admin));
        assert!(!can_delete_user(&manager, target, true, Some(&target_owned)));
        let foreign = book(Uuid::new_v4(), Some(BookRole::Manager));
        assert!(!can_delete_user(&manager, target, false, Some(&foreign)));
    }
}
