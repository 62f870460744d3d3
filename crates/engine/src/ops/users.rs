//! Accounts, memberships and their lifecycle.

use std::collections::{BTreeMap, HashSet};

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    Actor, BookContext, BookRole, EngineError, ResultEngine, SystemRole, User, access,
    book_members, books, cash_entries, categories, users,
    util::{hash_password, parse_uuid, verify_password},
};

use super::{Engine, MemberInfo, access::deny, with_tx};

/// Usernames longer than this are refused.
const MAX_USERNAME_LEN: usize = 150;

/// Raw "add user to book" input: either an existing user or the credentials
/// of a new one.
#[derive(Clone, Debug)]
pub struct AddMemberForm {
    pub select_user: Option<Uuid>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub system_role: Option<SystemRole>,
    pub book_role: BookRole,
}

/// Validated [`AddMemberForm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddMember {
    Existing {
        user_id: Uuid,
        book_role: BookRole,
    },
    New {
        username: String,
        password: String,
        system_role: SystemRole,
        book_role: BookRole,
    },
}

impl TryFrom<AddMemberForm> for AddMember {
    type Error = EngineError;

    fn try_from(form: AddMemberForm) -> Result<Self, Self::Error> {
        let username = form
            .username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let password = form.password.filter(|s| !s.is_empty());

        match (form.select_user, username, password) {
            (Some(user_id), None, None) => Ok(Self::Existing {
                user_id,
                book_role: form.book_role,
            }),
            (Some(_), _, _) => Err(EngineError::Validation(
                "do not provide username or password when selecting an existing user"
                    .to_string(),
            )),
            (None, Some(username), Some(password)) => {
                let system_role = form.system_role.ok_or_else(|| {
                    EngineError::Validation("system role is required for a new user".to_string())
                })?;
                Ok(Self::New {
                    username: validate_username(username)?,
                    password,
                    system_role,
                    book_role: form.book_role,
                })
            }
            (None, _, _) => Err(EngineError::Validation(
                "either select an existing user or provide a username and password".to_string(),
            )),
        }
    }
}

/// What an edit applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditTarget {
    /// System-wide account edit.
    User { user_id: Uuid },
    /// Account edit plus the user's role inside one book.
    Membership { book_id: Uuid, user_id: Uuid },
}

impl EditTarget {
    fn user_id(self) -> Uuid {
        match self {
            Self::User { user_id } | Self::Membership { user_id, .. } => user_id,
        }
    }

    fn book_id(self) -> Option<Uuid> {
        match self {
            Self::User { .. } => None,
            Self::Membership { book_id, .. } => Some(book_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserEdit {
    pub username: String,
    /// Replaces any previous system role.
    pub system_role: SystemRole,
    /// Required for [`EditTarget::Membership`], ignored otherwise.
    pub book_role: Option<BookRole>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditOutcome {
    pub user: User,
    pub book_role: Option<BookRole>,
    /// The actor edited their own account and should authenticate again.
    pub refresh_session: bool,
}

/// A book membership granted by the listing actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedMembership {
    pub book_id: Uuid,
    pub book_name: String,
    pub role: BookRole,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedUser {
    pub user: User,
    pub memberships: Vec<ManagedMembership>,
    /// `false` for the actor's own account.
    pub can_manage: bool,
}

fn validate_username(username: &str) -> ResultEngine<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(EngineError::Validation(
            "username must not be empty".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(EngineError::Validation(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(username.to_string())
}

fn validate_password(password: &str) -> ResultEngine<()> {
    if password.is_empty() {
        return Err(EngineError::Validation(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Self-service registration. The new account is an `Admin` of the books
    /// it will create.
    pub async fn register(&self, username: &str, password: &str) -> ResultEngine<User> {
        let user = self
            .create_user(username, password, Some(SystemRole::Admin))
            .await?;
        info!(user = %user.username, "user registered");
        Ok(user)
    }

    /// Create an account without an acting user (registration and bootstrap).
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        system_role: Option<SystemRole>,
    ) -> ResultEngine<User> {
        let username = validate_username(username)?;
        validate_password(password)?;

        with_tx!(self, |db_tx| {
            self.ensure_username_free(&db_tx, &username, None).await?;
            let user = User::new(username, system_role, None);
            users::ActiveModel::from_user(&user, hash_password(password))
                .insert(&db_tx)
                .await?;
            Ok(user)
        })
    }

    /// Check credentials and return the matching actor.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Actor> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?;
        match model {
            Some(model) if verify_password(password, &model.password_hash) => {
                Ok(Actor::from(User::try_from(model)?))
            }
            _ => Err(EngineError::Forbidden("invalid credentials".to_string())),
        }
    }

    /// Attach an existing user to a book or create a new user and attach it,
    /// recording `actor` as the membership creator.
    pub async fn add_book_member(
        &self,
        actor: &Actor,
        book_id: Uuid,
        form: AddMemberForm,
    ) -> ResultEngine<MemberInfo> {
        let request = AddMember::try_from(form)?;

        with_tx!(self, |db_tx| {
            let (book, _) = self
                .require_book(
                    &db_tx,
                    actor,
                    book_id,
                    access::can_manage_book_users,
                    "manage book users",
                )
                .await?;

            let (user_id, username, book_role) = match request {
                AddMember::Existing { user_id, book_role } => {
                    let model = self.require_user_model(&db_tx, user_id).await?;
                    if self.member_role(&db_tx, book_id, user_id).await?.is_some() {
                        warn!(actor = %actor.username, book = %book_id, user = %model.username, "already a member");
                        return Err(EngineError::Conflict(format!(
                            "user {} is already a member of this book",
                            model.username
                        )));
                    }
                    if !self.candidate_ids(&db_tx, &book).await?.contains(&model.id) {
                        warn!(actor = %actor.username, book = %book_id, user = %model.username, "not an attach candidate");
                        return Err(EngineError::Validation(format!(
                            "user {} cannot be attached to this book",
                            model.username
                        )));
                    }
                    (user_id, model.username, book_role)
                }
                AddMember::New {
                    username,
                    password,
                    system_role,
                    book_role,
                } => {
                    validate_password(&password)?;
                    self.ensure_username_free(&db_tx, &username, None).await?;
                    let user = User::new(username, Some(system_role), Some(actor.id));
                    users::ActiveModel::from_user(&user, hash_password(&password))
                        .insert(&db_tx)
                        .await?;
                    (user.id, user.username, book_role)
                }
            };

            book_members::ActiveModel {
                book_id: ActiveValue::Set(book_id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(book_role.as_str().to_string()),
                created_by: ActiveValue::Set(Some(actor.id.to_string())),
            }
            .insert(&db_tx)
            .await?;
            info!(
                actor = %actor.username,
                book = %book_id,
                user = %username,
                role = book_role.as_str(),
                "member added"
            );

            Ok(MemberInfo {
                user_id,
                username,
                role: book_role,
                created_by: Some(actor.id),
            })
        })
    }

    /// Edit a user's name and system role and, for a membership target, their
    /// role in the book (the membership is created when missing).
    ///
    /// Store failures roll the whole edit back and surface as
    /// `TransactionFailed`.
    pub async fn edit_user(
        &self,
        actor: &Actor,
        target: EditTarget,
        edit: UserEdit,
    ) -> ResultEngine<EditOutcome> {
        let username = validate_username(&edit.username)?;
        if target.book_id().is_some() && edit.book_role.is_none() {
            return Err(EngineError::Validation(
                "book role is required when editing a book member".to_string(),
            ));
        }

        self.edit_user_tx(actor, target, &username, &edit)
            .await
            .map_err(|err| match err {
                EngineError::Database(db_err) => {
                    error!(actor = %actor.username, user = %target.user_id(), "user update failed: {db_err}");
                    EngineError::TransactionFailed("user update failed".to_string())
                }
                other => other,
            })
    }

    async fn edit_user_tx(
        &self,
        actor: &Actor,
        target: EditTarget,
        username: &str,
        edit: &UserEdit,
    ) -> ResultEngine<EditOutcome> {
        let user_id = target.user_id();

        with_tx!(self, |db_tx| {
            let model = self.require_user_model(&db_tx, user_id).await?;
            let ctx = match target.book_id() {
                Some(book_id) => Some(self.book_context(&db_tx, actor, book_id).await?.1),
                None => None,
            };
            if !access::can_manage_user(actor, ctx.as_ref()) {
                return Err(deny(actor, "manage users"));
            }
            self.ensure_username_free(&db_tx, username, Some(user_id))
                .await?;

            let mut user = User::try_from(model)?;
            let old_username = std::mem::replace(&mut user.username, username.to_string());
            user.system_role = Some(edit.system_role);

            users::ActiveModel {
                id: ActiveValue::Set(user.id.to_string()),
                username: ActiveValue::Set(user.username.clone()),
                system_role: ActiveValue::Set(Some(edit.system_role.as_str().to_string())),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            let book_role = match (ctx, edit.book_role) {
                (Some(ctx), Some(role)) => {
                    self.upsert_membership(&db_tx, actor, ctx.book_id, user_id, role)
                        .await?;
                    Some(role)
                }
                _ => None,
            };

            info!(
                actor = %actor.username,
                old_username = %old_username,
                username = %user.username,
                system_role = edit.system_role.as_str(),
                book_role = book_role.map(BookRole::as_str),
                "user updated"
            );
            Ok(EditOutcome {
                refresh_session: user.id == actor.id,
                user,
                book_role,
            })
        })
    }

    async fn upsert_membership(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        book_id: Uuid,
        user_id: Uuid,
        role: BookRole,
    ) -> ResultEngine<()> {
        let key = (book_id.to_string(), user_id.to_string());
        if book_members::Entity::find_by_id(key.clone())
            .one(db)
            .await?
            .is_some()
        {
            book_members::ActiveModel {
                book_id: ActiveValue::Set(key.0),
                user_id: ActiveValue::Set(key.1),
                role: ActiveValue::Set(role.as_str().to_string()),
                created_by: ActiveValue::NotSet,
            }
            .update(db)
            .await?;
        } else {
            book_members::ActiveModel {
                book_id: ActiveValue::Set(key.0),
                user_id: ActiveValue::Set(key.1),
                role: ActiveValue::Set(role.as_str().to_string()),
                created_by: ActiveValue::Set(Some(actor.id.to_string())),
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }

    /// Remove a user from one book (`book_id = Some`) or from the system.
    ///
    /// The book creator cannot be removed from their book, and a user who
    /// created any book cannot be deleted. System-wide deletion also removes
    /// the user's memberships, the entries they recorded and the categories
    /// they created; entries in those categories become uncategorised.
    pub async fn delete_user(
        &self,
        actor: &Actor,
        user_id: Uuid,
        book_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let target = self.require_user_model(&db_tx, user_id).await?;
            let ctx = match book_id {
                Some(book_id) => Some(self.book_context(&db_tx, actor, book_id).await?.1),
                None => None,
            };
            if !access::can_manage_user(actor, ctx.as_ref()) {
                return Err(deny(actor, "manage users"));
            }
            let created_books = self.has_created_books(&db_tx, user_id).await?;
            if !access::can_delete_user(actor, user_id, created_books, ctx.as_ref()) {
                let reason = if ctx.is_some() {
                    "cannot remove the book creator from the book"
                } else {
                    "cannot delete a user who created books"
                };
                warn!(actor = %actor.username, user = %target.username, reason, "user delete refused");
                return Err(EngineError::Conflict(reason.to_string()));
            }

            match ctx {
                Some(ctx) => self.remove_membership(&db_tx, actor, &ctx, &target).await?,
                None => self.purge_user(&db_tx, actor, &target).await?,
            }
            Ok(())
        })
    }

    async fn remove_membership(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        ctx: &BookContext,
        target: &users::Model,
    ) -> ResultEngine<()> {
        let result = book_members::Entity::delete_by_id((
            ctx.book_id.to_string(),
            target.id.clone(),
        ))
        .exec(db)
        .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(
                "membership not exists".to_string(),
            ));
        }
        info!(actor = %actor.username, book = %ctx.book_id, user = %target.username, "member removed");
        Ok(())
    }

    async fn purge_user(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        target: &users::Model,
    ) -> ResultEngine<()> {
        let user_id = target.id.clone();
        let null_id = || Expr::value(Option::<String>::None);

        let owned_categories: Vec<String> = categories::Entity::find()
            .filter(categories::Column::CreatedBy.eq(user_id.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        cash_entries::Entity::update_many()
            .col_expr(cash_entries::Column::CategoryId, null_id())
            .filter(cash_entries::Column::CategoryId.is_in(owned_categories.clone()))
            .exec(db)
            .await?;
        categories::Entity::delete_many()
            .filter(categories::Column::Id.is_in(owned_categories))
            .exec(db)
            .await?;
        let entries = cash_entries::Entity::delete_many()
            .filter(cash_entries::Column::UserId.eq(user_id.clone()))
            .exec(db)
            .await?;
        book_members::Entity::delete_many()
            .filter(book_members::Column::UserId.eq(user_id.clone()))
            .exec(db)
            .await?;
        book_members::Entity::update_many()
            .col_expr(book_members::Column::CreatedBy, null_id())
            .filter(book_members::Column::CreatedBy.eq(user_id.clone()))
            .exec(db)
            .await?;
        users::Entity::update_many()
            .col_expr(users::Column::CreatedBy, null_id())
            .filter(users::Column::CreatedBy.eq(user_id.clone()))
            .exec(db)
            .await?;
        users::Entity::delete_by_id(user_id).exec(db).await?;

        info!(
            actor = %actor.username,
            user = %target.username,
            entries_removed = entries.rows_affected,
            "user deleted"
        );
        Ok(())
    }

    /// Users the actor added to books, with the memberships the actor
    /// granted. Only system admins may list them.
    pub async fn list_managed_users(&self, actor: &Actor) -> ResultEngine<Vec<ManagedUser>> {
        if !actor.is_admin() {
            return Err(deny(actor, "only admins can manage their users"));
        }

        with_tx!(self, |db_tx| {
            let memberships = book_members::Entity::find()
                .filter(book_members::Column::CreatedBy.eq(actor.id.to_string()))
                .find_also_related(books::Entity)
                .order_by_asc(books::Column::Name)
                .all(&db_tx)
                .await?;

            let mut by_user: BTreeMap<String, Vec<ManagedMembership>> = BTreeMap::new();
            for (member, book) in memberships {
                let Some(book) = book else {
                    continue;
                };
                by_user
                    .entry(member.user_id)
                    .or_default()
                    .push(ManagedMembership {
                        book_id: parse_uuid(&book.id, "book")?,
                        book_name: book.name,
                        role: BookRole::try_from(member.role.as_str())?,
                    });
            }

            let models = users::Entity::find()
                .filter(users::Column::Id.is_in(by_user.keys().cloned()))
                .order_by_asc(users::Column::Username)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let memberships = by_user.remove(&model.id).unwrap_or_default();
                let user = User::try_from(model)?;
                out.push(ManagedUser {
                    can_manage: user.id != actor.id,
                    user,
                    memberships,
                });
            }
            Ok(out)
        })
    }

    /// Users that may be attached to a book: the book creator and members of
    /// any book the creator owns, minus the book's current members.
    pub async fn attach_candidates(&self, actor: &Actor, book_id: Uuid) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            let (book, _) = self
                .require_book(
                    &db_tx,
                    actor,
                    book_id,
                    access::can_manage_book_users,
                    "manage book users",
                )
                .await?;

            let candidates = self.candidate_ids(&db_tx, &book).await?;

            users::Entity::find()
                .filter(users::Column::Id.is_in(candidates))
                .order_by_asc(users::Column::Username)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(User::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Ids of the book creator and of every member of the creator's books,
    /// minus the book's current members.
    async fn candidate_ids(
        &self,
        db: &DatabaseTransaction,
        book: &books::Model,
    ) -> ResultEngine<HashSet<String>> {
        let creator_books: Vec<String> = books::Entity::find()
            .filter(books::Column::CreatedBy.eq(book.created_by.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();

        let mut candidates: HashSet<String> = book_members::Entity::find()
            .filter(book_members::Column::BookId.is_in(creator_books))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.user_id)
            .collect();
        candidates.insert(book.created_by.clone());

        let current = book_members::Entity::find()
            .filter(book_members::Column::BookId.eq(book.id.clone()))
            .all(db)
            .await?;
        for member in current {
            candidates.remove(&member.user_id);
        }
        Ok(candidates)
    }

    async fn ensure_username_free(
        &self,
        db: &DatabaseTransaction,
        username: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = users::Entity::find().filter(users::Column::Username.eq(username));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::Conflict(format!(
                "a user named '{username}' already exists"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> AddMemberForm {
        AddMemberForm {
            select_user: None,
            username: None,
            password: None,
            system_role: None,
            book_role: BookRole::Partner,
        }
    }

    #[test]
    fn add_member_form_requires_exactly_one_mode() {
        assert!(AddMember::try_from(form()).is_err());

        let both = AddMemberForm {
            select_user: Some(Uuid::new_v4()),
            username: Some("bob".to_string()),
            ..form()
        };
        assert!(AddMember::try_from(both).is_err());

        let existing = Uuid::new_v4();
        let select = AddMemberForm {
            select_user: Some(existing),
            ..form()
        };
        assert_eq!(
            AddMember::try_from(select).unwrap(),
            AddMember::Existing {
                user_id: existing,
                book_role: BookRole::Partner
            }
        );
    }

    #[test]
    fn new_member_needs_password_and_system_role() {
        let no_password = AddMemberForm {
            username: Some("bob".to_string()),
            system_role: Some(SystemRole::Partner),
            ..form()
        };
        assert!(AddMember::try_from(no_password).is_err());

        let no_role = AddMemberForm {
            username: Some("bob".to_string()),
            password: Some("pw".to_string()),
            ..form()
        };
        assert!(AddMember::try_from(no_role).is_err());

        let ok = AddMemberForm {
            username: Some(" bob ".to_string()),
            password: Some("pw".to_string()),
            system_role: Some(SystemRole::Manager),
            ..form()
        };
        assert!(matches!(
            AddMember::try_from(ok).unwrap(),
            AddMember::New { ref username, system_role: SystemRole::Manager, .. } if username == "bob"
        ));
    }

    #[test]
    fn usernames_are_trimmed_and_bounded() {
        assert_eq!(validate_username("  alice ").unwrap(), "alice");
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }
}
