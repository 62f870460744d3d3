//! Registration and user administration endpoints.

use api_types::user::{
    ManagedMembershipView, ManagedUserView, ManagedUsersResponse, Register, UserEdit, UserEdited,
    UserView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Actor, EditTarget, EngineError};
use uuid::Uuid;

use crate::{
    ServerError,
    mapping::{book_role, engine_book_role, engine_system_role, map_actor, map_user},
    server::ServerState,
};

/// Self-service sign up. The new account administers the books it creates.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    if !state.allow_registration {
        return Err(EngineError::Forbidden("registration is disabled".to_string()).into());
    }
    let user = state
        .engine
        .register(&payload.username, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(map_user(user))))
}

pub async fn me(Extension(actor): Extension<Actor>) -> Json<UserView> {
    Json(map_actor(&actor))
}

async fn apply_edit(
    state: &ServerState,
    actor: &Actor,
    target: EditTarget,
    payload: UserEdit,
) -> Result<Json<UserEdited>, ServerError> {
    let edit = engine::UserEdit {
        username: payload.username,
        system_role: engine_system_role(payload.system_role),
        book_role: payload.book_role.map(engine_book_role),
    };
    let outcome = state.engine.edit_user(actor, target, edit).await?;
    Ok(Json(UserEdited {
        user: map_user(outcome.user),
        book_role: outcome.book_role.map(book_role),
        refresh_session: outcome.refresh_session,
    }))
}

/// Edit a user and their role in the book.
pub async fn edit_member(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path((book_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UserEdit>,
) -> Result<Json<UserEdited>, ServerError> {
    apply_edit(
        &state,
        &actor,
        EditTarget::Membership { book_id, user_id },
        payload,
    )
    .await
}

pub async fn edit(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserEdit>,
) -> Result<Json<UserEdited>, ServerError> {
    apply_edit(&state, &actor, EditTarget::User { user_id }, payload).await
}

/// Remove a user from one book only.
pub async fn remove_member(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path((book_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_user(&actor, user_id, Some(book_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_user(&actor, user_id, None).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn managed(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<ManagedUsersResponse>, ServerError> {
    let users = state
        .engine
        .list_managed_users(&actor)
        .await?
        .into_iter()
        .map(|managed| ManagedUserView {
            user: map_user(managed.user),
            memberships: managed
                .memberships
                .into_iter()
                .map(|m| ManagedMembershipView {
                    book_id: m.book_id,
                    book_name: m.book_name,
                    role: book_role(m.role),
                })
                .collect(),
            can_manage: managed.can_manage,
        })
        .collect();
    Ok(Json(ManagedUsersResponse { users }))
}
