//! Book and membership endpoints.

use api_types::{
    book::{BookListResponse, BookNew, BookOverview, BookSummary, BookView},
    member::{MemberAdd, MemberView, MembersResponse},
    user::UserListResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Actor, AddMemberForm};
use uuid::Uuid;

use crate::{
    ServerError,
    mapping::{
        book_role, engine_book_role, engine_system_role, map_book, map_member, map_user,
    },
    server::ServerState,
};

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<BookListResponse>, ServerError> {
    let books = state
        .engine
        .list_books(&actor)
        .await?
        .into_iter()
        .map(|summary| BookSummary {
            book: map_book(summary.book),
            member_role: summary.member_role.map(book_role),
            net_balance: summary.net_balance.to_string(),
        })
        .collect();
    Ok(Json(BookListResponse { books }))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<BookNew>,
) -> Result<(StatusCode, Json<BookView>), ServerError> {
    let book = state.engine.create_book(&actor, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(map_book(book))))
}

pub async fn overview(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookOverview>, ServerError> {
    let overview = state.engine.book_overview(&actor, book_id).await?;
    Ok(Json(BookOverview {
        book: map_book(overview.book),
        member_role: overview.member_role.map(book_role),
        is_creator: overview.is_creator,
        can_modify_entries: overview.can_modify_entries,
        can_generate_report: overview.can_generate_report,
        can_manage_users: overview.can_manage_users,
    }))
}

pub async fn members(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state
        .engine
        .list_members(&actor, book_id)
        .await?
        .into_iter()
        .map(map_member)
        .collect();
    Ok(Json(MembersResponse { members }))
}

/// Attach an existing user to the book or create a new one.
pub async fn add_member(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<MemberAdd>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let form = AddMemberForm {
        select_user: payload.select_user,
        username: payload.username,
        password: payload.password,
        system_role: payload.system_role.map(engine_system_role),
        book_role: engine_book_role(payload.book_role),
    };
    let member = state.engine.add_book_member(&actor, book_id, form).await?;
    Ok((StatusCode::CREATED, Json(map_member(member))))
}

pub async fn candidates(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<UserListResponse>, ServerError> {
    let users = state
        .engine
        .attach_candidates(&actor, book_id)
        .await?
        .into_iter()
        .map(map_user)
        .collect();
    Ok(Json(UserListResponse { users }))
}
