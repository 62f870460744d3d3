//! Categories API endpoints.

use api_types::category::{CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::Actor;
use uuid::Uuid;

use crate::{ServerError, mapping::map_category, server::ServerState};

pub async fn list_for_book(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .list_book_categories(&actor, book_id)
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

/// Categories across every book the caller can see.
pub async fn list_all(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(&actor)
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(&actor, book_id, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn rename(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .rename_category(&actor, category_id, &payload.name)
        .await?;
    Ok(Json(map_category(category)))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(&actor, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
