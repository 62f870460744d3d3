//! Entry endpoints.

use api_types::entry::{EntryListResponse, EntryNew, EntryQuery, EntryUpdate, EntryView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Actor, DateRange, EntryChanges, EntryFilter, MoneyCents, NewEntry};
use uuid::Uuid;

use crate::{
    ServerError,
    mapping::{engine_kind, map_entry, map_totals},
    server::ServerState,
};

fn filter_from_query(query: EntryQuery) -> Result<EntryFilter, ServerError> {
    let range = query
        .date_range
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(|name| DateRange::from_name(name, query.start_date, query.end_date))
        .transpose()?;
    Ok(EntryFilter {
        date: query.date,
        range,
        category_id: query.category,
        kind: query.kind.map(engine_kind),
        search: query.search,
        page: query.page,
    })
}

/// Paginated, filtered entry list with totals over the whole filtered set.
pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let filter = filter_from_query(query)?;
    let page = state.engine.query_entries(&actor, book_id, &filter).await?;

    let entries = page
        .entries
        .into_iter()
        .map(|row| map_entry(row.entry, row.category_name, Some(row.running_balance)))
        .collect();
    Ok(Json(EntryListResponse {
        entries,
        totals: map_totals(page.totals),
        total_count: page.total_count,
        page: page.page,
        total_pages: page.total_pages,
        date_filter_error: page.date_filter_error,
    }))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<EntryNew>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let input = NewEntry {
        date: payload.date,
        time: payload.time,
        kind: engine_kind(payload.kind),
        amount: payload.amount.parse::<MoneyCents>()?,
        category_id: payload.category_id,
        remarks: payload.remarks,
        image: payload.image,
        extra: payload.extra,
    };
    let entry = state.engine.add_entry(&actor, book_id, input).await?;
    Ok((StatusCode::CREATED, Json(map_entry(entry, None, None))))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path((book_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EntryView>, ServerError> {
    let entry = state.engine.get_entry(&actor, book_id, entry_id).await?;
    Ok(Json(map_entry(entry, None, None)))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path((book_id, entry_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EntryUpdate>,
) -> Result<Json<EntryView>, ServerError> {
    let category_id = match (payload.category_id, payload.clear_category) {
        (Some(id), _) => Some(Some(id)),
        (None, true) => Some(None),
        (None, false) => None,
    };
    let changes = EntryChanges {
        date: payload.date,
        time: payload.time,
        kind: payload.kind.map(engine_kind),
        amount: payload
            .amount
            .as_deref()
            .map(str::parse::<MoneyCents>)
            .transpose()?,
        category_id,
        remarks: payload.remarks,
        image: payload.image.map(Some),
        extra: payload.extra.map(Some),
    };
    if changes.date.is_none()
        && changes.time.is_none()
        && changes.kind.is_none()
        && changes.amount.is_none()
        && changes.category_id.is_none()
        && changes.remarks.is_none()
        && changes.image.is_none()
        && changes.extra.is_none()
    {
        return Err(ServerError::Generic(
            "provide at least one field to update".to_string(),
        ));
    }

    let entry = state
        .engine
        .update_entry(&actor, book_id, entry_id, changes)
        .await?;
    Ok(Json(map_entry(entry, None, None)))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path((book_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_entry(&actor, book_id, entry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
