//! Report download.

use api_types::report::ReportQuery;
use axum::{
    Extension,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use engine::Actor;
use uuid::Uuid;

use crate::{ServerError, mapping::attachment, server::ServerState};

/// Render the book (or one of its categories) as a PDF, XLSX or CSV file.
pub async fn download(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let report = state
        .engine
        .download_report(
            &actor,
            book_id,
            query.report_type.as_deref(),
            query.report_scope.as_deref(),
            query.category,
        )
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, report.content_type.to_string()),
            (header::CONTENT_DISPOSITION, attachment(&report.file_name)),
        ],
        report.bytes,
    ))
}
