//! CSV import API
//!
//! Every POST takes the raw file text as the request body. Preview and commit both run
//! the full pipeline, so the commit never trusts a preview the client may have edited.

use asana_common::events::ImportEvent;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::commits::{self, CommitRecord};
use crate::import::{self, template::TEMPLATE_FILE_NAME, ImportPreview};
use crate::models::{CommitOutcome, CommitRequest};
use crate::{ApiError, ApiResult, AppState};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const DEFAULT_HISTORY_LIMIT: u32 = 50;

fn csv_attachment(file_name: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
}

/// GET /import/template
pub async fn download_template() -> impl IntoResponse {
    csv_attachment(TEMPLATE_FILE_NAME, import::template_csv())
}

/// POST /import/preview
pub async fn preview_csv(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<ImportPreview>> {
    let preview = import::preview(&body)?;

    state.event_bus.emit_lossy(ImportEvent::CsvPreviewed {
        total_rows: preview.summary.total_rows,
        valid_rows: preview.summary.valid_rows,
        invalid_rows: preview.summary.invalid_rows,
        timestamp: Utc::now(),
    });

    Ok(Json(preview))
}

/// POST /import/commit
///
/// Submits the valid rows in one collaborator call. Invalid rows are counted as skipped
/// and never sent.
pub async fn commit_csv(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<CommitOutcome>> {
    let preview = import::preview(&body)?;
    let request = CommitRequest::from_validated(&preview.rows);
    if request.rows.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "No valid rows to commit ({} invalid)",
            preview.summary.invalid_rows
        )));
    }

    let response = match state.collaborator.commit_rows(&request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, rows = request.rows.len(), "CSV commit failed");
            state.record_error(format!("CSV commit failed: {}", e)).await;
            return Err(e.into());
        }
    };

    let outcome = CommitOutcome {
        commit_id: Uuid::new_v4(),
        rows_submitted: request.rows.len(),
        rows_skipped: preview.summary.invalid_rows,
        response,
    };

    info!(
        commit_id = %outcome.commit_id,
        submitted = outcome.rows_submitted,
        created = outcome.response.created,
        updated = outcome.response.updated,
        failed = outcome.response.failed,
        "CSV commit completed"
    );

    if let Err(e) = commits::save_commit(&state.db, &outcome).await {
        warn!(commit_id = %outcome.commit_id, error = %e, "Failed to persist commit record");
    }

    state.event_bus.emit_lossy(ImportEvent::CsvCommitted {
        commit_id: outcome.commit_id,
        rows_submitted: outcome.rows_submitted,
        created: outcome.response.created,
        updated: outcome.response.updated,
        failed: outcome.response.failed,
        timestamp: Utc::now(),
    });

    Ok(Json(outcome))
}

/// POST /import/error-report
pub async fn error_report(body: String) -> ApiResult<impl IntoResponse> {
    let preview = import::preview(&body)?;
    Ok(csv_attachment(
        "pose-import-errors.csv",
        import::error_report_csv(&preview.rows),
    ))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// GET /import/commits
pub async fn list_commits(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<CommitRecord>>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(commits::list_commits(&state.db, limit).await?))
}

pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/import/template", get(download_template))
        .route("/import/preview", post(preview_csv))
        .route("/import/commit", post(commit_csv))
        .route("/import/error-report", post(error_report))
        .route("/import/commits", get(list_commits))
}
