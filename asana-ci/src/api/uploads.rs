//! Bulk asset upload API
//!
//! The console funnels both the file picker and drag-and-drop into `POST /uploads/intake`.
//! `POST /uploads/run` returns as soon as the batch is minted; progress arrives over
//! `/uploads/events`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db::batches::{self, BatchItemRecord, BatchRecord};
use crate::models::{CandidateFile, UploadItem};
use crate::services::{QueueSnapshot, RunStart};
use crate::{ApiError, ApiResult, AppState};

/// One file as sent by the console
#[derive(Debug, Deserialize)]
pub struct IntakeFile {
    pub file_name: String,
    pub mime_type: String,
    pub data_base64: String,
}

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    /// Items added to the queue
    pub queued: Vec<UploadItem>,
    /// Files the intake filter dropped (wrong type or too large)
    pub dropped: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct BatchDetail {
    #[serde(flatten)]
    pub batch: BatchRecord,
    pub items: Vec<BatchItemRecord>,
}

/// POST /uploads/intake
pub async fn intake(
    State(state): State<AppState>,
    Json(files): Json<Vec<IntakeFile>>,
) -> ApiResult<(StatusCode, Json<IntakeResponse>)> {
    let offered = files.len();
    let candidates = files
        .into_iter()
        .map(|file| -> ApiResult<CandidateFile> {
            let data = base64::engine::general_purpose::STANDARD
                .decode(file.data_base64.trim())
                .map_err(|e| {
                    ApiError::BadRequest(format!("{}: invalid base64 data: {}", file.file_name, e))
                })?;
            Ok(CandidateFile {
                file_name: file.file_name,
                mime_type: file.mime_type,
                data,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let queued = state.orchestrator.intake(candidates).await;
    let dropped = offered - queued.len();

    Ok((StatusCode::CREATED, Json(IntakeResponse { queued, dropped })))
}

/// GET /uploads
pub async fn list_items(State(state): State<AppState>) -> Json<QueueSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

/// DELETE /uploads/items/:id
pub async fn remove_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> ApiResult<Json<UploadItem>> {
    Ok(Json(state.orchestrator.remove(&item_id).await?))
}

/// POST /uploads/clear-finished
pub async fn clear_finished(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse {
        removed: state.orchestrator.clear_finished().await,
    })
}

/// POST /uploads/clear
pub async fn clear(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse {
        removed: state.orchestrator.clear().await,
    })
}

/// POST /uploads/run
///
/// Mints the batch id and drives the run in the background.
pub async fn start_run(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<RunStart>)> {
    let start = state
        .orchestrator
        .start_run()
        .await?
        .ok_or_else(|| ApiError::BadRequest("No queued items to upload".to_string()))?;

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        if let Some(summary) = orchestrator.drive(start).await {
            if summary.failed > 0 {
                state
                    .record_error(format!(
                        "Upload batch {}: {} of {} items failed",
                        summary.batch_id, summary.failed, summary.total
                    ))
                    .await;
            }
        }
    });

    Ok((StatusCode::ACCEPTED, Json(start)))
}

/// GET /uploads/batches
pub async fn list_batches(State(state): State<AppState>) -> ApiResult<Json<Vec<BatchRecord>>> {
    Ok(Json(batches::list_batches(&state.db).await?))
}

/// GET /uploads/batches/:id
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> ApiResult<Json<BatchDetail>> {
    let batch = batches::load_batch(&state.db, batch_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Upload batch {}", batch_id)))?;
    let items = batches::load_batch_items(&state.db, batch_id).await?;

    Ok(Json(BatchDetail { batch, items }))
}

/// DELETE /uploads/batches/:id
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.orchestrator.active_batch().await == Some(batch_id) {
        return Err(ApiError::Conflict(format!(
            "Upload batch {} is still running",
            batch_id
        )));
    }

    if !batches::delete_batch(&state.db, batch_id).await? {
        return Err(ApiError::NotFound(format!("Upload batch {}", batch_id)));
    }

    info!(batch_id = %batch_id, "Upload batch history deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/uploads", get(list_items))
        .route("/uploads/intake", post(intake))
        .route("/uploads/items/:id", delete(remove_item))
        .route("/uploads/clear-finished", post(clear_finished))
        .route("/uploads/clear", post(clear))
        .route("/uploads/run", post(start_run))
        .route("/uploads/batches", get(list_batches))
        .route("/uploads/batches/:id", get(get_batch).delete(delete_batch))
}
